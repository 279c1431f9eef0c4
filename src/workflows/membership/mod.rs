//! Membership whitelist workflow: quota-limited application intake, paginated
//! human review, and idempotent accept/reject decision handling.
//!
//! The workflow owns exactly one piece of persistent state, the submission
//! ledger. Role membership and presence truth stay behind the directory
//! gateway and are queried live on every check and decision.

pub mod domain;
pub mod events;
pub mod gateway;
pub mod ledger;
pub mod paginate;
pub mod resolver;
pub mod review;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicantId, ChannelId, DecisionEvent, DecisionOutcome, Member, MemberListing,
    MembershipApplication, MembershipStatus, RoleId, RoleStanding,
};
pub use events::{ControlInteraction, ReactionEvent, ReactionPolicy};
pub use gateway::{
    DirectoryGateway, GatewayError, LogNotifier, NotificationError, NotificationGateway,
    StaticDirectory,
};
pub use ledger::{FileLedgerStore, LedgerError, LedgerStore, MemoryLedgerStore, SubmissionLedger};
pub use paginate::{paginate, FormField, PageLimits, EMPTY_VALUE_PLACEHOLDER};
pub use resolver::{DecisionError, DecisionResolver, Resolution};
pub use review::{
    build_review_request, parse_applicant_reference, parse_control_id, ReviewArtifact,
    ReviewControl, ReviewPage,
};
pub use router::{membership_router, SHARED_SECRET_HEADER};
pub use service::{
    MembershipError, MembershipService, MembershipSettings, DEFAULT_SUBMISSION_QUOTA,
};
