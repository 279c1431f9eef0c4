use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{
    ApplicantId, ChannelId, DecisionEvent, DecisionOutcome, MemberListing, MembershipApplication,
    MembershipStatus, RoleId,
};
use super::events::ReactionPolicy;
use super::gateway::{DirectoryGateway, GatewayError, NotificationGateway};
use super::ledger::{LedgerError, LedgerStore, SubmissionLedger};
use super::paginate::{paginate, PageLimits};
use super::resolver::{DecisionError, DecisionResolver, Resolution};
use super::review::build_review_request;

/// Default number of submissions each applicant may file.
pub const DEFAULT_SUBMISSION_QUOTA: usize = 3;

/// Tunables binding the workflow to one concrete directory deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipSettings {
    pub whitelist_role: RoleId,
    pub rejected_role: RoleId,
    pub review_channel: ChannelId,
    pub submission_quota: usize,
    pub page_limits: PageLimits,
    pub reactions: ReactionPolicy,
}

impl Default for MembershipSettings {
    fn default() -> Self {
        Self {
            whitelist_role: RoleId("role-whitelisted".to_string()),
            rejected_role: RoleId("role-rejected".to_string()),
            review_channel: ChannelId("membership-review".to_string()),
            submission_quota: DEFAULT_SUBMISSION_QUOTA,
            page_limits: PageLimits::default(),
            reactions: ReactionPolicy::default(),
        }
    }
}

/// Error raised by the membership service.
#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    #[error("applicant is not a member of the directory")]
    NotOnDirectory,
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Decision(#[from] DecisionError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Service composing the submission ledger, paginator, review builder, and
/// decision resolver behind one facade.
pub struct MembershipService<D, N, S> {
    directory: Arc<D>,
    ledger: SubmissionLedger<S>,
    resolver: DecisionResolver<D, N>,
    settings: MembershipSettings,
}

impl<D, N, S> MembershipService<D, N, S>
where
    D: DirectoryGateway + 'static,
    N: NotificationGateway + 'static,
    S: LedgerStore + 'static,
{
    /// Load the ledger from the store and wire the workflow together.
    pub fn open(
        directory: Arc<D>,
        notifier: Arc<N>,
        store: S,
        settings: MembershipSettings,
    ) -> Result<Self, MembershipError> {
        let ledger = SubmissionLedger::open(store, settings.submission_quota)?;
        let resolver = DecisionResolver::new(
            directory.clone(),
            notifier,
            settings.whitelist_role.clone(),
            settings.rejected_role.clone(),
        );

        Ok(Self {
            directory,
            ledger,
            resolver,
            settings,
        })
    }

    /// Answer whether the applicant currently holds the whitelist role.
    ///
    /// Only the whitelist marker is consulted; a rejected applicant reads as
    /// `NonWhitelisted`, an unresolvable one as `NotOnServer`.
    pub async fn check_status(
        &self,
        applicant: &ApplicantId,
    ) -> Result<MembershipStatus, MembershipError> {
        let Some(member) = self.directory.resolve_member(applicant).await? else {
            return Ok(MembershipStatus::NotOnServer);
        };

        if self
            .directory
            .has_role(&member, &self.settings.whitelist_role)
            .await?
        {
            Ok(MembershipStatus::Whitelisted)
        } else {
            Ok(MembershipStatus::NonWhitelisted)
        }
    }

    /// Consume a quota slot and post the paginated review request.
    ///
    /// The slot is consumed before the post; a failed post does not refund
    /// it. Returns the applicant's new submission count.
    pub async fn submit_application(
        &self,
        application: MembershipApplication,
    ) -> Result<usize, MembershipError> {
        if self
            .directory
            .resolve_member(&application.applicant_id)
            .await?
            .is_none()
        {
            return Err(MembershipError::NotOnDirectory);
        }

        let now_ms = Utc::now().timestamp_millis();
        let count = self
            .ledger
            .record_if_allowed(&application.applicant_id, now_ms)?;

        let pages = paginate(application.form, &self.settings.page_limits);
        let artifact = build_review_request(
            application.applicant_id.clone(),
            &application.username,
            pages,
        );

        self.directory
            .post_review(&self.settings.review_channel, &artifact)
            .await?;
        info!(
            applicant = %application.applicant_id.0,
            submission = count,
            "review request posted"
        );
        Ok(count)
    }

    /// Resolve an event-triggered decision through the guarded path.
    pub async fn resolve_decision(
        &self,
        event: &DecisionEvent,
    ) -> Result<Resolution, MembershipError> {
        Ok(self.resolver.resolve(event).await?)
    }

    /// Apply an administrative decision, superseding any earlier one.
    pub async fn admin_decide(
        &self,
        event: &DecisionEvent,
    ) -> Result<DecisionOutcome, MembershipError> {
        Ok(self.resolver.resolve_overriding(event).await?)
    }

    /// Point-in-time roster of directory members and their roles.
    pub async fn member_roster(&self) -> Result<Vec<MemberListing>, MembershipError> {
        Ok(self.directory.list_members().await?)
    }

    /// Submissions recorded for the applicant so far.
    pub fn submission_count(&self, applicant: &ApplicantId) -> usize {
        self.ledger.count(applicant)
    }

    pub fn settings(&self) -> &MembershipSettings {
        &self.settings
    }
}
