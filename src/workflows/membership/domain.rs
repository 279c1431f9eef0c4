use serde::{Deserialize, Serialize};

/// Identifier wrapper for applicants and directory members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicantId(pub String);

/// Identifier wrapper for directory roles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(pub String);

/// Identifier wrapper for directory channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelId(pub String);

/// Directory member resolved at the moment of a check or decision.
///
/// Role state is deliberately absent: the workflow always queries the
/// directory live instead of trusting a cached snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: ApplicantId,
    pub username: String,
}

/// Point-in-time roster entry served by the member listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberListing {
    pub id: ApplicantId,
    pub username: String,
    pub roles: Vec<RoleId>,
}

/// Inbound membership application before pagination.
///
/// The form keeps the submitter's field order; the paginator relies on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipApplication {
    pub applicant_id: ApplicantId,
    pub username: String,
    pub form: Vec<(String, String)>,
}

/// Answer produced by a whitelist check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipStatus {
    Whitelisted,
    NonWhitelisted,
    NotOnServer,
}

impl MembershipStatus {
    pub const fn label(self) -> &'static str {
        match self {
            MembershipStatus::Whitelisted => "whitelisted",
            MembershipStatus::NonWhitelisted => "non-whitelisted",
            MembershipStatus::NotOnServer => "not-on-server",
        }
    }
}

/// Validated outcomes the decision resolver can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionOutcome {
    Accept,
    Reject,
}

impl DecisionOutcome {
    /// Parse a raw outcome token; anything but the two known values is refused.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "accept" => Some(DecisionOutcome::Accept),
            "reject" => Some(DecisionOutcome::Reject),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            DecisionOutcome::Accept => "accept",
            DecisionOutcome::Reject => "reject",
        }
    }
}

/// Role standing derived live from the directory when a decision arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleStanding {
    Undecided,
    Whitelisted,
    Rejected,
}

impl RoleStanding {
    pub const fn label(self) -> &'static str {
        match self {
            RoleStanding::Undecided => "undecided",
            RoleStanding::Whitelisted => "whitelisted",
            RoleStanding::Rejected => "rejected",
        }
    }
}

/// Ephemeral decision signal tied to one applicant.
///
/// The outcome stays a raw string until the resolver validates it, so
/// malformed control payloads surface as `InvalidOutcome` rather than being
/// silently dropped at the adapter boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionEvent {
    pub applicant_id: ApplicantId,
    pub outcome: String,
    pub reviewer_id: String,
}
