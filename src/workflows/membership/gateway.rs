use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::info;

use super::domain::{ApplicantId, ChannelId, Member, MemberListing, RoleId};
use super::review::ReviewArtifact;

/// Error enumeration for directory failures.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Error enumeration for notification delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Narrow query/command surface the workflow consumes from the membership
/// directory. Role membership and presence truth live behind this seam; the
/// workflow never caches either across requests.
#[async_trait]
pub trait DirectoryGateway: Send + Sync {
    async fn resolve_member(&self, id: &ApplicantId) -> Result<Option<Member>, GatewayError>;
    async fn has_role(&self, member: &Member, role: &RoleId) -> Result<bool, GatewayError>;
    async fn add_role(&self, member: &Member, role: &RoleId) -> Result<(), GatewayError>;
    async fn remove_role(&self, member: &Member, role: &RoleId) -> Result<(), GatewayError>;
    async fn post_review(
        &self,
        channel: &ChannelId,
        artifact: &ReviewArtifact,
    ) -> Result<(), GatewayError>;
    async fn list_members(&self) -> Result<Vec<MemberListing>, GatewayError>;
}

/// Best-effort direct message delivery. Callers treat failures as
/// log-and-continue; a lost notification never fails the workflow.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn send_direct_message(
        &self,
        member: &Member,
        text: &str,
    ) -> Result<(), NotificationError>;
}

#[derive(Default)]
struct DirectoryState {
    members: BTreeMap<ApplicantId, MemberRecord>,
    reviews: Vec<(ChannelId, ReviewArtifact)>,
}

struct MemberRecord {
    username: String,
    roles: BTreeSet<RoleId>,
}

/// Self-contained directory backing the demo runner, tests, and deployments
/// without a platform adapter wired in. Clones share state so callers can
/// keep a handle and inspect role mutations and posted reviews.
#[derive(Default, Clone)]
pub struct StaticDirectory {
    inner: Arc<Mutex<DirectoryState>>,
}

impl StaticDirectory {
    /// Seed a member with an initial role set.
    pub fn with_member(self, id: &str, username: &str, roles: &[RoleId]) -> Self {
        {
            let mut inner = self.inner.lock().expect("directory mutex poisoned");
            inner.members.insert(
                ApplicantId(id.to_string()),
                MemberRecord {
                    username: username.to_string(),
                    roles: roles.iter().cloned().collect(),
                },
            );
        }
        self
    }

    /// Whether the member currently holds the role.
    pub fn holds_role(&self, id: &ApplicantId, role: &RoleId) -> bool {
        self.inner
            .lock()
            .expect("directory mutex poisoned")
            .members
            .get(id)
            .map_or(false, |record| record.roles.contains(role))
    }

    /// Review artifacts recorded so far, oldest first.
    pub fn posted_reviews(&self) -> Vec<(ChannelId, ReviewArtifact)> {
        self.inner
            .lock()
            .expect("directory mutex poisoned")
            .reviews
            .clone()
    }
}

#[async_trait]
impl DirectoryGateway for StaticDirectory {
    async fn resolve_member(&self, id: &ApplicantId) -> Result<Option<Member>, GatewayError> {
        let inner = self.inner.lock().expect("directory mutex poisoned");
        Ok(inner.members.get(id).map(|record| Member {
            id: id.clone(),
            username: record.username.clone(),
        }))
    }

    async fn has_role(&self, member: &Member, role: &RoleId) -> Result<bool, GatewayError> {
        Ok(self.holds_role(&member.id, role))
    }

    async fn add_role(&self, member: &Member, role: &RoleId) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().expect("directory mutex poisoned");
        let record = inner.members.get_mut(&member.id).ok_or_else(|| {
            GatewayError::Unavailable(format!("member {} left the directory", member.id.0))
        })?;
        record.roles.insert(role.clone());
        Ok(())
    }

    async fn remove_role(&self, member: &Member, role: &RoleId) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().expect("directory mutex poisoned");
        let record = inner.members.get_mut(&member.id).ok_or_else(|| {
            GatewayError::Unavailable(format!("member {} left the directory", member.id.0))
        })?;
        record.roles.remove(role);
        Ok(())
    }

    async fn post_review(
        &self,
        channel: &ChannelId,
        artifact: &ReviewArtifact,
    ) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().expect("directory mutex poisoned");
        inner.reviews.push((channel.clone(), artifact.clone()));
        info!(
            channel = %channel.0,
            applicant = %artifact.applicant_id.0,
            pages = artifact.pages.len(),
            "review request recorded"
        );
        Ok(())
    }

    async fn list_members(&self) -> Result<Vec<MemberListing>, GatewayError> {
        let inner = self.inner.lock().expect("directory mutex poisoned");
        Ok(inner
            .members
            .iter()
            .map(|(id, record)| MemberListing {
                id: id.clone(),
                username: record.username.clone(),
                roles: record.roles.iter().cloned().collect(),
            })
            .collect())
    }
}

/// Notifier that writes deliveries to the log instead of a chat transport.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl NotificationGateway for LogNotifier {
    async fn send_direct_message(
        &self,
        member: &Member,
        text: &str,
    ) -> Result<(), NotificationError> {
        info!(member = %member.id.0, text, "direct message delivered");
        Ok(())
    }
}
