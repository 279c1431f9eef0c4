use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{DecisionEvent, DecisionOutcome, Member, RoleId, RoleStanding};
use super::gateway::{DirectoryGateway, GatewayError, NotificationGateway};

const ACCEPTED_NOTICE: &str = "Your membership application has been accepted. Welcome aboard!";
const REJECTED_NOTICE: &str = "Your membership application has been rejected.";

/// Terminal reports for the event-triggered decision path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The decision was applied and the applicant notified (best effort).
    Applied { outcome: DecisionOutcome },
    /// The applicant was already decided; nothing was mutated or notified.
    AlreadyResolved { standing: RoleStanding },
}

/// Error enumeration for decision failures.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    #[error("unknown decision outcome '{0}'")]
    InvalidOutcome(String),
    #[error("applicant is no longer present in the directory")]
    RecipientGone,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// State machine applying accept/reject decisions against live directory
/// state.
///
/// Role standing is read from the directory on every event; the resolver
/// keeps no decision state of its own, which is what makes repeated or
/// concurrent events safe to feed in.
pub struct DecisionResolver<D, N> {
    directory: Arc<D>,
    notifier: Arc<N>,
    whitelist_role: RoleId,
    rejected_role: RoleId,
}

impl<D, N> DecisionResolver<D, N>
where
    D: DirectoryGateway + 'static,
    N: NotificationGateway + 'static,
{
    pub fn new(
        directory: Arc<D>,
        notifier: Arc<N>,
        whitelist_role: RoleId,
        rejected_role: RoleId,
    ) -> Self {
        Self {
            directory,
            notifier,
            whitelist_role,
            rejected_role,
        }
    }

    /// Resolve an event-triggered decision.
    ///
    /// An applicant already holding a decision marker is reported as
    /// `AlreadyResolved` with no mutation and no notification: only the
    /// standing observed before this resolver's own mutation decides whether
    /// to notify, so exactly one of two racing events notifies.
    pub async fn resolve(&self, event: &DecisionEvent) -> Result<Resolution, DecisionError> {
        let outcome = validated_outcome(event)?;
        let member = self.resolve_recipient(event).await?;
        let standing = self.standing_of(&member).await?;

        if standing != RoleStanding::Undecided {
            info!(
                applicant = %member.id.0,
                standing = standing.label(),
                "decision ignored, applicant already resolved"
            );
            return Ok(Resolution::AlreadyResolved { standing });
        }

        self.apply(&member, outcome, standing).await?;
        info!(
            applicant = %member.id.0,
            reviewer = %event.reviewer_id,
            outcome = outcome.as_str(),
            "decision applied"
        );
        self.notify(&member, outcome).await;
        Ok(Resolution::Applied { outcome })
    }

    /// Apply an administrative decision, superseding any earlier one.
    ///
    /// The idempotency guard is deliberately skipped: an operator may flip a
    /// `Whitelisted` applicant to `Rejected` and back. The markers stay
    /// mutually exclusive because the opposing one is removed first.
    pub async fn resolve_overriding(
        &self,
        event: &DecisionEvent,
    ) -> Result<DecisionOutcome, DecisionError> {
        let outcome = validated_outcome(event)?;
        let member = self.resolve_recipient(event).await?;
        let standing = self.standing_of(&member).await?;

        self.apply(&member, outcome, standing).await?;
        info!(
            applicant = %member.id.0,
            reviewer = %event.reviewer_id,
            outcome = outcome.as_str(),
            prior = standing.label(),
            "administrative decision applied"
        );
        self.notify(&member, outcome).await;
        Ok(outcome)
    }

    async fn resolve_recipient(&self, event: &DecisionEvent) -> Result<Member, DecisionError> {
        self.directory
            .resolve_member(&event.applicant_id)
            .await?
            .ok_or(DecisionError::RecipientGone)
    }

    async fn standing_of(&self, member: &Member) -> Result<RoleStanding, DecisionError> {
        if self.directory.has_role(member, &self.whitelist_role).await? {
            return Ok(RoleStanding::Whitelisted);
        }
        if self.directory.has_role(member, &self.rejected_role).await? {
            return Ok(RoleStanding::Rejected);
        }
        Ok(RoleStanding::Undecided)
    }

    async fn apply(
        &self,
        member: &Member,
        outcome: DecisionOutcome,
        standing: RoleStanding,
    ) -> Result<(), GatewayError> {
        match outcome {
            DecisionOutcome::Accept => {
                if standing == RoleStanding::Rejected {
                    self.directory
                        .remove_role(member, &self.rejected_role)
                        .await?;
                }
                self.directory.add_role(member, &self.whitelist_role).await
            }
            DecisionOutcome::Reject => {
                if standing == RoleStanding::Whitelisted {
                    self.directory
                        .remove_role(member, &self.whitelist_role)
                        .await?;
                }
                self.directory.add_role(member, &self.rejected_role).await
            }
        }
    }

    async fn notify(&self, member: &Member, outcome: DecisionOutcome) {
        let text = match outcome {
            DecisionOutcome::Accept => ACCEPTED_NOTICE,
            DecisionOutcome::Reject => REJECTED_NOTICE,
        };

        if let Err(err) = self.notifier.send_direct_message(member, text).await {
            warn!(applicant = %member.id.0, error = %err, "notification delivery failed");
        }
    }
}

fn validated_outcome(event: &DecisionEvent) -> Result<DecisionOutcome, DecisionError> {
    DecisionOutcome::parse(&event.outcome)
        .ok_or_else(|| DecisionError::InvalidOutcome(event.outcome.clone()))
}
