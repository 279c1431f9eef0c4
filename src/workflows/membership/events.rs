use super::domain::{DecisionEvent, DecisionOutcome};
use super::review::{parse_applicant_reference, parse_control_id};

/// Emoji pair the reaction adapter recognizes as decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionPolicy {
    pub accept: String,
    pub reject: String,
}

impl Default for ReactionPolicy {
    fn default() -> Self {
        Self {
            accept: "✅".to_string(),
            reject: "❌".to_string(),
        }
    }
}

/// Callback raised when a reviewer clicks an accept or reject control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlInteraction {
    pub control_id: String,
    pub reviewer_id: String,
}

impl ControlInteraction {
    /// Decode the decision the control carries.
    ///
    /// `None` means the control id does not belong to this workflow. An
    /// unknown outcome token is passed through so the resolver reports it as
    /// `InvalidOutcome` instead of the click vanishing silently.
    pub fn decision_event(&self) -> Option<DecisionEvent> {
        let (outcome, applicant_id) = parse_control_id(&self.control_id)?;
        Some(DecisionEvent {
            applicant_id,
            outcome,
            reviewer_id: self.reviewer_id.clone(),
        })
    }
}

/// Emoji reaction observed on a previously posted review artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionEvent {
    pub emoji: String,
    pub message_summary: String,
    pub reviewer_id: String,
}

impl ReactionEvent {
    /// Correlate the reaction back to a decision event.
    ///
    /// Unrelated emoji and messages without a recoverable applicant
    /// reference produce no event.
    pub fn decision_event(&self, policy: &ReactionPolicy) -> Option<DecisionEvent> {
        let outcome = if self.emoji == policy.accept {
            DecisionOutcome::Accept
        } else if self.emoji == policy.reject {
            DecisionOutcome::Reject
        } else {
            return None;
        };

        let applicant_id = parse_applicant_reference(&self.message_summary)?;
        Some(DecisionEvent {
            applicant_id,
            outcome: outcome.as_str().to_string(),
            reviewer_id: self.reviewer_id.clone(),
        })
    }
}
