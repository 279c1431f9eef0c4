use serde::Serialize;

use super::domain::{ApplicantId, DecisionOutcome};
use super::paginate::FormField;

const CONTROL_ID_PREFIX: &str = "gate";
const SUMMARY_REFERENCE_MARKER: &str = "applicant:";

/// One bounded page of form entries with its position marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewPage {
    /// 1-based position of this page.
    pub number: usize,
    pub total: usize,
    pub fields: Vec<FormField>,
}

/// Accept or reject control attached to a review artifact.
///
/// The control carries the applicant identity itself, so a decision callback
/// needs no lookup against previously posted messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewControl {
    pub outcome: DecisionOutcome,
    pub applicant_id: ApplicantId,
}

impl ReviewControl {
    /// Wire identifier in the form `gate:<outcome>:<applicant>`.
    pub fn control_id(&self) -> String {
        format!(
            "{CONTROL_ID_PREFIX}:{}:{}",
            self.outcome.as_str(),
            self.applicant_id.0
        )
    }

    pub const fn label(&self) -> &'static str {
        match self.outcome {
            DecisionOutcome::Accept => "Accept",
            DecisionOutcome::Reject => "Reject",
        }
    }
}

/// Paginated review request addressed to one applicant.
///
/// Transmitted once through the directory gateway and never tracked
/// afterwards; decision correctness relies on querying live role state, not
/// on bookkeeping of open artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewArtifact {
    pub applicant_id: ApplicantId,
    pub summary: String,
    pub pages: Vec<ReviewPage>,
    pub controls: [ReviewControl; 2],
}

/// Assemble the review artifact for an already paginated application.
///
/// Pure assembly, no I/O. The summary embeds the applicant identity in the
/// recoverable `applicant:<id>` format so reaction-based decisions can be
/// correlated back; structured consumers should prefer the typed
/// `applicant_id` field.
pub fn build_review_request(
    applicant_id: ApplicantId,
    applicant_label: &str,
    pages: Vec<Vec<FormField>>,
) -> ReviewArtifact {
    let total = pages.len();
    let pages = pages
        .into_iter()
        .enumerate()
        .map(|(index, fields)| ReviewPage {
            number: index + 1,
            total,
            fields,
        })
        .collect();

    let summary = format!(
        "Membership application from {applicant_label} ({SUMMARY_REFERENCE_MARKER}{})",
        applicant_id.0
    );

    let controls = [
        ReviewControl {
            outcome: DecisionOutcome::Accept,
            applicant_id: applicant_id.clone(),
        },
        ReviewControl {
            outcome: DecisionOutcome::Reject,
            applicant_id: applicant_id.clone(),
        },
    ];

    ReviewArtifact {
        applicant_id,
        summary,
        pages,
        controls,
    }
}

/// Split a control id produced by [`ReviewControl::control_id`].
///
/// The outcome token is returned raw so the resolver can refuse unknown
/// values itself; `None` means the id does not belong to this workflow.
pub fn parse_control_id(control_id: &str) -> Option<(String, ApplicantId)> {
    let mut parts = control_id.splitn(3, ':');
    if parts.next()? != CONTROL_ID_PREFIX {
        return None;
    }

    let outcome = parts.next()?.to_string();
    let applicant = parts.next()?;
    if applicant.is_empty() {
        return None;
    }

    Some((outcome, ApplicantId(applicant.to_string())))
}

/// Recover the applicant identity embedded in an artifact summary line.
pub fn parse_applicant_reference(summary: &str) -> Option<ApplicantId> {
    let start = summary.find(SUMMARY_REFERENCE_MARKER)? + SUMMARY_REFERENCE_MARKER.len();
    let rest = &summary[start..];
    let end = rest
        .find(|c: char| c == ')' || c.is_whitespace())
        .unwrap_or(rest.len());
    let id = &rest[..end];

    if id.is_empty() {
        None
    } else {
        Some(ApplicantId(id.to_string()))
    }
}
