use serde::Deserialize;
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::error::EngineError;
use crate::model::status::ApprovalStatus;

/// Manager verdict on a pending record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString, ToSchema)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn target_status(&self) -> ApprovalStatus {
        match self {
            Decision::Approve => ApprovalStatus::Approved,
            Decision::Reject => ApprovalStatus::Rejected,
        }
    }
}

/// One-shot transition: `pending` moves to the decided status exactly
/// once. A second decision on the same record is rejected, never
/// silently re-applied.
pub fn next_status(
    current: ApprovalStatus,
    decision: Decision,
    subject: &'static str,
) -> Result<ApprovalStatus, EngineError> {
    if current.is_decided() {
        return Err(EngineError::AlreadyDecided(subject));
    }
    Ok(decision.target_status())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_moves_to_approved() {
        let next = next_status(ApprovalStatus::Pending, Decision::Approve, "leave request");
        assert_eq!(next.unwrap(), ApprovalStatus::Approved);
    }

    #[test]
    fn pending_moves_to_rejected() {
        let next = next_status(ApprovalStatus::Pending, Decision::Reject, "leave request");
        assert_eq!(next.unwrap(), ApprovalStatus::Rejected);
    }

    #[test]
    fn second_decision_is_rejected() {
        for decided in [ApprovalStatus::Approved, ApprovalStatus::Rejected] {
            for decision in [Decision::Approve, Decision::Reject] {
                let err = next_status(decided, decision, "leave request").unwrap_err();
                assert!(matches!(err, EngineError::AlreadyDecided(_)));
            }
        }
    }
}
