//! Review types
//!
//! Human verdicts on pending items, and per-id outcomes for bulk
//! decisions.

use serde::{Deserialize, Serialize};

use super::item::{Decision, ItemId};
use crate::error::DomainError;

/// A human reviewer's verdict on an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewVerdict {
    Approve,
    Reject,
}

impl ReviewVerdict {
    pub fn as_decision(&self) -> Decision {
        match self {
            ReviewVerdict::Approve => Decision::Approve,
            ReviewVerdict::Reject => Decision::Reject,
        }
    }
}

impl std::fmt::Display for ReviewVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewVerdict::Approve => write!(f, "approve"),
            ReviewVerdict::Reject => write!(f, "reject"),
        }
    }
}

/// Per-id result of a bulk review decision
#[derive(Debug)]
pub struct BulkOutcome {
    pub item_id: ItemId,
    pub outcome: Result<(), DomainError>,
}

impl BulkOutcome {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}
