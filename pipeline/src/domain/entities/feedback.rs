//! Feedback record entity
//!
//! A feedback record captures a human correction of an automated
//! suggestion. Records are append-only training signal for offline
//! threshold tuning; the pipeline only produces them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::item::{Decision, ItemId};

/// Unique identifier for a feedback record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedbackId(pub Uuid);

impl FeedbackId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FeedbackId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FeedbackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A recorded human correction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: FeedbackId,
    pub item_id: ItemId,
    /// What the automated analysis suggested
    pub suggested: Decision,
    /// What the human decided
    pub verdict: Decision,
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Data needed to append a feedback record
#[derive(Debug, Clone)]
pub struct NewFeedbackRecord {
    pub item_id: ItemId,
    pub suggested: Decision,
    pub verdict: Decision,
    pub note: Option<String>,
}
