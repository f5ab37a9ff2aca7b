//! Feedback sink port trait

use async_trait::async_trait;

use crate::domain::entities::{FeedbackRecord, NewFeedbackRecord};
use crate::error::FeedbackError;

/// Port trait for the append-only feedback log
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    /// Append a correction record. Pure append: existing records are never
    /// mutated or deleted. A failure here must not reverse the human
    /// decision that produced the record.
    async fn record(&self, record: NewFeedbackRecord) -> Result<FeedbackRecord, FeedbackError>;
}
