//! JSONL feedback sink implementation
//!
//! Appends one JSON object per line to the feedback log. Append-only by
//! construction: the file is opened in append mode and nothing ever
//! rewrites it.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;

use crate::domain::entities::{FeedbackId, FeedbackRecord, NewFeedbackRecord};
use crate::domain::ports::FeedbackSink;
use crate::error::FeedbackError;

pub struct JsonlFeedbackSink {
    path: PathBuf,
}

impl JsonlFeedbackSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FeedbackSink for JsonlFeedbackSink {
    async fn record(&self, new: NewFeedbackRecord) -> Result<FeedbackRecord, FeedbackError> {
        let record = FeedbackRecord {
            id: FeedbackId::new(),
            item_id: new.item_id,
            suggested: new.suggested,
            verdict: new.verdict,
            note: new.note,
            recorded_at: Utc::now(),
        };

        let mut line = serde_json::to_string(&record)
            .map_err(|e| FeedbackError::RecordingFailed(e.to_string()))?;
        line.push('\n');

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| FeedbackError::RecordingFailed(e.to_string()))?;
            }
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| FeedbackError::RecordingFailed(e.to_string()))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| FeedbackError::RecordingFailed(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| FeedbackError::RecordingFailed(e.to_string()))?;

        Ok(record)
    }
}
