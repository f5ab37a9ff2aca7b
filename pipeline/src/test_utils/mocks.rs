//! Manual mock implementations of the domain ports
//!
//! Deliberately hand-rolled rather than generated: the failure-injection
//! behavior (transient runs, per-payload permanent failures) is easier
//! to read and reuse this way.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::entities::{Decision, FeedbackId, FeedbackRecord, Item, NewFeedbackRecord};
use crate::domain::ports::{
    AnalysisResult, ClassifierClient, FeedbackSink, PlatformClient, PublishReceipt,
};
use crate::error::{AnalysisError, FeedbackError, PublishError};

/// Mock classifier with configurable results and failure injection
pub struct MockClassifierClient {
    result: Option<(f64, Decision, String)>,
    transient_failures: Mutex<u32>,
    permanent_failure: bool,
    calls: AtomicUsize,
}

impl MockClassifierClient {
    pub fn new() -> Self {
        Self {
            result: None,
            transient_failures: Mutex::new(0),
            permanent_failure: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_result(mut self, confidence: f64, suggested: Decision, rationale: &str) -> Self {
        self.result = Some((confidence, suggested, rationale.to_string()));
        self
    }

    /// Fail the next `count` calls with a transient error.
    pub fn with_transient_failures(self, count: u32) -> Self {
        *self.transient_failures.lock().unwrap() = count;
        self
    }

    pub fn with_permanent_failure(mut self) -> Self {
        self.permanent_failure = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockClassifierClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClassifierClient for MockClassifierClient {
    async fn analyze(&self, _payload: &str) -> Result<AnalysisResult, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.permanent_failure {
            return Err(AnalysisError::Rejected("payload refused".to_string()));
        }

        {
            let mut remaining = self.transient_failures.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(AnalysisError::Unavailable("mock outage".to_string()));
            }
        }

        let (confidence, suggested, rationale) = self
            .result
            .clone()
            .unwrap_or((0.5, Decision::Review, "no opinion".to_string()));
        Ok(AnalysisResult {
            confidence,
            suggested,
            rationale,
        })
    }
}

/// Mock publishing platform with failure injection
pub struct MockPlatformClient {
    transient_failures: Mutex<u32>,
    permanent_failure: bool,
    permanent_payload: Option<String>,
    calls: AtomicUsize,
}

impl MockPlatformClient {
    pub fn new() -> Self {
        Self {
            transient_failures: Mutex::new(0),
            permanent_failure: false,
            permanent_payload: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail the next `count` calls with a transient error.
    pub fn with_transient_failures(self, count: u32) -> Self {
        *self.transient_failures.lock().unwrap() = count;
        self
    }

    pub fn with_permanent_failure(mut self) -> Self {
        self.permanent_failure = true;
        self
    }

    /// Fail permanently only for items with this exact payload.
    pub fn with_permanent_failure_for_payload(mut self, payload: &str) -> Self {
        self.permanent_payload = Some(payload.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Clear any remaining injected transient failures.
    pub async fn reset_failures(&self) {
        *self.transient_failures.lock().unwrap() = 0;
    }
}

impl Default for MockPlatformClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformClient for MockPlatformClient {
    async fn post(&self, item: &Item) -> Result<PublishReceipt, PublishError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.permanent_failure {
            return Err(PublishError::Permanent("content refused".to_string()));
        }
        if let Some(payload) = &self.permanent_payload {
            if item.payload == *payload {
                return Err(PublishError::Permanent("content refused".to_string()));
            }
        }

        {
            let mut remaining = self.transient_failures.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(PublishError::Transient("mock outage".to_string()));
            }
        }

        Ok(PublishReceipt {
            external_ref: format!("post-{}", item.id),
        })
    }
}

/// Feedback sink that keeps records in memory
#[derive(Clone, Default)]
pub struct InMemoryFeedbackSink {
    records: Arc<RwLock<Vec<FeedbackRecord>>>,
    fail: bool,
}

impl InMemoryFeedbackSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `record` call fail.
    pub fn with_failure(mut self) -> Self {
        self.fail = true;
        self
    }

    pub async fn records(&self) -> Vec<FeedbackRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl FeedbackSink for InMemoryFeedbackSink {
    async fn record(&self, new: NewFeedbackRecord) -> Result<FeedbackRecord, FeedbackError> {
        if self.fail {
            return Err(FeedbackError::RecordingFailed("mock sink failure".to_string()));
        }
        let record = FeedbackRecord {
            id: FeedbackId::new(),
            item_id: new.item_id,
            suggested: new.suggested,
            verdict: new.verdict,
            note: new.note,
            recorded_at: Utc::now(),
        };
        self.records.write().await.push(record.clone());
        Ok(record)
    }
}
