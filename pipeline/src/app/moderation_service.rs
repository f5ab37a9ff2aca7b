//! Moderation service
//!
//! Intake of new submissions and the automated analysis step. New items
//! are claimed with a compare-and-set into `Analyzing`, handed to the
//! classifier, and routed by confidence thresholds: approve, reject, or
//! queue for human review. An unreachable classifier never decides an
//! item's fate; those items land in the review queue instead.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::Config;
use crate::domain::entities::{
    Decision, DecisionSource, Item, ItemId, ItemState, NewItem, Provenance,
};
use crate::domain::ports::{AnalysisResult, ClassifierClient, ItemStore, Page, TransitionFields};
use crate::error::{AnalysisError, DomainError};

use super::backoff_delay;

/// Minimum payload length accepted at intake, in characters.
const MIN_PAYLOAD_CHARS: usize = 10;

/// Confidence thresholds routing automated decisions
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub approve_at: f64,
    pub reject_at: f64,
}

impl Thresholds {
    /// Route a confidence score. The approve branch is checked first so
    /// equal thresholds leave no dead review band.
    pub fn decide(&self, confidence: f64) -> Decision {
        if confidence >= self.approve_at {
            Decision::Approve
        } else if confidence <= self.reject_at {
            Decision::Reject
        } else {
            Decision::Review
        }
    }
}

pub struct ModerationService<S: ItemStore, C: ClassifierClient> {
    store: Arc<S>,
    classifier: Arc<C>,
    thresholds: Thresholds,
    max_attempts: u32,
    backoff_base: Duration,
    backoff_cap: Duration,
}

impl<S: ItemStore, C: ClassifierClient> ModerationService<S, C> {
    pub fn new(store: Arc<S>, classifier: Arc<C>, config: &Config) -> Self {
        Self {
            store,
            classifier,
            thresholds: Thresholds {
                approve_at: config.auto_approve_at,
                reject_at: config.auto_reject_at,
            },
            max_attempts: config.max_analysis_attempts,
            backoff_base: config.backoff_base,
            backoff_cap: config.backoff_cap,
        }
    }

    /// Accept a new submission. The payload is opaque beyond a minimum
    /// length check; everything else is the classifier's business.
    pub async fn submit(&self, payload: String) -> Result<Item, DomainError> {
        if payload.trim().chars().count() < MIN_PAYLOAD_CHARS {
            return Err(DomainError::Validation(format!(
                "payload must be at least {} characters",
                MIN_PAYLOAD_CHARS
            )));
        }

        let item = self.store.create(NewItem { payload }).await?;
        info!(item_id = %item.id, "Submission accepted");
        Ok(item)
    }

    /// Fetch an item's current state.
    pub async fn status(&self, id: &ItemId) -> Result<Item, DomainError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(id.to_string()))
    }

    /// Run automated analysis on one `New` item.
    ///
    /// The claim into `Analyzing` is a compare-and-set, so two workers
    /// racing on the same item resolve to one analysis. Losing the race
    /// surfaces as `StaleState` and is harmless.
    pub async fn moderate(&self, id: &ItemId) -> Result<Item, DomainError> {
        let item = self
            .store
            .transition(
                id,
                ItemState::New,
                ItemState::Analyzing,
                TransitionFields::none(),
            )
            .await?;

        match self.analyze_with_retry(&item.payload).await {
            Ok(result) => self.apply_analysis(id, result).await,
            Err(err) => {
                warn!(item_id = %id, error = %err, "Analysis failed, queueing for review");
                let rationale = if err.is_transient() {
                    "automated analysis unavailable".to_string()
                } else {
                    err.to_string()
                };
                let provenance = Provenance {
                    source: DecisionSource::Automated,
                    confidence: None,
                    rationale,
                    decided_at: Utc::now(),
                };
                self.store
                    .transition(
                        id,
                        ItemState::Analyzing,
                        ItemState::PendingReview,
                        TransitionFields::with_provenance(provenance),
                    )
                    .await
            }
        }
    }

    /// Claim and analyze up to `limit` pending submissions, oldest first.
    /// Per-item failures are isolated; the scan never aborts early.
    pub async fn drain_new(&self, limit: usize) -> Result<usize, DomainError> {
        let batch = self
            .store
            .query(&[ItemState::New], Page::first(limit))
            .await?;
        let mut processed = 0;
        for item in batch {
            match self.moderate(&item.id).await {
                Ok(_) => processed += 1,
                // Lost the claim race; another worker has it.
                Err(DomainError::StaleState { .. }) => {}
                Err(err) => {
                    warn!(item_id = %item.id, error = %err, "Moderation failed");
                }
            }
        }
        Ok(processed)
    }

    async fn analyze_with_retry(&self, payload: &str) -> Result<AnalysisResult, AnalysisError> {
        let mut attempt = 0;
        loop {
            match self.classifier.analyze(payload).await {
                Ok(result) => return Ok(result),
                Err(err) if err.is_transient() && attempt + 1 < self.max_attempts => {
                    let delay = backoff_delay(self.backoff_base, self.backoff_cap, attempt);
                    warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient analysis failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn apply_analysis(
        &self,
        id: &ItemId,
        result: AnalysisResult,
    ) -> Result<Item, DomainError> {
        let decision = self.thresholds.decide(result.confidence);
        let provenance = Provenance::automated(result.confidence, result.rationale.clone());
        // Keep the classifier's own hint, not the routed decision; review
        // decisions compare the human verdict against it.
        let fields = TransitionFields::with_provenance(provenance).with_suggestion(result.suggested);

        let next = match decision {
            Decision::Approve => ItemState::Approved,
            Decision::Reject => ItemState::Rejected,
            Decision::Review => ItemState::PendingReview,
        };

        let item = self
            .store
            .transition(id, ItemState::Analyzing, next, fields)
            .await?;
        info!(
            item_id = %id,
            confidence = result.confidence,
            decision = %decision,
            "Automated analysis complete"
        );
        Ok(item)
    }
}
