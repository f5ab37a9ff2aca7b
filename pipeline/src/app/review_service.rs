//! Review service
//!
//! Human decisions over the review queue. Every accepted verdict is
//! recorded with manual provenance; when a verdict contradicts what the
//! classifier suggested, a correction record goes to the feedback log.
//! Feedback failures are logged loudly but never reverse a decision.

use std::sync::Arc;

use tracing::{error, info};

use crate::domain::entities::{
    BulkOutcome, Decision, Item, ItemId, ItemState, NewFeedbackRecord, Provenance, ReviewVerdict,
};
use crate::domain::ports::{FeedbackSink, ItemStore, Page, TransitionFields};
use crate::error::DomainError;

pub struct ReviewService<S: ItemStore, F: FeedbackSink> {
    store: Arc<S>,
    feedback: Arc<F>,
}

impl<S: ItemStore, F: FeedbackSink> ReviewService<S, F> {
    pub fn new(store: Arc<S>, feedback: Arc<F>) -> Self {
        Self { store, feedback }
    }

    /// List items awaiting a human decision, oldest first.
    pub async fn list_pending(&self, page: Page) -> Result<Vec<Item>, DomainError> {
        self.store.query(&[ItemState::PendingReview], page).await
    }

    /// Apply a human verdict to one pending item.
    pub async fn decide(
        &self,
        id: &ItemId,
        verdict: ReviewVerdict,
        note: Option<String>,
    ) -> Result<Item, DomainError> {
        let item = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(id.to_string()))?;
        if item.state != ItemState::PendingReview {
            return Err(DomainError::ItemNotPending(id.to_string()));
        }

        let (next, default_rationale) = match verdict {
            ReviewVerdict::Approve => (ItemState::Approved, "manually approved"),
            ReviewVerdict::Reject => (ItemState::Rejected, "manually rejected"),
        };
        let rationale = note.clone().unwrap_or_else(|| default_rationale.to_string());
        let decided = self
            .store
            .transition(
                id,
                ItemState::PendingReview,
                next,
                TransitionFields::with_provenance(Provenance::manual(rationale)),
            )
            .await
            .map_err(|err| match err {
                // A concurrent decision landed between the pending check
                // and the claim; same answer as failing the check.
                DomainError::StaleState {
                    expected: ItemState::PendingReview,
                    ..
                } => DomainError::ItemNotPending(id.to_string()),
                other => other,
            })?;
        info!(item_id = %id, verdict = %verdict, "Review decision applied");

        // Only disagreements with the classifier are worth learning from.
        if let Some(suggested) = item.suggestion {
            if suggested != verdict.as_decision() {
                self.record_feedback(id, suggested, verdict.as_decision(), note)
                    .await;
            }
        }

        Ok(decided)
    }

    /// Apply one verdict to many items. Outcomes are independent: one
    /// bad id never blocks the rest of the batch.
    pub async fn bulk_decide(
        &self,
        ids: &[ItemId],
        verdict: ReviewVerdict,
        note: Option<String>,
    ) -> Vec<BulkOutcome> {
        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            let outcome = self.decide(id, verdict, note.clone()).await.map(|_| ());
            outcomes.push(BulkOutcome {
                item_id: *id,
                outcome,
            });
        }
        outcomes
    }

    /// Reverse an approved item to rejected before it is published. This
    /// is the only path out of `Approved` besides publishing; the
    /// compare-and-set makes it mutually exclusive with a scheduler
    /// claiming the item.
    pub async fn override_decision(
        &self,
        id: &ItemId,
        note: Option<String>,
    ) -> Result<Item, DomainError> {
        let item = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(id.to_string()))?;

        let rationale = note
            .clone()
            .unwrap_or_else(|| "approval overridden".to_string());
        let rejected = self
            .store
            .transition(
                id,
                ItemState::Approved,
                ItemState::Rejected,
                TransitionFields::with_provenance(Provenance::manual(rationale)),
            )
            .await?;
        info!(item_id = %id, "Approval overridden to rejected");

        // The log only carries real automated suggestions; an item that
        // was approved without one (analysis outage path) has nothing to
        // correct.
        if let Some(suggested) = item.suggestion {
            if suggested != Decision::Reject {
                self.record_feedback(id, suggested, Decision::Reject, note)
                    .await;
            }
        }

        Ok(rejected)
    }

    async fn record_feedback(
        &self,
        id: &ItemId,
        suggested: Decision,
        verdict: Decision,
        note: Option<String>,
    ) {
        let record = NewFeedbackRecord {
            item_id: *id,
            suggested,
            verdict,
            note,
        };
        if let Err(err) = self.feedback.record(record).await {
            error!(item_id = %id, error = %err, "Failed to record correction feedback");
        }
    }
}
