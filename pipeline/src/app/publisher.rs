//! Publisher
//!
//! Delivers approved items to the publishing platform. Each item is
//! claimed with a compare-and-set into `Publishing`, which guarantees at
//! most one in-flight publish per item no matter how many workers run.
//! Within a claim, transient platform failures are retried with backoff;
//! when the budget runs out the item lands in `PublishFailed` and a later
//! batch picks it up again, unless the failure was permanent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::Config;
use crate::domain::entities::{Item, ItemState};
use crate::domain::ports::{Failure, ItemStore, PlatformClient, TransitionFields};
use crate::error::{DomainError, PublishError};

use super::backoff_delay;

/// Summary of one publish batch
#[derive(Debug, Default, Clone, Copy)]
pub struct BatchReport {
    pub published: usize,
    pub failed: usize,
    /// Items whose claim was lost to a concurrent actor
    pub skipped: usize,
    /// True when the batch stopped early on shutdown
    pub cancelled: bool,
}

pub struct Publisher<S: ItemStore, P: PlatformClient> {
    store: Arc<S>,
    platform: Arc<P>,
    max_attempts: u32,
    backoff_base: Duration,
    backoff_cap: Duration,
    concurrency: usize,
}

impl<S: ItemStore + 'static, P: PlatformClient + 'static> Publisher<S, P> {
    pub fn new(store: Arc<S>, platform: Arc<P>, config: &Config) -> Self {
        Self {
            store,
            platform,
            max_attempts: config.max_publish_attempts,
            backoff_base: config.backoff_base,
            backoff_cap: config.backoff_cap,
            concurrency: config.batch_concurrency,
        }
    }

    /// Publish a batch of items with bounded concurrency. Cancellation is
    /// honored at item boundaries: in-flight publishes finish, queued
    /// items are left untouched for the next run.
    pub async fn publish_batch(self: Arc<Self>, items: Vec<Item>, cancel: &AtomicBool) -> BatchReport {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::new();
        let mut report = BatchReport::default();

        for item in items {
            if cancel.load(Ordering::SeqCst) {
                report.cancelled = true;
                break;
            }
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                // The semaphore is never closed.
                Err(_) => break,
            };
            let publisher = Arc::clone(&self);
            handles.push(tokio::spawn(async move {
                let outcome = publisher.publish_one(&item).await;
                drop(permit);
                outcome
            }));
        }

        for handle in handles {
            match handle.await {
                Ok(Ok(true)) => report.published += 1,
                Ok(Ok(false)) => report.skipped += 1,
                Ok(Err(_)) => report.failed += 1,
                Err(err) => {
                    warn!(error = %err, "Publish task panicked");
                    report.failed += 1;
                }
            }
        }

        info!(
            published = report.published,
            failed = report.failed,
            skipped = report.skipped,
            cancelled = report.cancelled,
            "Publish batch complete"
        );
        report
    }

    /// Publish one item. Returns `Ok(true)` on success, `Ok(false)` when
    /// the claim was lost, and `Err` when the item ends in `PublishFailed`.
    pub async fn publish_one(&self, item: &Item) -> Result<bool, DomainError> {
        let expected = match item.state {
            ItemState::Approved => ItemState::Approved,
            ItemState::PublishFailed if !item.failure_permanent => ItemState::PublishFailed,
            _ => return Ok(false),
        };

        let fields = TransitionFields {
            record_attempt: true,
            ..TransitionFields::default()
        };
        let claimed = match self
            .store
            .transition(&item.id, expected, ItemState::Publishing, fields)
            .await
        {
            Ok(claimed) => claimed,
            Err(DomainError::StaleState { .. }) => {
                info!(item_id = %item.id, "Publish claim lost, skipping");
                return Ok(false);
            }
            Err(err) => return Err(err),
        };

        match self.post_with_retry(&claimed).await {
            Ok(external_ref) => {
                let fields = TransitionFields {
                    external_ref: Some(external_ref.clone()),
                    ..TransitionFields::default()
                };
                self.store
                    .transition(&item.id, ItemState::Publishing, ItemState::Published, fields)
                    .await?;
                info!(item_id = %item.id, external_ref = %external_ref, "Item published");
                Ok(true)
            }
            Err(err) => {
                let permanent = !err.is_transient();
                let fields = TransitionFields {
                    failure: Some(Failure {
                        reason: err.to_string(),
                        permanent,
                    }),
                    ..TransitionFields::default()
                };
                self.store
                    .transition(
                        &item.id,
                        ItemState::Publishing,
                        ItemState::PublishFailed,
                        fields,
                    )
                    .await?;
                warn!(item_id = %item.id, permanent, error = %err, "Publish failed");
                Err(DomainError::Internal(format!(
                    "publish failed for {}: {}",
                    item.id, err
                )))
            }
        }
    }

    async fn post_with_retry(&self, item: &Item) -> Result<String, PublishError> {
        let mut attempt = 0;
        loop {
            match self.platform.post(item).await {
                Ok(receipt) => return Ok(receipt.external_ref),
                Err(err) if err.is_transient() && attempt + 1 < self.max_attempts => {
                    let delay = backoff_delay(self.backoff_base, self.backoff_cap, attempt);
                    warn!(
                        item_id = %item.id,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient publish failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryItemStore;
    use crate::test_utils::{test_config, test_item, MockPlatformClient};

    fn publisher(
        store: Arc<InMemoryItemStore>,
        platform: Arc<MockPlatformClient>,
    ) -> Arc<Publisher<InMemoryItemStore, MockPlatformClient>> {
        let mut config = test_config();
        config.backoff_base = Duration::from_millis(1);
        config.backoff_cap = Duration::from_millis(2);
        Arc::new(Publisher::new(store, platform, &config))
    }

    #[tokio::test]
    async fn publish_one_succeeds_and_records_receipt() {
        let store = Arc::new(InMemoryItemStore::new());
        let platform = Arc::new(MockPlatformClient::new());
        let item = test_item(ItemState::Approved);
        store.insert(item.clone()).await;
        let publisher = publisher(store.clone(), platform.clone());

        assert!(publisher.publish_one(&item).await.unwrap());

        let published = store.get(&item.id).await.unwrap().unwrap();
        assert_eq!(published.state, ItemState::Published);
        assert!(published.external_ref.is_some());
        assert!(published.published_at.is_some());
        assert_eq!(published.publish_attempts, 1);
        assert_eq!(platform.call_count(), 1);
    }

    #[tokio::test]
    async fn transient_failures_retry_within_the_claim() {
        let store = Arc::new(InMemoryItemStore::new());
        let platform = Arc::new(MockPlatformClient::new().with_transient_failures(2));
        let item = test_item(ItemState::Approved);
        store.insert(item.clone()).await;
        let publisher = publisher(store.clone(), platform.clone());

        assert!(publisher.publish_one(&item).await.unwrap());
        assert_eq!(platform.call_count(), 3);
        let published = store.get(&item.id).await.unwrap().unwrap();
        assert_eq!(published.state, ItemState::Published);
    }

    #[tokio::test]
    async fn exhausted_transient_retries_leave_a_retryable_failure() {
        let store = Arc::new(InMemoryItemStore::new());
        let platform = Arc::new(MockPlatformClient::new().with_transient_failures(10));
        let item = test_item(ItemState::Approved);
        store.insert(item.clone()).await;
        let publisher = publisher(store.clone(), platform.clone());

        assert!(publisher.publish_one(&item).await.is_err());
        assert_eq!(platform.call_count(), 3);

        let failed = store.get(&item.id).await.unwrap().unwrap();
        assert_eq!(failed.state, ItemState::PublishFailed);
        assert!(!failed.failure_permanent);
        assert!(failed.is_publishable());
        assert!(failed.failure_reason.is_some());
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried_again() {
        let store = Arc::new(InMemoryItemStore::new());
        let platform = Arc::new(MockPlatformClient::new().with_permanent_failure());
        let item = test_item(ItemState::Approved);
        store.insert(item.clone()).await;
        let publisher = publisher(store.clone(), platform.clone());

        assert!(publisher.publish_one(&item).await.is_err());
        assert_eq!(platform.call_count(), 1);

        let failed = store.get(&item.id).await.unwrap().unwrap();
        assert_eq!(failed.state, ItemState::PublishFailed);
        assert!(failed.failure_permanent);
        assert!(!failed.is_publishable());

        // A second pass over the same item is a no-op.
        assert!(!publisher.publish_one(&failed).await.unwrap());
        assert_eq!(platform.call_count(), 1);
    }

    #[tokio::test]
    async fn failed_item_can_be_retried_on_a_later_run() {
        let store = Arc::new(InMemoryItemStore::new());
        let platform = Arc::new(MockPlatformClient::new().with_transient_failures(10));
        let item = test_item(ItemState::Approved);
        store.insert(item.clone()).await;
        let publisher = publisher(store.clone(), platform.clone());

        assert!(publisher.publish_one(&item).await.is_err());
        platform.reset_failures().await;

        let failed = store.get(&item.id).await.unwrap().unwrap();
        assert!(publisher.publish_one(&failed).await.unwrap());

        let published = store.get(&item.id).await.unwrap().unwrap();
        assert_eq!(published.state, ItemState::Published);
        assert_eq!(published.publish_attempts, 2);
    }

    #[tokio::test]
    async fn concurrent_publishers_post_exactly_once() {
        let store = Arc::new(InMemoryItemStore::new());
        let platform = Arc::new(MockPlatformClient::new());
        let item = test_item(ItemState::Approved);
        store.insert(item.clone()).await;
        let publisher = publisher(store.clone(), platform.clone());

        let mut handles = Vec::new();
        for _ in 0..6 {
            let publisher = Arc::clone(&publisher);
            let item = item.clone();
            handles.push(tokio::spawn(async move { publisher.publish_one(&item).await }));
        }

        let mut published = 0;
        let mut skipped = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                true => published += 1,
                false => skipped += 1,
            }
        }
        assert_eq!(published, 1);
        assert_eq!(skipped, 5);
        assert_eq!(platform.call_count(), 1);
    }

    #[tokio::test]
    async fn batch_isolates_failures_per_item() {
        let store = Arc::new(InMemoryItemStore::new());
        let platform = Arc::new(MockPlatformClient::new().with_permanent_failure_for_payload("bad"));
        let good = test_item(ItemState::Approved);
        let mut bad = test_item(ItemState::Approved);
        bad.payload = "bad".to_string();
        store.insert(good.clone()).await;
        store.insert(bad.clone()).await;
        let publisher = publisher(store.clone(), platform);

        let cancel = AtomicBool::new(false);
        let report = publisher
            .publish_batch(vec![good.clone(), bad.clone()], &cancel)
            .await;

        assert_eq!(report.published, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(
            store.get(&good.id).await.unwrap().unwrap().state,
            ItemState::Published
        );
        assert_eq!(
            store.get(&bad.id).await.unwrap().unwrap().state,
            ItemState::PublishFailed
        );
    }

    #[tokio::test]
    async fn cancelled_batch_stops_at_item_boundaries() {
        let store = Arc::new(InMemoryItemStore::new());
        let platform = Arc::new(MockPlatformClient::new());
        let items: Vec<Item> = (0..4).map(|_| test_item(ItemState::Approved)).collect();
        for item in &items {
            store.insert(item.clone()).await;
        }
        let publisher = publisher(store.clone(), platform);

        let cancel = AtomicBool::new(true);
        let report = publisher.publish_batch(items, &cancel).await;

        assert!(report.cancelled);
        assert_eq!(report.published, 0);
        assert_eq!(store.count(&[ItemState::Approved]).await.unwrap(), 4);
    }
}
