//! In-memory item store
//!
//! HashMap-backed implementation of `ItemStore`. The whole map sits
//! behind one `RwLock`, so `transition` holds the write lock for its
//! read-check-write and the compare-and-set is atomic by construction.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::entities::{Item, ItemId, ItemState, NewItem};
use crate::domain::ports::{ItemStore, Page, TransitionFields};
use crate::error::DomainError;

#[derive(Clone, Default)]
pub struct InMemoryItemStore {
    items: Arc<RwLock<HashMap<ItemId, Item>>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an existing item. Used by tests and by
    /// crash-recovery scenarios where items are reloaded at startup.
    pub async fn insert(&self, item: Item) {
        self.items.write().await.insert(item.id, item);
    }

    fn apply_fields(item: &mut Item, fields: TransitionFields) {
        if let Some(provenance) = fields.provenance {
            item.provenance = Some(provenance);
        }
        if let Some(suggestion) = fields.suggestion {
            item.suggestion = Some(suggestion);
        }
        if let Some(external_ref) = fields.external_ref {
            item.external_ref = Some(external_ref);
        }
        if let Some(failure) = fields.failure {
            item.failure_reason = Some(failure.reason);
            item.failure_permanent = failure.permanent;
        }
        if fields.record_attempt {
            item.publish_attempts += 1;
            item.last_attempt_at = Some(Utc::now());
        }
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn create(&self, new: NewItem) -> Result<Item, DomainError> {
        let now = Utc::now();
        let item = Item {
            id: ItemId::new(),
            payload: new.payload,
            state: ItemState::New,
            suggestion: None,
            provenance: None,
            publish_attempts: 0,
            last_attempt_at: None,
            external_ref: None,
            published_at: None,
            failure_reason: None,
            failure_permanent: false,
            created_at: now,
            updated_at: now,
        };
        self.items.write().await.insert(item.id, item.clone());
        Ok(item)
    }

    async fn get(&self, id: &ItemId) -> Result<Option<Item>, DomainError> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn transition(
        &self,
        id: &ItemId,
        expected: ItemState,
        next: ItemState,
        fields: TransitionFields,
    ) -> Result<Item, DomainError> {
        if !expected.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: expected,
                to: next,
            });
        }

        let mut items = self.items.write().await;
        let item = items
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(id.to_string()))?;
        if item.state != expected {
            return Err(DomainError::StaleState {
                expected,
                actual: item.state,
            });
        }

        item.state = next;
        Self::apply_fields(item, fields);
        if next == ItemState::Published {
            item.published_at = Some(Utc::now());
        }
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn query(&self, states: &[ItemState], page: Page) -> Result<Vec<Item>, DomainError> {
        let items = self.items.read().await;
        let mut matched: Vec<Item> = items
            .values()
            .filter(|item| states.contains(&item.state))
            .cloned()
            .collect();
        // Id as tiebreaker keeps pagination stable for equal timestamps.
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(matched
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect())
    }

    async fn count(&self, states: &[ItemState]) -> Result<usize, DomainError> {
        let items = self.items.read().await;
        Ok(items
            .values()
            .filter(|item| states.contains(&item.state))
            .count())
    }
}
