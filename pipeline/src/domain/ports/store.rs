//! Item store port trait
//!
//! The store exclusively owns item lifecycle state. All mutation goes
//! through `transition`, an atomic compare-and-set on the current state:
//! concurrent transition attempts on the same item are serialized so
//! exactly one wins, and a failed transition leaves the item untouched.

use async_trait::async_trait;

use crate::domain::entities::{Decision, Item, ItemId, ItemState, NewItem, Provenance};
use crate::error::DomainError;

/// Pagination window for queries
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }

    pub fn first(limit: usize) -> Self {
        Self { limit, offset: 0 }
    }
}

/// Publish failure details folded into an item
#[derive(Debug, Clone)]
pub struct Failure {
    pub reason: String,
    /// Permanent failures are not retried on later scheduler ticks
    pub permanent: bool,
}

/// Fields applied atomically alongside a state transition
#[derive(Debug, Clone, Default)]
pub struct TransitionFields {
    pub provenance: Option<Provenance>,
    pub suggestion: Option<Decision>,
    pub external_ref: Option<String>,
    pub failure: Option<Failure>,
    /// Bump the publish attempt counter and stamp the attempt time
    pub record_attempt: bool,
}

impl TransitionFields {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_provenance(provenance: Provenance) -> Self {
        Self {
            provenance: Some(provenance),
            ..Self::default()
        }
    }

    pub fn with_suggestion(mut self, suggestion: Decision) -> Self {
        self.suggestion = Some(suggestion);
        self
    }
}

/// Port trait for the durable item store
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Persist a new item in state `New` and return it.
    async fn create(&self, item: NewItem) -> Result<Item, DomainError>;

    /// Fetch an item by id.
    async fn get(&self, id: &ItemId) -> Result<Option<Item>, DomainError>;

    /// Atomically move an item from `expected` to `next`, folding in
    /// `fields`. Fails with `StaleState` if the current state is not
    /// `expected`, and with `InvalidTransition` if `expected -> next` is
    /// not a legal lifecycle edge. On failure nothing is mutated.
    async fn transition(
        &self,
        id: &ItemId,
        expected: ItemState,
        next: ItemState,
        fields: TransitionFields,
    ) -> Result<Item, DomainError>;

    /// List items in any of the given states, ordered oldest-submitted
    /// first (stable across pages).
    async fn query(&self, states: &[ItemState], page: Page) -> Result<Vec<Item>, DomainError>;

    /// Count items in any of the given states.
    async fn count(&self, states: &[ItemState]) -> Result<usize, DomainError>;
}
