//! Domain entities
//!
//! Pure domain models for the moderation-and-publishing pipeline.

pub mod feedback;
pub mod item;
pub mod review;

pub use feedback::{FeedbackId, FeedbackRecord, NewFeedbackRecord};
pub use item::{
    Decision, DecisionSource, Item, ItemId, ItemState, NewItem, Provenance,
};
pub use review::{BulkOutcome, ReviewVerdict};
