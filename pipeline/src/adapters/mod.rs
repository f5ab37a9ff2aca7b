//! Adapters
//!
//! Concrete implementations of the domain port traits: the in-memory
//! item store, HTTP clients for the classifier and the publishing
//! platform, and the JSONL feedback sink.

pub mod classifier;
pub mod feedback;
pub mod memory;
pub mod platform;

pub use classifier::HttpClassifierClient;
pub use feedback::JsonlFeedbackSink;
pub use memory::InMemoryItemStore;
pub use platform::HttpPlatformClient;
