//! Domain ports (traits)
//!
//! Port traits define interfaces that the domain layer requires.
//! Adapters provide concrete implementations of these traits.

pub mod classifier;
pub mod feedback;
pub mod platform;
pub mod store;

pub use classifier::{AnalysisResult, ClassifierClient};
pub use feedback::FeedbackSink;
pub use platform::{PlatformClient, PublishReceipt};
pub use store::{Failure, ItemStore, Page, TransitionFields};
