//! Publishing platform port trait

use async_trait::async_trait;

use crate::domain::entities::Item;
use crate::error::PublishError;

/// Successful publish response
#[derive(Debug, Clone)]
pub struct PublishReceipt {
    /// The platform's reference for the published post
    pub external_ref: String,
}

/// Port trait for the external publishing platform
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Publish one item's payload. The implementation must bound the call
    /// with a timeout; 429s/5xx surface as `PublishError::Transient`,
    /// other client errors as `PublishError::Permanent`.
    async fn post(&self, item: &Item) -> Result<PublishReceipt, PublishError>;
}
