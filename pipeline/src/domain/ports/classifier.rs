//! Classifier client port trait
//!
//! Wraps the external content-classification service. The gateway adds no
//! randomness of its own; retry policy lives in the moderation service.

use async_trait::async_trait;

use crate::domain::entities::Decision;
use crate::error::AnalysisError;

/// Structured output of one analysis call
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Certainty that the content is acceptable, in [0, 1]
    pub confidence: f64,
    /// The classifier's decision hint
    pub suggested: Decision,
    pub rationale: String,
}

/// Port trait for the content-classification service
#[async_trait]
pub trait ClassifierClient: Send + Sync {
    /// Analyze a content payload. The implementation must bound the call
    /// with a timeout; transient failures surface as
    /// `AnalysisError::Timeout` or `AnalysisError::Unavailable`.
    async fn analyze(&self, payload: &str) -> Result<AnalysisResult, AnalysisError>;
}
