//! HTTP classifier client implementation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::entities::Decision;
use crate::domain::ports::{AnalysisResult, ClassifierClient};
use crate::error::AnalysisError;

/// Implementation of the classifier client against the moderation API
pub struct HttpClassifierClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl HttpClassifierClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, AnalysisError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::Unavailable(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/v1{}", self.base_url, path)
    }
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    content: &'a str,
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    decision: String,
    confidence: f64,
    #[serde(default)]
    reason: String,
}

impl AnalyzeResponse {
    /// Unknown decision labels fall back to `Review`; a confused
    /// classifier must never auto-approve or auto-reject.
    fn suggested(&self) -> Decision {
        match self.decision.to_uppercase().as_str() {
            "APPROVE" => Decision::Approve,
            "REJECT" => Decision::Reject,
            _ => Decision::Review,
        }
    }
}

#[async_trait]
impl ClassifierClient for HttpClassifierClient {
    async fn analyze(&self, payload: &str) -> Result<AnalysisResult, AnalysisError> {
        let response = self
            .http
            .post(self.api_url("/analyze"))
            .bearer_auth(&self.api_key)
            .json(&AnalyzeRequest { content: payload })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::Timeout
                } else {
                    AnalysisError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            let body: AnalyzeResponse = response
                .json()
                .await
                .map_err(|e| AnalysisError::Deserialization(e.to_string()))?;
            if !(0.0..=1.0).contains(&body.confidence) || body.confidence.is_nan() {
                return Err(AnalysisError::Deserialization(format!(
                    "confidence {} is outside [0, 1]",
                    body.confidence
                )));
            }
            let suggested = body.suggested();
            Ok(AnalysisResult {
                confidence: body.confidence,
                suggested,
                rationale: body.reason,
            })
        } else if status.as_u16() == 429 || status.is_server_error() {
            let message = response.text().await.unwrap_or_default();
            Err(AnalysisError::Unavailable(format!(
                "status {}: {}",
                status, message
            )))
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(AnalysisError::Rejected(format!(
                "status {}: {}",
                status, message
            )))
        }
    }
}
