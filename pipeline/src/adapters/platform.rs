//! HTTP publishing platform client implementation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::entities::Item;
use crate::domain::ports::{PlatformClient, PublishReceipt};
use crate::error::PublishError;

/// Implementation of the publishing platform client
pub struct HttpPlatformClient {
    http: Client,
    base_url: String,
    token: String,
}

impl HttpPlatformClient {
    pub fn new(base_url: String, token: String, timeout: Duration) -> Result<Self, PublishError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PublishError::Permanent(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/v1{}", self.base_url, path)
    }
}

#[derive(Serialize)]
struct CreatePostRequest<'a> {
    content: &'a str,
    idempotency_key: String,
}

#[derive(Deserialize)]
struct CreatePostResponse {
    id: String,
}

#[async_trait]
impl PlatformClient for HttpPlatformClient {
    async fn post(&self, item: &Item) -> Result<PublishReceipt, PublishError> {
        let request = CreatePostRequest {
            content: &item.payload,
            // The item id dedupes replays after a crash between the
            // platform accepting the post and the state being recorded.
            idempotency_key: item.id.to_string(),
        };

        let response = self
            .http
            .post(self.api_url("/posts"))
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PublishError::Timeout
                } else {
                    PublishError::Transient(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            let body: CreatePostResponse = response
                .json()
                .await
                .map_err(|e| PublishError::Permanent(e.to_string()))?;
            Ok(PublishReceipt {
                external_ref: body.id,
            })
        } else if status.as_u16() == 429 || status.is_server_error() {
            let message = response.text().await.unwrap_or_default();
            Err(PublishError::Transient(format!(
                "status {}: {}",
                status, message
            )))
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(PublishError::Permanent(format!(
                "status {}: {}",
                status, message
            )))
        }
    }
}
