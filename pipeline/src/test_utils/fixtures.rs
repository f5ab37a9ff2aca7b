//! Test fixtures

use std::time::Duration;

use chrono::Utc;

use crate::config::Config;
use crate::domain::entities::{Decision, Item, ItemId, ItemState};

/// An item parked in the given lifecycle state.
pub fn test_item(state: ItemState) -> Item {
    let now = Utc::now();
    Item {
        id: ItemId::new(),
        payload: "a reasonable piece of content".to_string(),
        state,
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
    }
}

/// An item carrying a classifier suggestion, for feedback scenarios.
pub fn test_item_with_suggestion(state: ItemState, suggestion: Decision) -> Item {
    let mut item = test_item(state);
    item.suggestion = Some(suggestion);
    item
}

/// A valid configuration with fast timings for tests.
pub fn test_config() -> Config {
    Config {
        classifier_url: "http://localhost:9090".to_string(),
        classifier_api_key: "test-key".to_string(),
        classifier_timeout: Duration::from_secs(5),
        platform_url: "http://localhost:9091".to_string(),
        platform_token: "test-token".to_string(),
        platform_timeout: Duration::from_secs(5),
        auto_approve_at: 0.9,
        auto_reject_at: 0.3,
        publish_hour: 20,
        publish_minute: 0,
        utc_offset_minutes: 120,
        max_analysis_attempts: 3,
        max_publish_attempts: 3,
        backoff_base: Duration::from_millis(1),
        backoff_cap: Duration::from_millis(2),
        batch_concurrency: 4,
        check_interval: Duration::from_millis(10),
        scheduler_state_path: "scheduler_state.json".to_string(),
        feedback_log_path: "feedback.jsonl".to_string(),
    }
}
