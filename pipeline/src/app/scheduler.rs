//! Publish scheduler
//!
//! Fires one publish batch per local day at the configured time. The
//! last completed run date is persisted to a small JSON state file that
//! is only written after the batch finishes, so a crash mid-run means
//! the next startup runs again; item states make the re-run idempotent.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::domain::entities::{Item, ItemState};
use crate::domain::ports::{ItemStore, Page, PlatformClient};
use crate::error::{ConfigError, DomainError};

use super::publisher::{BatchReport, Publisher};

const COLLECT_PAGE_SIZE: usize = 100;

/// Persisted scheduler state
#[derive(Debug, Default, Serialize, Deserialize)]
struct SchedulerState {
    last_run: Option<NaiveDate>,
}

pub struct PublishScheduler<S: ItemStore, P: PlatformClient> {
    store: Arc<S>,
    publisher: Arc<Publisher<S, P>>,
    offset: FixedOffset,
    due_at: NaiveTime,
    check_interval: Duration,
    state_path: PathBuf,
}

impl<S: ItemStore + 'static, P: PlatformClient + 'static> PublishScheduler<S, P> {
    pub fn new(
        store: Arc<S>,
        publisher: Arc<Publisher<S, P>>,
        config: &Config,
    ) -> Result<Self, ConfigError> {
        let offset = FixedOffset::east_opt(config.utc_offset_minutes * 60).ok_or_else(|| {
            ConfigError::InvalidValue {
                name: "UTC_OFFSET_MINUTES".to_string(),
                message: format!("{} is not a valid offset", config.utc_offset_minutes),
            }
        })?;
        let due_at = NaiveTime::from_hms_opt(config.publish_hour, config.publish_minute, 0)
            .ok_or_else(|| ConfigError::InvalidValue {
                name: "PUBLISH_HOUR/PUBLISH_MINUTE".to_string(),
                message: format!(
                    "{}:{:02} is not a valid time of day",
                    config.publish_hour, config.publish_minute
                ),
            })?;
        Ok(Self {
            store,
            publisher,
            offset,
            due_at,
            check_interval: config.check_interval,
            state_path: PathBuf::from(&config.scheduler_state_path),
        })
    }

    /// Run the daily batch if it is due and has not run today. Returns
    /// the batch report when a run happened. The run date is recorded
    /// only after the batch completes uncancelled.
    pub async fn run_due(
        &self,
        now: DateTime<Utc>,
        cancel: &AtomicBool,
    ) -> Result<Option<BatchReport>, DomainError> {
        let local = now.with_timezone(&self.offset);
        let today = local.date_naive();

        let state = self.load_state().await;
        if state.last_run == Some(today) {
            return Ok(None);
        }
        if local.time() < self.due_at {
            return Ok(None);
        }

        info!(date = %today, "Daily publish run starting");
        let report = self.run_batch(cancel).await?;
        if !report.cancelled {
            self.save_state(&SchedulerState {
                last_run: Some(today),
            })
            .await;
        }
        Ok(Some(report))
    }

    /// Run a publish batch immediately, outside the daily schedule. Does
    /// not record a daily run, so the scheduled run still happens.
    pub async fn trigger_now(&self, cancel: &AtomicBool) -> Result<BatchReport, DomainError> {
        info!("Manual publish run triggered");
        self.run_batch(cancel).await
    }

    /// Scan loop driving the schedule. Checks for a due run every
    /// `check_interval` until cancelled; a missed tick is picked up on
    /// the next check, including the first one after startup.
    pub async fn run_loop(&self, cancel: Arc<AtomicBool>) {
        while !cancel.load(Ordering::SeqCst) {
            if let Err(err) = self.run_due(Utc::now(), &cancel).await {
                error!(error = %err, "Scheduled publish run failed");
            }
            tokio::time::sleep(self.check_interval).await;
        }
        info!("Scheduler loop stopped");
    }

    async fn run_batch(&self, cancel: &AtomicBool) -> Result<BatchReport, DomainError> {
        let items = self.collect_publishable().await?;
        if items.is_empty() {
            info!("No publishable items");
            return Ok(BatchReport::default());
        }
        Ok(self.publisher.clone().publish_batch(items, cancel).await)
    }

    /// Collect everything the next batch should deliver: approved items
    /// plus failed ones still worth retrying, oldest first.
    async fn collect_publishable(&self) -> Result<Vec<Item>, DomainError> {
        let states = [ItemState::Approved, ItemState::PublishFailed];
        let mut items = Vec::new();
        let mut offset = 0;
        loop {
            let page = self
                .store
                .query(&states, Page::new(COLLECT_PAGE_SIZE, offset))
                .await?;
            let done = page.len() < COLLECT_PAGE_SIZE;
            offset += page.len();
            items.extend(page.into_iter().filter(Item::is_publishable));
            if done {
                break;
            }
        }
        Ok(items)
    }

    async fn load_state(&self) -> SchedulerState {
        match tokio::fs::read_to_string(&self.state_path).await {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(state) => state,
                Err(err) => {
                    warn!(path = %self.state_path.display(), error = %err, "Corrupt scheduler state, starting fresh");
                    SchedulerState::default()
                }
            },
            Err(_) => SchedulerState::default(),
        }
    }

    async fn save_state(&self, state: &SchedulerState) {
        if let Some(parent) = self.state_path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(err) = tokio::fs::create_dir_all(parent).await {
                    error!(path = %parent.display(), error = %err, "Failed to create state directory");
                    return;
                }
            }
        }
        let raw = match serde_json::to_string_pretty(state) {
            Ok(raw) => raw,
            Err(err) => {
                error!(error = %err, "Failed to serialize scheduler state");
                return;
            }
        };
        if let Err(err) = tokio::fs::write(&self.state_path, raw).await {
            error!(path = %self.state_path.display(), error = %err, "Failed to persist scheduler state");
        }
    }
}
