//! Worker configuration
//!
//! All knobs come from the environment (plus `.env` in development) and are
//! validated once at startup. Invalid values refuse to start the process.

use std::env;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Clone)]
pub struct Config {
    /// Base URL of the content-classification service
    pub classifier_url: String,
    pub classifier_api_key: String,
    pub classifier_timeout: Duration,

    /// Base URL of the publishing platform
    pub platform_url: String,
    pub platform_token: String,
    pub platform_timeout: Duration,

    /// Confidence at or above which items are auto-approved
    pub auto_approve_at: f64,
    /// Confidence at or below which items are auto-rejected
    pub auto_reject_at: f64,

    /// Local time-of-day for the daily publish run
    pub publish_hour: u32,
    pub publish_minute: u32,
    /// Fixed UTC offset of the publish schedule, in minutes
    pub utc_offset_minutes: i32,

    pub max_analysis_attempts: u32,
    pub max_publish_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,

    /// Concurrent publish calls within one batch
    pub batch_concurrency: usize,

    /// How often the worker scans for new submissions and due runs
    pub check_interval: Duration,

    /// Where the scheduler records its last completed run date
    pub scheduler_state_path: String,
    /// Where manual-correction feedback records are appended
    pub feedback_log_path: String,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: std::str::FromStr>(name: &str, default: &str) -> Result<T, ConfigError> {
    var_or(name, default)
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            message: "could not be parsed".to_string(),
        })
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Self {
            classifier_url: var_or("CLASSIFIER_URL", "http://localhost:9090"),
            classifier_api_key: env::var("CLASSIFIER_API_KEY")
                .map_err(|_| ConfigError::MissingVar("CLASSIFIER_API_KEY".to_string()))?,
            classifier_timeout: Duration::from_secs(parse_var("CLASSIFIER_TIMEOUT_SECS", "15")?),
            platform_url: var_or("PLATFORM_URL", "http://localhost:9091"),
            platform_token: env::var("PLATFORM_TOKEN")
                .map_err(|_| ConfigError::MissingVar("PLATFORM_TOKEN".to_string()))?,
            platform_timeout: Duration::from_secs(parse_var("PLATFORM_TIMEOUT_SECS", "30")?),
            auto_approve_at: parse_var("AUTO_APPROVE_AT", "0.9")?,
            auto_reject_at: parse_var("AUTO_REJECT_AT", "0.3")?,
            publish_hour: parse_var("PUBLISH_HOUR", "20")?,
            publish_minute: parse_var("PUBLISH_MINUTE", "0")?,
            utc_offset_minutes: parse_var("UTC_OFFSET_MINUTES", "0")?,
            max_analysis_attempts: parse_var("MAX_ANALYSIS_ATTEMPTS", "3")?,
            max_publish_attempts: parse_var("MAX_PUBLISH_ATTEMPTS", "3")?,
            backoff_base: Duration::from_millis(parse_var("BACKOFF_BASE_MS", "500")?),
            backoff_cap: Duration::from_millis(parse_var("BACKOFF_CAP_MS", "30000")?),
            batch_concurrency: parse_var("BATCH_CONCURRENCY", "4")?,
            check_interval: Duration::from_secs(parse_var("CHECK_INTERVAL_SECS", "60")?),
            scheduler_state_path: var_or("SCHEDULER_STATE_PATH", "data/scheduler_state.json"),
            feedback_log_path: var_or("FEEDBACK_LOG_PATH", "data/feedback.jsonl"),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the pipeline cannot run safely with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("AUTO_APPROVE_AT", self.auto_approve_at),
            ("AUTO_REJECT_AT", self.auto_reject_at),
        ] {
            if !(0.0..=1.0).contains(&value) || value.is_nan() {
                return Err(ConfigError::InvalidValue {
                    name: name.to_string(),
                    message: format!("{} is outside [0, 1]", value),
                });
            }
        }

        // Equal thresholds are allowed (empty review band); inverted are not.
        if self.auto_reject_at > self.auto_approve_at {
            return Err(ConfigError::InvertedThresholds {
                reject: self.auto_reject_at,
                approve: self.auto_approve_at,
            });
        }

        if self.publish_hour >= 24 || self.publish_minute >= 60 {
            return Err(ConfigError::InvalidValue {
                name: "PUBLISH_HOUR/PUBLISH_MINUTE".to_string(),
                message: format!(
                    "{}:{:02} is not a valid time of day",
                    self.publish_hour, self.publish_minute
                ),
            });
        }

        if self.utc_offset_minutes.abs() > 14 * 60 {
            return Err(ConfigError::InvalidValue {
                name: "UTC_OFFSET_MINUTES".to_string(),
                message: format!("{} is outside +/-14 hours", self.utc_offset_minutes),
            });
        }

        if self.batch_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                name: "BATCH_CONCURRENCY".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if self.max_analysis_attempts == 0 || self.max_publish_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                name: "MAX_ANALYSIS_ATTEMPTS/MAX_PUBLISH_ATTEMPTS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            classifier_url: "http://localhost:9090".to_string(),
            classifier_api_key: "test-key".to_string(),
            classifier_timeout: Duration::from_secs(15),
            platform_url: "http://localhost:9091".to_string(),
            platform_token: "test-token".to_string(),
            platform_timeout: Duration::from_secs(30),
            auto_approve_at: 0.9,
            auto_reject_at: 0.3,
            publish_hour: 20,
            publish_minute: 0,
            utc_offset_minutes: 120,
            max_analysis_attempts: 3,
            max_publish_attempts: 3,
            backoff_base: Duration::from_millis(500),
            backoff_cap: Duration::from_secs(30),
            batch_concurrency: 4,
            check_interval: Duration::from_secs(60),
            scheduler_state_path: "data/scheduler_state.json".to_string(),
            feedback_log_path: "data/feedback.jsonl".to_string(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn equal_thresholds_are_allowed() {
        let mut config = base_config();
        config.auto_approve_at = 0.5;
        config.auto_reject_at = 0.5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn inverted_thresholds_are_fatal() {
        let mut config = base_config();
        config.auto_approve_at = 0.3;
        config.auto_reject_at = 0.9;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedThresholds { .. })
        ));
    }

    #[test]
    fn threshold_outside_unit_interval_is_fatal() {
        let mut config = base_config();
        config.auto_approve_at = 1.2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn invalid_publish_time_is_fatal() {
        let mut config = base_config();
        config.publish_hour = 24;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_concurrency_is_fatal() {
        let mut config = base_config();
        config.batch_concurrency = 0;
        assert!(config.validate().is_err());
    }
}
