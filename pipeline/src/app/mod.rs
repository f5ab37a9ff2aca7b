//! Application services
//!
//! Services orchestrate the domain ports: moderation (intake and
//! automated analysis), review (human decisions), publishing (batch
//! delivery with retries) and the daily scheduler that drives it.

pub mod moderation_service;
pub mod publisher;
pub mod review_service;
pub mod scheduler;

pub use moderation_service::ModerationService;
pub use publisher::Publisher;
pub use review_service::ReviewService;
pub use scheduler::PublishScheduler;

use std::time::Duration;

use rand::Rng;

/// Exponential backoff with jitter. `attempt` is zero-based; the delay
/// doubles per attempt and gets up to 20% random jitter, with `cap` as
/// the hard ceiling.
pub(crate) fn backoff_delay(base: Duration, cap: Duration, attempt: u32) -> Duration {
    let exp = base.saturating_mul(2u32.saturating_pow(attempt));
    let jitter = rand::thread_rng().gen_range(0.0..0.2);
    exp.mul_f64(1.0 + jitter).min(cap)
}
