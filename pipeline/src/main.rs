//! Spotter pipeline worker
//!
//! Moderation and publishing pipeline for user-submitted content. New
//! submissions are analyzed by an external classifier and auto-approved,
//! auto-rejected, or queued for human review; approved items are posted
//! to the publishing platform once per day by the scheduler.
//!
//! Uses hexagonal (ports & adapters) architecture: services orchestrate
//! port traits, adapters supply the store and the HTTP clients. The
//! worker runs an intake scan loop, the publish scheduler, and an
//! operator console on stdin for review decisions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

mod adapters;
mod app;
mod config;
mod domain;
mod error;

#[cfg(test)]
mod test_utils;


use adapters::{HttpClassifierClient, HttpPlatformClient, InMemoryItemStore, JsonlFeedbackSink};
use app::{ModerationService, PublishScheduler, Publisher, ReviewService};
use config::Config;
use domain::entities::{ItemId, ReviewVerdict};
use domain::ports::Page;

const INTAKE_BATCH: usize = 50;

type Moderation = ModerationService<InMemoryItemStore, HttpClassifierClient>;
type Review = ReviewService<InMemoryItemStore, JsonlFeedbackSink>;
type Scheduler = PublishScheduler<InMemoryItemStore, HttpPlatformClient>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,spotter_pipeline=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting spotter pipeline worker...");

    let config = Config::from_env().context("invalid configuration")?;

    // Create adapters
    let store = Arc::new(InMemoryItemStore::new());
    let classifier = Arc::new(
        HttpClassifierClient::new(
            config.classifier_url.clone(),
            config.classifier_api_key.clone(),
            config.classifier_timeout,
        )
        .context("failed to build classifier client")?,
    );
    let platform = Arc::new(
        HttpPlatformClient::new(
            config.platform_url.clone(),
            config.platform_token.clone(),
            config.platform_timeout,
        )
        .context("failed to build platform client")?,
    );
    let feedback = Arc::new(JsonlFeedbackSink::new(config.feedback_log_path.clone()));

    // Create application services
    let moderation = Arc::new(ModerationService::new(
        store.clone(),
        classifier.clone(),
        &config,
    ));
    let review = Arc::new(ReviewService::new(store.clone(), feedback.clone()));
    let publisher = Arc::new(Publisher::new(store.clone(), platform.clone(), &config));
    let scheduler = Arc::new(
        PublishScheduler::new(store.clone(), publisher.clone(), &config)
            .context("failed to build scheduler")?,
    );

    let cancel = Arc::new(AtomicBool::new(false));

    // Intake scan loop: claim and analyze new submissions
    let intake = {
        let moderation = moderation.clone();
        let cancel = cancel.clone();
        let interval = config.check_interval;
        tokio::spawn(async move {
            while !cancel.load(Ordering::SeqCst) {
                match moderation.drain_new(INTAKE_BATCH).await {
                    Ok(0) => {}
                    Ok(n) => tracing::debug!(processed = n, "Intake scan complete"),
                    Err(err) => tracing::error!(error = %err, "Intake scan failed"),
                }
                tokio::time::sleep(interval).await;
            }
            tracing::info!("Intake loop stopped");
        })
    };

    // Daily publish scheduler
    let schedule = {
        let scheduler = scheduler.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            scheduler.run_loop(cancel).await;
        })
    };

    console(moderation, review, scheduler, cancel.clone()).await;

    cancel.store(true, Ordering::SeqCst);
    let _ = tokio::join!(intake, schedule);
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Operator console: review decisions and manual controls on stdin.
async fn console(
    moderation: Arc<Moderation>,
    review: Arc<Review>,
    scheduler: Arc<Scheduler>,
    cancel: Arc<AtomicBool>,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("spotter pipeline console; type 'help' for commands");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        if line == "quit" || line == "exit" {
                            break;
                        }
                        handle_command(line, &moderation, &review, &scheduler, &cancel).await;
                    }
                    // stdin closed; keep the worker running on signals only
                    Ok(None) => {
                        if let Err(err) = tokio::signal::ctrl_c().await {
                            tracing::error!(error = %err, "Signal handler failed");
                        }
                        break;
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "Console read failed");
                        break;
                    }
                }
            }
        }
    }
}

async fn handle_command(
    line: &str,
    moderation: &Moderation,
    review: &Review,
    scheduler: &Scheduler,
    cancel: &AtomicBool,
) {
    let mut parts = line.splitn(2, ' ');
    let command = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default().trim();

    match command {
        "help" => {
            println!("  submit <text>          accept a new submission");
            println!("  status <id>            show one item");
            println!("  pending                list items awaiting review");
            println!("  approve <id> [note]    approve a pending item");
            println!("  reject <id> [note]     reject a pending item");
            println!("  bulk <approve|reject> <id,id,...>");
            println!("  override <id> [note]   reverse an approved item to rejected");
            println!("  publish-now            run a publish batch immediately");
            println!("  quit                   stop the worker");
        }
        "submit" => match moderation.submit(rest.to_string()).await {
            Ok(item) => println!("accepted {} ({})", item.id, item.state),
            Err(err) => println!("error: {}", err),
        },
        "status" => match parse_id(rest) {
            Ok(id) => match moderation.status(&id).await {
                Ok(item) => {
                    println!(
                        "{} state={} suggestion={:?} attempts={} ref={:?}",
                        item.id, item.state, item.suggestion, item.publish_attempts, item.external_ref
                    );
                }
                Err(err) => println!("error: {}", err),
            },
            Err(err) => println!("error: {}", err),
        },
        "pending" => match review.list_pending(Page::first(50)).await {
            Ok(items) => {
                if items.is_empty() {
                    println!("nothing pending");
                }
                for item in items {
                    println!("{} suggestion={:?} {}", item.id, item.suggestion, item.payload);
                }
            }
            Err(err) => println!("error: {}", err),
        },
        "approve" | "reject" => {
            let verdict = if command == "approve" {
                ReviewVerdict::Approve
            } else {
                ReviewVerdict::Reject
            };
            let mut args = rest.splitn(2, ' ');
            let id = args.next().unwrap_or_default();
            let note = args.next().map(|note| note.trim().to_string());
            match parse_id(id) {
                Ok(id) => match review.decide(&id, verdict, note).await {
                    Ok(item) => println!("{} -> {}", item.id, item.state),
                    Err(err) => println!("error: {}", err),
                },
                Err(err) => println!("error: {}", err),
            }
        }
        "bulk" => {
            let mut args = rest.splitn(2, ' ');
            let verdict = match args.next() {
                Some("approve") => ReviewVerdict::Approve,
                Some("reject") => ReviewVerdict::Reject,
                _ => {
                    println!("usage: bulk <approve|reject> <id,id,...>");
                    return;
                }
            };
            let raw_ids = args.next().unwrap_or_default();
            let mut ids = Vec::new();
            for raw in raw_ids.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                match parse_id(raw) {
                    Ok(id) => ids.push(id),
                    Err(err) => {
                        println!("error: {}", err);
                        return;
                    }
                }
            }
            if ids.is_empty() {
                println!("usage: bulk <approve|reject> <id,id,...>");
                return;
            }
            for outcome in review.bulk_decide(&ids, verdict, None).await {
                match outcome.outcome {
                    Ok(()) => println!("{} ok", outcome.item_id),
                    Err(err) => println!("{} error: {}", outcome.item_id, err),
                }
            }
        }
        "override" => {
            let mut args = rest.splitn(2, ' ');
            let id = args.next().unwrap_or_default();
            let note = args.next().map(|note| note.trim().to_string());
            match parse_id(id) {
                Ok(id) => match review.override_decision(&id, note).await {
                    Ok(item) => println!("{} -> {}", item.id, item.state),
                    Err(err) => println!("error: {}", err),
                },
                Err(err) => println!("error: {}", err),
            }
        }
        "publish-now" => match scheduler.trigger_now(cancel).await {
            Ok(report) => println!(
                "published={} failed={} skipped={}",
                report.published, report.failed, report.skipped
            ),
            Err(err) => println!("error: {}", err),
        },
        other => println!("unknown command '{}'; type 'help'", other),
    }
}

fn parse_id(raw: &str) -> Result<ItemId, String> {
    Uuid::parse_str(raw)
        .map(ItemId::from)
        .map_err(|_| format!("'{}' is not a valid item id", raw))
}
