//! DraftForge Strategy Worker
//!
//! Consumes the strategy queue:
//! 1. Receives a strategy job (draft id + seed keyword)
//! 2. Fetches SERP data and scrapes top-competitor headings
//! 3. Runs the LLM gap analysis
//! 4. Persists the strategy document, which enqueues the outline job
//!
//! The processing lease is renewed on a half-lease timer while a job runs;
//! a crashed worker stops renewing and the job becomes reclaimable.

mod processor;

use crate::processor::StrategyProcessor;
use draftforge_common::{
    config::{AppConfig, QueueConfig},
    db::{DbPool, Repository},
    drafts::DraftService,
    llm::{create_generator, LlmService},
    metrics,
    queue::{Queue, StageQueues, Stage, StrategyJob},
    research::ResearchClient,
    scraper::HeadingScraper,
    VERSION,
};
use std::sync::Arc;
use tracing::{error, info, warn, Level};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(true)
        .json()
        .init();

    info!("Starting DraftForge Strategy Worker v{}", VERSION);

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        e
    })?;
    let config = Arc::new(config);

    // Initialize metrics
    metrics::register_metrics();
    if config.observability.metrics_port > 0 {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], config.observability.metrics_port))
            .install()?;
    }

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;

    // Initialize queues and clients
    let queues = StageQueues::from_config(&config).await?;
    let strategy_queue = queues.strategy.clone();
    let drafts = DraftService::new(Repository::new(db), queues);
    let research = Arc::new(ResearchClient::new(&config.research)?);
    let scraper = Arc::new(HeadingScraper::new(&config.scraper)?);
    let llm = LlmService::new(create_generator(&config.llm));

    let processor = StrategyProcessor::new(drafts, research, scraper, llm);

    let renewal = QueueConfig::renewal_interval(config.queue.strategy_lease_secs);

    info!("Strategy worker ready, starting queue polling...");

    // Circuit breaker state
    let mut consecutive_failures = 0;
    const MAX_FAILURES: u32 = 5;
    const CIRCUIT_BREAK_DURATION: std::time::Duration = std::time::Duration::from_secs(30);

    // Start polling loop
    loop {
        // Circuit breaker check
        if consecutive_failures >= MAX_FAILURES {
            warn!(
                failures = consecutive_failures,
                "Circuit breaker open, pausing..."
            );
            tokio::time::sleep(CIRCUIT_BREAK_DURATION).await;
            consecutive_failures = 0;
            info!("Circuit breaker reset, resuming...");
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            result = strategy_queue.receive() => {
                let message = match result {
                    Ok(Some(message)) => message,
                    Ok(None) => continue,
                    Err(e) => {
                        consecutive_failures += 1;
                        error!(error = %e, "Failed to receive messages from queue");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                let receipt_handle = message.receipt_handle.clone().unwrap_or_default();

                let job: StrategyJob = match Queue::parse_message(&message) {
                    Ok(job) => job,
                    Err(e) => {
                        // Schema mismatch: leave the message for the redrive
                        // policy to dead-letter after its receive count
                        error!(error = %e, "Rejected malformed strategy job payload");
                        continue;
                    }
                };

                info!(draft_id = %job.draft_id, keyword = %job.keyword, "Received strategy job");

                let started = std::time::Instant::now();
                let outcome = {
                    let process = processor.process_job(job.clone());
                    tokio::pin!(process);

                    let mut renew = tokio::time::interval(renewal);
                    renew.tick().await; // first tick completes immediately

                    loop {
                        tokio::select! {
                            res = &mut process => break res,
                            _ = renew.tick() => {
                                if let Err(e) = strategy_queue.renew_lease(&receipt_handle).await {
                                    warn!(error = %e, "Failed to renew job lease");
                                }
                            }
                        }
                    }
                };

                match outcome {
                    Ok(()) => {
                        consecutive_failures = 0;
                        metrics::record_stage_job(
                            Stage::Strategy.name(),
                            started.elapsed().as_secs_f64(),
                            "success",
                        );
                        // Delete message on success
                        if let Err(e) = strategy_queue.delete(&receipt_handle).await {
                            error!(error = %e, "Failed to delete message");
                        }
                    }
                    Err(e) => {
                        consecutive_failures += 1;
                        metrics::record_stage_job(
                            Stage::Strategy.name(),
                            started.elapsed().as_secs_f64(),
                            "error",
                        );
                        error!(
                            draft_id = %job.draft_id,
                            error = %e,
                            failures = consecutive_failures,
                            "Failed to process strategy job"
                        );
                        // Message will be re-delivered or moved to DLQ
                    }
                }
            }
        }
    }

    info!("Strategy worker shutting down");
    Ok(())
}
