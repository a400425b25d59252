//! DraftForge Outline Worker
//!
//! Consumes the outline queue:
//! 1. Receives an outline job (draft id + keyword + strategy)
//! 2. Asks the LLM for a structured outline
//! 3. Persists the outline; the draft stays OUTLINE_PENDING awaiting
//!    manual approval

mod processor;

use crate::processor::OutlineProcessor;
use draftforge_common::{
    config::{AppConfig, QueueConfig},
    db::{DbPool, Repository},
    drafts::DraftService,
    llm::{create_generator, LlmService},
    metrics,
    queue::{OutlineJob, Queue, Stage, StageQueues},
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

    info!("Starting DraftForge Outline Worker v{}", VERSION);

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
    let outline_queue = queues.outline.clone();
    let drafts = DraftService::new(Repository::new(db), queues);
    let llm = LlmService::new(create_generator(&config.llm));

    let processor = OutlineProcessor::new(drafts, llm);

    let renewal = QueueConfig::renewal_interval(config.queue.outline_lease_secs);

    info!("Outline worker ready, starting queue polling...");

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
            result = outline_queue.receive() => {
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

                let job: OutlineJob = match Queue::parse_message(&message) {
                    Ok(job) => job,
                    Err(e) => {
                        // Schema mismatch: leave the message for the redrive
                        // policy to dead-letter after its receive count
                        error!(error = %e, "Rejected malformed outline job payload");
                        continue;
                    }
                };

                info!(draft_id = %job.draft_id, keyword = %job.keyword, "Received outline job");

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
                                if let Err(e) = outline_queue.renew_lease(&receipt_handle).await {
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
                            Stage::Outline.name(),
                            started.elapsed().as_secs_f64(),
                            "success",
                        );
                        // Delete message on success
                        if let Err(e) = outline_queue.delete(&receipt_handle).await {
                            error!(error = %e, "Failed to delete message");
                        }
                    }
                    Err(e) => {
                        consecutive_failures += 1;
                        metrics::record_stage_job(
                            Stage::Outline.name(),
                            started.elapsed().as_secs_f64(),
                            "error",
                        );
                        error!(
                            draft_id = %job.draft_id,
                            error = %e,
                            failures = consecutive_failures,
                            "Failed to process outline job"
                        );
                        // Message will be re-delivered or moved to DLQ
                    }
                }
            }
        }
    }

    info!("Outline worker shutting down");
    Ok(())
}
