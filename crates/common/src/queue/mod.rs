//! SQS Queue integration for the stage pipeline
//!
//! Provides:
//! - SQS client wrapper (send, receive, delete, lease renewal)
//! - Typed stage job payloads with serialization
//! - The three-queue bundle injected wherever jobs are enqueued
//!
//! Each stage queue is durable and at-least-once: a job that errors is
//! simply not deleted, reappears after its visibility timeout, and is
//! dead-lettered by the redrive policy once the receive count is exhausted.

use crate::config::AppConfig;
use crate::documents::{ArticleOutline, StrategyDocument};
use crate::errors::{AppError, Result};
use aws_sdk_sqs::types::Message;
use aws_sdk_sqs::Client as SqsClient;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Pipeline stage identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Strategy,
    Outline,
    Content,
}

impl Stage {
    /// Stable name used for queue naming, logging, and metric labels
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Strategy => "strategy",
            Stage::Outline => "outline",
            Stage::Content => "content",
        }
    }
}

/// Per-queue runtime configuration
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Queue URL
    pub url: String,
    /// Dead letter queue URL (optional)
    pub dlq_url: Option<String>,
    /// Maximum receive count before moving to DLQ
    pub max_receive_count: u32,
    /// Visibility timeout in seconds (the stage's processing lease)
    pub visibility_timeout: i32,
    /// Wait time for long polling (seconds)
    pub wait_time_seconds: i32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            dlq_url: None,
            max_receive_count: 3,
            visibility_timeout: 300,
            wait_time_seconds: 20,
        }
    }
}

/// SQS Queue client wrapper
pub struct Queue {
    client: SqsClient,
    config: QueueConfig,
}

impl Queue {
    /// Create a new queue client
    pub async fn new(config: QueueConfig) -> Result<Self> {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = SqsClient::new(&aws_config);

        Ok(Self { client, config })
    }

    /// Create with existing AWS config
    pub fn with_client(client: SqsClient, config: QueueConfig) -> Self {
        Self { client, config }
    }

    /// The stage lease this queue was configured with
    pub fn lease_secs(&self) -> i32 {
        self.config.visibility_timeout
    }

    /// Send a message to the queue
    pub async fn send<T: Serialize>(&self, message: &T) -> Result<String> {
        let body = serde_json::to_string(message).map_err(|e| AppError::QueueError {
            message: format!("Failed to serialize message: {}", e),
        })?;

        let result = self
            .client
            .send_message()
            .queue_url(&self.config.url)
            .message_body(&body)
            .send()
            .await
            .map_err(|e| AppError::QueueError {
                message: format!("Failed to send message: {}", e),
            })?;

        let message_id = result.message_id.unwrap_or_default();
        debug!(message_id = %message_id, "Message sent to queue");

        Ok(message_id)
    }

    /// Receive at most one message from the queue.
    ///
    /// A worker claims one job at a time; the stage lease starts on receipt.
    pub async fn receive(&self) -> Result<Option<Message>> {
        let result = self
            .client
            .receive_message()
            .queue_url(&self.config.url)
            .max_number_of_messages(1)
            .visibility_timeout(self.config.visibility_timeout)
            .wait_time_seconds(self.config.wait_time_seconds)
            .send()
            .await
            .map_err(|e| AppError::QueueError {
                message: format!("Failed to receive messages: {}", e),
            })?;

        let mut messages = result.messages.unwrap_or_default();
        debug!(count = messages.len(), "Received messages from queue");

        Ok(messages.pop())
    }

    /// Delete a message after processing
    pub async fn delete(&self, receipt_handle: &str) -> Result<()> {
        self.client
            .delete_message()
            .queue_url(&self.config.url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| AppError::QueueError {
                message: format!("Failed to delete message: {}", e),
            })?;

        debug!("Message deleted from queue");
        Ok(())
    }

    /// Renew the processing lease on a message.
    ///
    /// Called periodically by the worker while a job is still running;
    /// a crashed worker stops renewing and the job becomes reclaimable.
    pub async fn renew_lease(&self, receipt_handle: &str) -> Result<()> {
        self.client
            .change_message_visibility()
            .queue_url(&self.config.url)
            .receipt_handle(receipt_handle)
            .visibility_timeout(self.config.visibility_timeout)
            .send()
            .await
            .map_err(|e| AppError::QueueError {
                message: format!("Failed to renew lease: {}", e),
            })?;

        debug!(
            lease_secs = self.config.visibility_timeout,
            "Message lease renewed"
        );
        Ok(())
    }

    /// Parse message body as JSON
    pub fn parse_message<T: DeserializeOwned>(message: &Message) -> Result<T> {
        let body = message.body.as_ref().ok_or_else(|| AppError::QueueError {
            message: "Message has no body".to_string(),
        })?;

        serde_json::from_str(body).map_err(|e| AppError::QueueError {
            message: format!("Failed to parse message: {}", e),
        })
    }
}

/// The three stage queues, constructed once at startup and injected
#[derive(Clone)]
pub struct StageQueues {
    pub strategy: Arc<Queue>,
    pub outline: Arc<Queue>,
    pub content: Arc<Queue>,
}

impl StageQueues {
    /// Build all three queues from application configuration.
    ///
    /// Fails when any stage queue URL is missing: the pipeline cannot run
    /// partially wired.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = SqsClient::new(&aws_config);

        let queue_for = |stage: Stage, url: Option<&String>, lease_secs: u64| -> Result<Queue> {
            let url = url.cloned().ok_or_else(|| AppError::Configuration {
                message: format!("{} queue URL not configured", stage.name()),
            })?;
            Ok(Queue::with_client(
                client.clone(),
                QueueConfig {
                    url,
                    dlq_url: config.queue.dlq_url.clone(),
                    max_receive_count: config.queue.max_receive_count,
                    visibility_timeout: lease_secs as i32,
                    wait_time_seconds: config.queue.poll_timeout_secs as i32,
                },
            ))
        };

        Ok(Self {
            strategy: Arc::new(queue_for(
                Stage::Strategy,
                config.queue.strategy_queue_url.as_ref(),
                config.queue.strategy_lease_secs,
            )?),
            outline: Arc::new(queue_for(
                Stage::Outline,
                config.queue.outline_queue_url.as_ref(),
                config.queue.outline_lease_secs,
            )?),
            content: Arc::new(queue_for(
                Stage::Content,
                config.queue.content_queue_url.as_ref(),
                config.queue.content_lease_secs,
            )?),
        })
    }
}

/// Strategy job message: kicks off research + gap analysis for a draft
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyJob {
    pub draft_id: Uuid,
    pub keyword: String,
}

/// Outline job message: carries the persisted strategy into outline generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineJob {
    pub draft_id: Uuid,
    pub keyword: String,
    pub strategy: StrategyDocument,
}

/// Content job message: carries the approved outline into section generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentJob {
    pub draft_id: Uuid,
    pub outline: ArticleOutline,
    pub strategy: StrategyDocument,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::SerpSnapshot;

    fn sample_strategy() -> StrategyDocument {
        StrategyDocument {
            target_format: "Listicle".to_string(),
            information_gain_angle: "Budget picks tested in rain".to_string(),
            competitor_headings: vec!["Top Picks".to_string()],
            recommended_approach: "Rank by durability".to_string(),
            serp: SerpSnapshot::default(),
        }
    }

    #[test]
    fn test_strategy_job_serialization() {
        let msg = StrategyJob {
            draft_id: Uuid::new_v4(),
            keyword: "best hiking boots".to_string(),
        };

        let json = serde_json::to_string(&msg).unwrap();
        let parsed: StrategyJob = serde_json::from_str(&json).unwrap();

        assert_eq!(msg.draft_id, parsed.draft_id);
        assert_eq!(msg.keyword, parsed.keyword);
    }

    #[test]
    fn test_content_job_serialization() {
        let msg = ContentJob {
            draft_id: Uuid::new_v4(),
            outline: ArticleOutline {
                title: "Best Hiking Boots".to_string(),
                sections: vec![],
            },
            strategy: sample_strategy(),
        };

        let json = serde_json::to_string(&msg).unwrap();
        let parsed: ContentJob = serde_json::from_str(&json).unwrap();

        assert_eq!(msg.draft_id, parsed.draft_id);
        assert_eq!(parsed.outline.title, "Best Hiking Boots");
        assert_eq!(parsed.strategy.target_format, "Listicle");
    }

    #[test]
    fn test_malformed_payload_is_rejected() {
        let message = Message::builder().body("{\"draft_id\": 42}").build();
        let parsed: Result<StrategyJob> = Queue::parse_message(&message);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Strategy.name(), "strategy");
        assert_eq!(Stage::Outline.name(), "outline");
        assert_eq!(Stage::Content.name(), "content");
    }
}
