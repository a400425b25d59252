//! Configuration management for DraftForge services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Stage queue configuration (SQS)
    pub queue: QueueConfig,

    /// Research provider configuration
    pub research: ResearchConfig,

    /// Text generation (LLM) configuration
    pub llm: LlmConfig,

    /// Competitor heading scraper configuration
    pub scraper: ScraperConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Primary database URL (for writes)
    pub url: String,

    /// Read replica URL (optional, falls back to primary)
    pub read_url: Option<String>,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// SQS strategy queue URL
    pub strategy_queue_url: Option<String>,

    /// SQS outline queue URL
    pub outline_queue_url: Option<String>,

    /// SQS content queue URL
    pub content_queue_url: Option<String>,

    /// Dead letter queue URL
    pub dlq_url: Option<String>,

    /// Long polling timeout in seconds
    #[serde(default = "default_queue_poll_timeout")]
    pub poll_timeout_secs: u64,

    /// Strategy stage processing lease in seconds (SERP + scrape + gap analysis)
    #[serde(default = "default_strategy_lease")]
    pub strategy_lease_secs: u64,

    /// Outline stage processing lease in seconds (single LLM call)
    #[serde(default = "default_outline_lease")]
    pub outline_lease_secs: u64,

    /// Content stage processing lease in seconds (one LLM call per section)
    #[serde(default = "default_content_lease")]
    pub content_lease_secs: u64,

    /// Maximum receive count before a job is dead-lettered
    #[serde(default = "default_max_receive_count")]
    pub max_receive_count: u32,
}

impl QueueConfig {
    /// Lease renewal interval for a stage: half the lease duration
    pub fn renewal_interval(lease_secs: u64) -> Duration {
        Duration::from_secs(lease_secs / 2)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResearchConfig {
    /// Provider API base URL
    #[serde(default = "default_research_base_url")]
    pub base_url: String,

    /// Basic auth token (base64 of login:password)
    pub auth_token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_research_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries for SERP fetches
    #[serde(default = "default_research_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// API key for the text-generation service
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Model to use
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries
    #[serde(default = "default_llm_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    /// Per-page fetch timeout in seconds
    #[serde(default = "default_scrape_timeout")]
    pub timeout_secs: u64,

    /// Fan-out width for concurrent page fetches
    #[serde(default = "default_scrape_concurrency")]
    pub max_concurrency: usize,

    /// User agent sent with page fetches
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 30 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_max_connections() -> u32 { 50 }
fn default_min_connections() -> u32 { 5 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_queue_poll_timeout() -> u64 { 20 }
fn default_strategy_lease() -> u64 { 600 }
fn default_outline_lease() -> u64 { 300 }
fn default_content_lease() -> u64 { 900 }
fn default_max_receive_count() -> u32 { 3 }
fn default_research_base_url() -> String { "https://api.dataforseo.com/v3".to_string() }
fn default_research_timeout() -> u64 { 60 }
fn default_research_retries() -> u32 { 3 }
fn default_llm_model() -> String { crate::DEFAULT_LLM_MODEL.to_string() }
fn default_llm_timeout() -> u64 { 120 }
fn default_llm_retries() -> u32 { 3 }
fn default_scrape_timeout() -> u64 { 30 }
fn default_scrape_concurrency() -> usize { 3 }
fn default_user_agent() -> String {
    format!("draftforge/{}", env!("CARGO_PKG_VERSION"))
}
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "draftforge".to_string() }
fn default_rate_limit() -> u32 { 50 }
fn default_burst() -> u32 { 100 }
fn default_enabled() -> bool { true }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__QUEUE__STRATEGY_QUEUE_URL=...
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }

    /// Get the read database URL (falls back to primary)
    pub fn read_database_url(&self) -> &str {
        self.database.read_url.as_deref().unwrap_or(&self.database.url)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                request_timeout_secs: default_request_timeout(),
                shutdown_timeout_secs: default_shutdown_timeout(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/draftforge".to_string(),
                read_url: None,
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connect_timeout_secs: default_connect_timeout(),
                idle_timeout_secs: default_idle_timeout(),
            },
            queue: QueueConfig {
                strategy_queue_url: None,
                outline_queue_url: None,
                content_queue_url: None,
                dlq_url: None,
                poll_timeout_secs: default_queue_poll_timeout(),
                strategy_lease_secs: default_strategy_lease(),
                outline_lease_secs: default_outline_lease(),
                content_lease_secs: default_content_lease(),
                max_receive_count: default_max_receive_count(),
            },
            research: ResearchConfig {
                base_url: default_research_base_url(),
                auth_token: None,
                timeout_secs: default_research_timeout(),
                max_retries: default_research_retries(),
            },
            llm: LlmConfig {
                api_key: None,
                api_base: None,
                model: default_llm_model(),
                timeout_secs: default_llm_timeout(),
                max_retries: default_llm_retries(),
            },
            scraper: ScraperConfig {
                timeout_secs: default_scrape_timeout(),
                max_concurrency: default_scrape_concurrency(),
                user_agent: default_user_agent(),
            },
            observability: ObservabilityConfig {
                log_level: default_log_level(),
                json_logging: default_json_logging(),
                metrics_port: default_metrics_port(),
                service_name: default_service_name(),
            },
            rate_limit: RateLimitConfig {
                requests_per_second: default_rate_limit(),
                burst: default_burst(),
                enabled: default_enabled(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.llm.model, crate::DEFAULT_LLM_MODEL);
    }

    #[test]
    fn test_read_database_fallback() {
        let config = AppConfig::default();
        assert_eq!(config.read_database_url(), "postgres://localhost/draftforge");
    }

    #[test]
    fn test_stage_lease_budgets() {
        // Lease/renewal budgets track each stage's expected external latency
        let config = AppConfig::default();
        assert_eq!(config.queue.strategy_lease_secs, 600);
        assert_eq!(config.queue.outline_lease_secs, 300);
        assert_eq!(config.queue.content_lease_secs, 900);
        assert_eq!(
            QueueConfig::renewal_interval(config.queue.content_lease_secs),
            Duration::from_secs(450)
        );
    }
}
