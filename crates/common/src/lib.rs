//! DraftForge Common Library
//!
//! Shared code for the gateway and the three stage workers including:
//! - Database models and repository patterns
//! - Draft state machine and pipeline document types
//! - Stage queue client and typed job payloads
//! - Research, scraper, and text-generation provider clients
//! - SEO scoring
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod db;
pub mod documents;
pub mod drafts;
pub mod errors;
pub mod llm;
pub mod metrics;
pub mod queue;
pub mod research;
pub mod scraper;
pub mod seo;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::Repository;
pub use drafts::DraftService;
pub use errors::{AppError, Result};
pub use llm::TextGenerator;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default text-generation model
pub const DEFAULT_LLM_MODEL: &str = "gemini-3-pro-preview";

/// Number of top organic results whose pages are scraped for headings
pub const COMPETITOR_SCRAPE_COUNT: usize = 3;
