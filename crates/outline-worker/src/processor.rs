//! Outline processor
//!
//! Core logic for the outline stage: one structured LLM call conditioned on
//! the strategy, persisted verbatim on the draft. Status is untouched; the
//! draft stays OUTLINE_PENDING until a human approves the outline.

use draftforge_common::db::models::DraftStatus;
use draftforge_common::drafts::DraftService;
use draftforge_common::errors::{AppError, Result};
use draftforge_common::llm::LlmService;
use draftforge_common::metrics;
use draftforge_common::queue::OutlineJob;
use tracing::{info, instrument, warn};

/// Outline stage processor
pub struct OutlineProcessor {
    drafts: DraftService,
    llm: LlmService,
}

impl OutlineProcessor {
    pub fn new(drafts: DraftService, llm: LlmService) -> Self {
        Self { drafts, llm }
    }

    /// Process one outline job.
    ///
    /// A malformed model response fails the attempt so the queue retries it;
    /// the draft keeps whatever outline it had (normally none).
    #[instrument(skip(self, job), fields(draft_id = %job.draft_id, keyword = %job.keyword))]
    pub async fn process_job(&self, job: OutlineJob) -> Result<()> {
        info!("Processing outline generation");

        // The outline stage changes no status; guard instead on the draft
        // still awaiting its outline so a stale duplicate job is a no-op.
        let draft = self
            .drafts
            .repository()
            .find_draft_by_id(job.draft_id)
            .await?
            .ok_or_else(|| AppError::DraftNotFound {
                id: job.draft_id.to_string(),
            })?;
        if draft.draft_status() != DraftStatus::OutlinePending {
            warn!(
                status = %draft.status,
                "Draft is not awaiting an outline, skipping job"
            );
            return Ok(());
        }

        let started = std::time::Instant::now();
        let outline = self
            .llm
            .generate_outline(
                &job.keyword,
                &job.strategy.target_format,
                &job.strategy.information_gain_angle,
                &job.strategy.serp.people_also_ask,
            )
            .await;
        metrics::record_generation("outline", started.elapsed().as_secs_f64(), outline.is_ok());
        let outline = outline?;

        // Persist the parsed outline verbatim; approval is a separate,
        // human-triggered step
        self.drafts.save_outline(job.draft_id, &outline).await?;

        info!(
            title = %outline.title,
            sections = outline.sections.len(),
            "Outline generated"
        );
        Ok(())
    }
}
