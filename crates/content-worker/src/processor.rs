//! Content processor
//!
//! Core logic for the content stage: a strictly ordered chain of LLM calls
//! (introduction, each outline section, conclusion), each persisted as soon
//! as it completes so readers can watch the article grow. Sections are
//! append-only; a retried job skips orders that already exist, reusing the
//! stored bodies for continuity context, so retries converge instead of
//! duplicating.

use crate::assembler::{assemble, excerpt, plan_sections};
use draftforge_common::db::models::{DraftStatus, Section, SectionKind};
use draftforge_common::drafts::DraftService;
use draftforge_common::errors::{AppError, Result};
use draftforge_common::llm::LlmService;
use draftforge_common::metrics;
use draftforge_common::queue::ContentJob;
use draftforge_common::seo;
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// Continuity context carried between consecutive section calls
const SECTION_CONTEXT_CHARS: usize = 200;

/// Context summarizing the article so far for the conclusion call
const CONCLUSION_CONTEXT_CHARS: usize = 1000;

/// Content stage processor
pub struct ContentProcessor {
    drafts: DraftService,
    llm: LlmService,
}

impl ContentProcessor {
    pub fn new(drafts: DraftService, llm: LlmService) -> Self {
        Self { drafts, llm }
    }

    /// Process one content job.
    ///
    /// A failure mid-sequence leaves already-persisted sections intact and
    /// the draft in WRITING; the retried job resumes from the first missing
    /// order.
    #[instrument(skip(self, job), fields(draft_id = %job.draft_id))]
    pub async fn process_job(&self, job: ContentJob) -> Result<()> {
        info!(sections = job.outline.sections.len(), "Processing content generation");

        let repo = self.drafts.repository();

        // Claim the stage; WRITING means a previous attempt died partway
        // and we resume from the persisted sections
        let claimed = repo
            .try_claim_status(job.draft_id, DraftStatus::OutlineApproved, DraftStatus::Writing)
            .await?;
        if !claimed {
            let draft = repo
                .find_draft_by_id(job.draft_id)
                .await?
                .ok_or_else(|| AppError::DraftNotFound {
                    id: job.draft_id.to_string(),
                })?;
            match draft.draft_status() {
                DraftStatus::Writing => {
                    info!("Resuming content generation after a failed attempt");
                }
                status => {
                    warn!(status = ?status, "Content stage already ran for draft, skipping job");
                    return Ok(());
                }
            }
        }
        self.drafts.update_progress(job.draft_id, 0).await?;

        // The keyword conditions every generation call
        let (_, keyword) = repo
            .find_draft_with_keyword(job.draft_id)
            .await?
            .ok_or_else(|| AppError::DraftNotFound {
                id: job.draft_id.to_string(),
            })?;
        let keyword = keyword
            .ok_or_else(|| AppError::Internal {
                message: format!("Draft {} has no primary keyword", job.draft_id),
            })?
            .keyword;

        let angle = &job.strategy.information_gain_angle;
        let outline = &job.outline;

        // Orders already persisted by an earlier attempt
        let existing: HashMap<i32, Section> = repo
            .sections_for_draft(job.draft_id)
            .await?
            .into_iter()
            .map(|s| (s.order, s))
            .collect();
        if !existing.is_empty() {
            info!(count = existing.len(), "Skipping already-generated sections");
        }

        let plan = plan_sections(outline);
        let total = plan.len();

        // Sequential generation: each call's output feeds the next call's
        // context, so sections are never parallelized
        let mut previous_excerpt = String::new();
        for (step, planned) in plan.iter().enumerate() {
            let body = match existing.get(&planned.order) {
                Some(section) => section.content.clone(),
                None => {
                    let body = match planned.kind {
                        SectionKind::Introduction => {
                            info!("Generating introduction");
                            self.generate_timed("introduction", async {
                                self.llm
                                    .generate_introduction(&keyword, &outline.title, angle)
                                    .await
                            })
                            .await?
                        }
                        SectionKind::Section => {
                            let outline_section = planned
                                .outline_index
                                .and_then(|i| outline.sections.get(i))
                                .ok_or_else(|| AppError::Internal {
                                    message: "Planned section missing from outline".to_string(),
                                })?;
                            info!(
                                step = step,
                                total = total,
                                heading = %outline_section.heading,
                                "Generating section"
                            );
                            self.generate_timed("section", async {
                                self.llm
                                    .generate_section(
                                        &outline_section.heading,
                                        &outline_section.intent,
                                        &outline_section.keywords_to_include,
                                        &previous_excerpt,
                                        angle,
                                        &outline.title,
                                    )
                                    .await
                            })
                            .await?
                        }
                        SectionKind::Conclusion => {
                            info!("Generating conclusion");
                            // Summarize everything persisted so far, in order
                            let sections = repo.sections_for_draft(job.draft_id).await?;
                            let all_content = sections
                                .iter()
                                .map(|s| s.content.as_str())
                                .collect::<Vec<_>>()
                                .join("\n\n");
                            let summary = excerpt(&all_content, CONCLUSION_CONTEXT_CHARS);
                            self.generate_timed("conclusion", async {
                                self.llm
                                    .generate_conclusion(&outline.title, &keyword, &summary)
                                    .await
                            })
                            .await?
                        }
                    };

                    self.drafts
                        .append_section(
                            job.draft_id,
                            planned.heading.clone(),
                            body.clone(),
                            planned.order,
                            planned.kind,
                        )
                        .await?;
                    body
                }
            };

            previous_excerpt = excerpt(&body, SECTION_CONTEXT_CHARS);

            let progress = (((step + 1) * 100) / (total + 1)) as i32;
            self.drafts.update_progress(job.draft_id, progress).await?;
        }

        // Compile the final document from the persisted sections and mark
        // the draft COMPLETED
        let sections = repo.sections_for_draft(job.draft_id).await?;
        let final_content = assemble(&sections);
        self.drafts
            .complete(job.draft_id, final_content.clone())
            .await?;

        // Score the compiled document against the primary keyword
        info!("Calculating SEO score");
        let score = seo::score(&final_content, &keyword);
        self.drafts.save_seo_score(job.draft_id, &score).await?;

        info!("Content generation completed");
        Ok(())
    }

    async fn generate_timed<F>(&self, kind: &str, fut: F) -> Result<String>
    where
        F: std::future::Future<Output = Result<String>>,
    {
        let started = std::time::Instant::now();
        let result = fut.await;
        metrics::record_generation(kind, started.elapsed().as_secs_f64(), result.is_ok());
        result
    }
}
