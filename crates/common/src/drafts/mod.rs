//! Draft service
//!
//! The orchestrator surface shared by the gateway and the stage workers:
//! every draft lifecycle operation lives here, including the enqueue side
//! effects that chain the pipeline stages together. Constructed from an
//! injected repository and queue bundle.

use crate::db::models::{Draft, DraftStatus, Keyword, Section, SectionKind};
use crate::db::Repository;
use crate::documents::{ArticleOutline, SeoScore, StrategyDocument};
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::queue::{ContentJob, OutlineJob, StageQueues, StrategyJob};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// A draft with its keyword and ordered sections
#[derive(Debug, Clone)]
pub struct DraftDetail {
    pub draft: Draft,
    pub keyword: Option<Keyword>,
    pub sections: Vec<Section>,
}

/// Export payload for a completed draft
#[derive(Debug, Clone, Serialize)]
pub struct ExportedDraft {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub format: &'static str,
    pub exported_at: DateTime<Utc>,
}

/// Draft lifecycle operations
#[derive(Clone)]
pub struct DraftService {
    repository: Repository,
    queues: StageQueues,
}

impl DraftService {
    pub fn new(repository: Repository, queues: StageQueues) -> Self {
        Self { repository, queues }
    }

    /// Access the underlying repository (workers need raw claims/reads)
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Create a draft for a keyword and enqueue its strategy job
    pub async fn create_draft(&self, keyword_id: Uuid) -> Result<Draft> {
        let keyword = self
            .repository
            .find_keyword_by_id(keyword_id)
            .await?
            .ok_or_else(|| AppError::KeywordNotFound {
                id: keyword_id.to_string(),
            })?;

        let draft = self.repository.create_draft(&keyword).await?;

        self.queues
            .strategy
            .send(&StrategyJob {
                draft_id: draft.id,
                keyword: keyword.keyword.clone(),
            })
            .await?;

        metrics::record_draft_created();
        info!(
            draft_id = %draft.id,
            keyword = %keyword.keyword,
            "Created draft and enqueued strategy job"
        );

        Ok(draft)
    }

    /// Get a draft with keyword and ordered sections
    pub async fn get_draft(&self, id: Uuid) -> Result<DraftDetail> {
        let (draft, keyword) = self
            .repository
            .find_draft_with_keyword(id)
            .await?
            .ok_or_else(|| AppError::DraftNotFound { id: id.to_string() })?;

        let sections = self.repository.sections_for_draft(id).await?;

        Ok(DraftDetail {
            draft,
            keyword,
            sections,
        })
    }

    /// List all drafts, newest first
    pub async fn list_drafts(&self) -> Result<Vec<(Draft, Option<Keyword>)>> {
        self.repository.list_drafts().await
    }

    /// Replace a draft's outline (manual edit before approval)
    pub async fn update_outline(&self, id: Uuid, outline: &ArticleOutline) -> Result<Draft> {
        self.repository.update_outline(id, outline).await
    }

    /// Approve the outline and enqueue content generation.
    ///
    /// Fails with Precondition when the draft has no outline or is not
    /// awaiting approval; a failed approval performs no enqueue.
    pub async fn approve_outline(&self, id: Uuid) -> Result<Draft> {
        let draft = self
            .repository
            .find_draft_by_id(id)
            .await?
            .ok_or_else(|| AppError::DraftNotFound { id: id.to_string() })?;

        if !draft.can_approve() {
            return Err(AppError::Precondition {
                message: "Draft has no outline to approve".to_string(),
            });
        }

        let outline = draft.outline_document()?.ok_or_else(|| AppError::Precondition {
            message: "Draft has no outline to approve".to_string(),
        })?;
        let strategy = draft.strategy_document()?.ok_or_else(|| AppError::Precondition {
            message: "Draft has no strategy document".to_string(),
        })?;

        // Claim the transition; a lost race means approval already happened
        let claimed = self
            .repository
            .try_claim_status(id, DraftStatus::OutlinePending, DraftStatus::OutlineApproved)
            .await?;
        if !claimed {
            return Err(AppError::Precondition {
                message: format!(
                    "Draft is not awaiting outline approval (status: {})",
                    draft.status
                ),
            });
        }

        self.queues
            .content
            .send(&ContentJob {
                draft_id: id,
                outline,
                strategy,
            })
            .await?;

        info!(draft_id = %id, "Outline approved, content job enqueued");

        self.repository
            .find_draft_by_id(id)
            .await?
            .ok_or_else(|| AppError::DraftNotFound { id: id.to_string() })
    }

    /// Persist the strategy document, advance to OUTLINE_PENDING, and
    /// enqueue the outline job
    pub async fn save_strategy(
        &self,
        draft_id: Uuid,
        keyword: &str,
        strategy: StrategyDocument,
    ) -> Result<Draft> {
        let draft = self.repository.update_strategy(draft_id, &strategy).await?;

        self.queues
            .outline
            .send(&OutlineJob {
                draft_id,
                keyword: keyword.to_string(),
                strategy,
            })
            .await?;

        info!(draft_id = %draft_id, "Strategy persisted, outline job enqueued");
        Ok(draft)
    }

    /// Persist the outline document; the draft stays OUTLINE_PENDING
    pub async fn save_outline(&self, draft_id: Uuid, outline: &ArticleOutline) -> Result<Draft> {
        self.repository.update_outline(draft_id, outline).await
    }

    /// Append one generated section
    pub async fn append_section(
        &self,
        draft_id: Uuid,
        heading: String,
        content: String,
        order: i32,
        kind: SectionKind,
    ) -> Result<Section> {
        let section = self
            .repository
            .append_section(draft_id, heading, content, order, kind)
            .await?;
        metrics::record_section(&String::from(kind));
        Ok(section)
    }

    /// Persist the compiled document and mark the draft COMPLETED
    pub async fn complete(&self, draft_id: Uuid, content: String) -> Result<Draft> {
        let draft = self.repository.update_content(draft_id, content).await?;
        metrics::record_draft_completed();
        info!(draft_id = %draft_id, "Draft completed");
        Ok(draft)
    }

    /// Persist the SEO score summary
    pub async fn save_seo_score(&self, draft_id: Uuid, score: &SeoScore) -> Result<Draft> {
        self.repository.update_seo_score(draft_id, score).await
    }

    /// Update coarse progress for external observers
    pub async fn update_progress(&self, draft_id: Uuid, progress: i32) -> Result<()> {
        self.repository.update_progress(draft_id, progress).await
    }

    /// Export a completed draft as markdown
    pub async fn export(&self, id: Uuid) -> Result<ExportedDraft> {
        let draft = self
            .repository
            .find_draft_by_id(id)
            .await?
            .ok_or_else(|| AppError::DraftNotFound { id: id.to_string() })?;

        if !draft.can_export() {
            return Err(AppError::Precondition {
                message: "Draft content not available".to_string(),
            });
        }

        Ok(ExportedDraft {
            id: draft.id,
            title: draft.title,
            content: draft.content.unwrap_or_default(),
            format: "markdown",
            exported_at: Utc::now(),
        })
    }
}
