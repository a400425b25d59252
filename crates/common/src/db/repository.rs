//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling. Constructed from an injected pool;
//! there is no process-wide database handle.

use crate::db::models::*;
use crate::db::DbPool;
use crate::documents::{ArticleOutline, SeoScore, StrategyDocument};
use crate::errors::{AppError, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    QueryFilter, QueryOrder, Set, Statement,
};
use uuid::Uuid;

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Keyword Operations
    // ========================================================================

    /// Create a new keyword
    #[allow(clippy::too_many_arguments)]
    pub async fn create_keyword(
        &self,
        keyword: String,
        difficulty: Option<i32>,
        difficulty_level: Option<DifficultyLevel>,
        search_volume: Option<i32>,
        kcv: Option<f64>,
        metadata: Option<serde_json::Value>,
    ) -> Result<Keyword> {
        let now = chrono::Utc::now();

        let model = KeywordActiveModel {
            id: Set(Uuid::new_v4()),
            keyword: Set(keyword),
            difficulty: Set(difficulty),
            difficulty_level: Set(difficulty_level.map(String::from)),
            search_volume: Set(search_volume),
            kcv: Set(kcv),
            metadata: Set(metadata),
            created_at: Set(now.into()),
        };

        model.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Find keyword by ID
    pub async fn find_keyword_by_id(&self, id: Uuid) -> Result<Option<Keyword>> {
        KeywordEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find keyword by its text (the natural dedup key)
    pub async fn find_keyword_by_text(&self, keyword: &str) -> Result<Option<Keyword>> {
        KeywordEntity::find()
            .filter(KeywordColumn::Keyword.eq(keyword))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Draft Operations
    // ========================================================================

    /// Create a draft for a keyword, in the initial RESEARCHING state
    pub async fn create_draft(&self, keyword: &Keyword) -> Result<Draft> {
        let now = chrono::Utc::now();

        let draft = DraftActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(keyword.keyword.clone()),
            content: Set(None),
            status: Set(String::from(DraftStatus::Researching)),
            primary_keyword_id: Set(keyword.id),
            strategy: Set(None),
            outline: Set(None),
            seo_score: Set(None),
            progress: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        draft.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Find draft by ID
    pub async fn find_draft_by_id(&self, id: Uuid) -> Result<Option<Draft>> {
        DraftEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find draft by ID together with its primary keyword
    pub async fn find_draft_with_keyword(
        &self,
        id: Uuid,
    ) -> Result<Option<(Draft, Option<Keyword>)>> {
        DraftEntity::find_by_id(id)
            .find_also_related(KeywordEntity)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// List all drafts, newest first, with their keywords
    pub async fn list_drafts(&self) -> Result<Vec<(Draft, Option<Keyword>)>> {
        DraftEntity::find()
            .find_also_related(KeywordEntity)
            .order_by_desc(DraftColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Atomically claim a status transition for a draft.
    ///
    /// Compare-and-swap: the update applies only when the draft is still in
    /// `from`. Returns false when another worker already claimed the draft
    /// (or the stage already ran), in which case the caller must treat the
    /// job as a no-op. Returns DraftNotFound when the draft does not exist.
    pub async fn try_claim_status(
        &self,
        id: Uuid,
        from: DraftStatus,
        to: DraftStatus,
    ) -> Result<bool> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"UPDATE drafts SET status = $1, updated_at = NOW() WHERE id = $2 AND status = $3"#,
            vec![
                String::from(to).into(),
                id.into(),
                String::from(from).into(),
            ],
        );

        let result = self.write_conn().execute(stmt).await?;
        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // Distinguish a lost race from a missing draft
        if self.find_draft_by_id(id).await?.is_none() {
            return Err(AppError::DraftNotFound { id: id.to_string() });
        }

        Ok(false)
    }

    /// Persist the strategy document and advance status to OUTLINE_PENDING
    pub async fn update_strategy(
        &self,
        id: Uuid,
        strategy: &StrategyDocument,
    ) -> Result<Draft> {
        let mut draft = self.draft_active_model(id).await?;

        draft.strategy = Set(Some(serde_json::to_value(strategy)?));
        draft.status = Set(String::from(DraftStatus::OutlinePending));
        draft.updated_at = Set(chrono::Utc::now().into());

        draft.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Persist the outline document; status is untouched
    pub async fn update_outline(&self, id: Uuid, outline: &ArticleOutline) -> Result<Draft> {
        let mut draft = self.draft_active_model(id).await?;

        draft.outline = Set(Some(serde_json::to_value(outline)?));
        draft.updated_at = Set(chrono::Utc::now().into());

        draft.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Mark the outline approved
    pub async fn update_status(&self, id: Uuid, status: DraftStatus) -> Result<Draft> {
        let mut draft = self.draft_active_model(id).await?;

        draft.status = Set(String::from(status));
        draft.updated_at = Set(chrono::Utc::now().into());

        draft.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Persist the final compiled content and mark the draft COMPLETED
    pub async fn update_content(&self, id: Uuid, content: String) -> Result<Draft> {
        let mut draft = self.draft_active_model(id).await?;

        draft.content = Set(Some(content));
        draft.status = Set(String::from(DraftStatus::Completed));
        draft.progress = Set(100);
        draft.updated_at = Set(chrono::Utc::now().into());

        draft.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Persist the SEO score summary
    pub async fn update_seo_score(&self, id: Uuid, score: &SeoScore) -> Result<Draft> {
        let mut draft = self.draft_active_model(id).await?;

        draft.seo_score = Set(Some(serde_json::to_value(score)?));
        draft.updated_at = Set(chrono::Utc::now().into());

        draft.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Update the coarse progress percentage
    pub async fn update_progress(&self, id: Uuid, progress: i32) -> Result<()> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "UPDATE drafts SET progress = $1, updated_at = NOW() WHERE id = $2",
            vec![progress.into(), id.into()],
        );

        self.write_conn().execute(stmt).await?;
        Ok(())
    }

    async fn draft_active_model(&self, id: Uuid) -> Result<DraftActiveModel> {
        Ok(DraftEntity::find_by_id(id)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::DraftNotFound { id: id.to_string() })?
            .into())
    }

    // ========================================================================
    // Section Operations
    // ========================================================================

    /// Append a generated section to a draft
    pub async fn append_section(
        &self,
        draft_id: Uuid,
        heading: String,
        content: String,
        order: i32,
        kind: SectionKind,
    ) -> Result<Section> {
        let now = chrono::Utc::now();

        let section = SectionActiveModel {
            id: Set(Uuid::new_v4()),
            draft_id: Set(draft_id),
            heading: Set(heading),
            content: Set(content),
            order: Set(order),
            kind: Set(String::from(kind)),
            created_at: Set(now.into()),
        };

        section.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Get a draft's sections in ascending order
    pub async fn sections_for_draft(&self, draft_id: Uuid) -> Result<Vec<Section>> {
        SectionEntity::find()
            .filter(SectionColumn::DraftId.eq(draft_id))
            .order_by_asc(SectionColumn::Order)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }
}
