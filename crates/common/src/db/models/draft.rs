//! Draft entity and its status state machine
//!
//! A draft advances RESEARCHING -> ANALYZING -> OUTLINE_PENDING ->
//! OUTLINE_APPROVED -> WRITING -> COMPLETED. There is no failed state: a
//! stage failure leaves the draft where it was and surfaces as a rejected
//! job, so a stuck draft is distinguishable only by its age.

use crate::documents::{ArticleOutline, SeoScore, StrategyDocument};
use crate::errors::{AppError, Result as AppResult};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Draft status enum
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DraftStatus {
    Researching,
    Analyzing,
    OutlinePending,
    OutlineApproved,
    Writing,
    Completed,
}

impl DraftStatus {
    /// Whether the state machine permits moving from `self` to `to`.
    ///
    /// Each state has exactly one legal successor. Persisting the outline
    /// does not change status, so OUTLINE_PENDING -> OUTLINE_PENDING is not
    /// a transition.
    pub fn can_transition_to(&self, to: DraftStatus) -> bool {
        matches!(
            (self, to),
            (DraftStatus::Researching, DraftStatus::Analyzing)
                | (DraftStatus::Analyzing, DraftStatus::OutlinePending)
                | (DraftStatus::OutlinePending, DraftStatus::OutlineApproved)
                | (DraftStatus::OutlineApproved, DraftStatus::Writing)
                | (DraftStatus::Writing, DraftStatus::Completed)
        )
    }

    /// Check if this status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, DraftStatus::Completed)
    }
}

impl From<String> for DraftStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "ANALYZING" => DraftStatus::Analyzing,
            "OUTLINE_PENDING" => DraftStatus::OutlinePending,
            "OUTLINE_APPROVED" => DraftStatus::OutlineApproved,
            "WRITING" => DraftStatus::Writing,
            "COMPLETED" => DraftStatus::Completed,
            _ => DraftStatus::Researching,
        }
    }
}

impl From<DraftStatus> for String {
    fn from(status: DraftStatus) -> Self {
        match status {
            DraftStatus::Researching => "RESEARCHING".to_string(),
            DraftStatus::Analyzing => "ANALYZING".to_string(),
            DraftStatus::OutlinePending => "OUTLINE_PENDING".to_string(),
            DraftStatus::OutlineApproved => "OUTLINE_APPROVED".to_string(),
            DraftStatus::Writing => "WRITING".to_string(),
            DraftStatus::Completed => "COMPLETED".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "drafts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    /// Final compiled markdown, present once the content stage finishes
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    pub primary_keyword_id: Uuid,

    /// Strategy document as JSONB (gap analysis + SERP snapshot)
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub strategy: Option<serde_json::Value>,

    /// Outline document as JSONB
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub outline: Option<serde_json::Value>,

    /// SEO score summary as JSONB
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub seo_score: Option<serde_json::Value>,

    /// Coarse stage progress, 0-100
    pub progress: i32,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Get the draft status as an enum
    pub fn draft_status(&self) -> DraftStatus {
        DraftStatus::from(self.status.clone())
    }

    /// Parse the strategy document, validating its shape
    pub fn strategy_document(&self) -> AppResult<Option<StrategyDocument>> {
        self.strategy
            .clone()
            .map(|v| serde_json::from_value(v).map_err(AppError::from))
            .transpose()
    }

    /// Parse the outline document, validating its shape
    pub fn outline_document(&self) -> AppResult<Option<ArticleOutline>> {
        self.outline
            .clone()
            .map(|v| serde_json::from_value(v).map_err(AppError::from))
            .transpose()
    }

    /// Parse the SEO score summary
    pub fn seo_score_summary(&self) -> AppResult<Option<SeoScore>> {
        self.seo_score
            .clone()
            .map(|v| serde_json::from_value(v).map_err(AppError::from))
            .transpose()
    }

    /// Approval requires an outline to exist
    pub fn can_approve(&self) -> bool {
        self.outline.is_some()
    }

    /// Export requires compiled content to exist
    pub fn can_export(&self) -> bool {
        self.content.as_deref().is_some_and(|c| !c.is_empty())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::keyword::Entity",
        from = "Column::PrimaryKeywordId",
        to = "super::keyword::Column::Id"
    )]
    Keyword,

    #[sea_orm(has_many = "super::section::Entity", on_delete = "Cascade")]
    Sections,
}

impl Related<super::keyword::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Keyword.def()
    }
}

impl Related<super::section::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sections.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft_with(status: DraftStatus, outline: Option<serde_json::Value>) -> Model {
        let now = chrono::Utc::now();
        Model {
            id: Uuid::new_v4(),
            title: "best hiking boots".to_string(),
            content: None,
            status: String::from(status),
            primary_keyword_id: Uuid::new_v4(),
            strategy: None,
            outline,
            seo_score: None,
            progress: 0,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn test_transition_table() {
        use DraftStatus::*;

        let legal = [
            (Researching, Analyzing),
            (Analyzing, OutlinePending),
            (OutlinePending, OutlineApproved),
            (OutlineApproved, Writing),
            (Writing, Completed),
        ];
        for (from, to) in legal {
            assert!(from.can_transition_to(to), "{from:?} -> {to:?}");
        }

        // No transition may skip a state or run backwards
        assert!(!Researching.can_transition_to(OutlinePending));
        assert!(!Researching.can_transition_to(Completed));
        assert!(!OutlinePending.can_transition_to(Writing));
        assert!(!Analyzing.can_transition_to(Researching));
        assert!(!Completed.can_transition_to(Writing));
        assert!(!OutlinePending.can_transition_to(OutlinePending));
    }

    #[test]
    fn test_status_string_round_trip() {
        use DraftStatus::*;
        for status in [
            Researching,
            Analyzing,
            OutlinePending,
            OutlineApproved,
            Writing,
            Completed,
        ] {
            let s: String = status.into();
            assert_eq!(DraftStatus::from(s), status);
        }
        // Unknown strings fall back to the initial state
        assert_eq!(DraftStatus::from("BOGUS".to_string()), Researching);
    }

    #[test]
    fn test_approval_requires_outline() {
        let draft = draft_with(DraftStatus::OutlinePending, None);
        assert!(!draft.can_approve());

        let outline = serde_json::json!({
            "title": "Best Hiking Boots",
            "sections": [{ "heading": "Fit", "intent": "sizing" }]
        });
        let draft = draft_with(DraftStatus::OutlinePending, Some(outline));
        assert!(draft.can_approve());
        assert_eq!(draft.outline_document().unwrap().unwrap().sections.len(), 1);
    }

    #[test]
    fn test_export_requires_content() {
        let mut draft = draft_with(DraftStatus::Researching, None);
        assert!(!draft.can_export());

        draft.content = Some(String::new());
        assert!(!draft.can_export());

        draft.content = Some("# Best Hiking Boots\n\nBody".to_string());
        assert!(draft.can_export());
    }

    #[test]
    fn test_malformed_outline_document_is_rejected() {
        let draft = draft_with(
            DraftStatus::OutlinePending,
            Some(serde_json::json!({ "sections": "not-a-list" })),
        );
        assert!(draft.outline_document().is_err());
    }

    #[test]
    fn test_only_completed_is_terminal() {
        assert!(DraftStatus::Completed.is_terminal());
        assert!(!DraftStatus::Writing.is_terminal());
        assert!(!DraftStatus::Researching.is_terminal());
    }
}
