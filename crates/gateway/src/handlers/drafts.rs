//! Draft lifecycle handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use draftforge_common::{
    db::models::{Draft, Keyword, Section},
    documents::ArticleOutline,
    drafts::ExportedDraft,
    errors::Result,
};

/// Request to create a new draft
#[derive(Debug, Deserialize)]
pub struct CreateDraftRequest {
    pub keyword_id: Uuid,
}

/// Request to replace a draft's outline before approval
#[derive(Debug, Deserialize)]
pub struct UpdateOutlineRequest {
    pub outline: ArticleOutline,
}

/// One generated section in a draft response
#[derive(Serialize)]
pub struct SectionResponse {
    pub heading: String,
    pub content: String,
    pub order: i32,
    pub kind: String,
}

impl From<Section> for SectionResponse {
    fn from(section: Section) -> Self {
        Self {
            heading: section.heading,
            content: section.content,
            order: section.order,
            kind: section.kind,
        }
    }
}

/// Full draft response
#[derive(Serialize)]
pub struct DraftResponse {
    pub id: Uuid,
    pub title: String,
    pub status: String,
    pub progress: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outline: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo_score: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<SectionResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl DraftResponse {
    fn from_parts(draft: Draft, keyword: Option<Keyword>, sections: Vec<Section>) -> Self {
        Self {
            id: draft.id,
            title: draft.title,
            status: draft.status,
            progress: draft.progress,
            keyword: keyword.map(|k| k.keyword),
            content: draft.content,
            strategy: draft.strategy,
            outline: draft.outline,
            seo_score: draft.seo_score,
            sections: sections.into_iter().map(Into::into).collect(),
            created_at: draft.created_at.to_rfc3339(),
            updated_at: draft.updated_at.to_rfc3339(),
        }
    }
}

/// Create a new draft and enqueue strategy analysis
pub async fn create_draft(
    State(state): State<AppState>,
    Json(request): Json<CreateDraftRequest>,
) -> Result<(StatusCode, Json<DraftResponse>)> {
    let draft = state.drafts.create_draft(request.keyword_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(DraftResponse::from_parts(draft, None, Vec::new())),
    ))
}

/// List all drafts, newest first
pub async fn list_drafts(
    State(state): State<AppState>,
) -> Result<Json<Vec<DraftResponse>>> {
    let drafts = state.drafts.list_drafts().await?;

    Ok(Json(
        drafts
            .into_iter()
            .map(|(draft, keyword)| DraftResponse::from_parts(draft, keyword, Vec::new()))
            .collect(),
    ))
}

/// Get a draft with its keyword and ordered sections
pub async fn get_draft(
    State(state): State<AppState>,
    Path(draft_id): Path<Uuid>,
) -> Result<Json<DraftResponse>> {
    let detail = state.drafts.get_draft(draft_id).await?;

    Ok(Json(DraftResponse::from_parts(
        detail.draft,
        detail.keyword,
        detail.sections,
    )))
}

/// Replace the outline on a draft awaiting approval
pub async fn update_outline(
    State(state): State<AppState>,
    Path(draft_id): Path<Uuid>,
    Json(request): Json<UpdateOutlineRequest>,
) -> Result<Json<DraftResponse>> {
    let draft = state
        .drafts
        .update_outline(draft_id, &request.outline)
        .await?;

    Ok(Json(DraftResponse::from_parts(draft, None, Vec::new())))
}

/// Approve the outline and enqueue content generation
pub async fn approve_outline(
    State(state): State<AppState>,
    Path(draft_id): Path<Uuid>,
) -> Result<Json<DraftResponse>> {
    let draft = state.drafts.approve_outline(draft_id).await?;

    Ok(Json(DraftResponse::from_parts(draft, None, Vec::new())))
}

/// Export a completed draft as markdown
pub async fn export_draft(
    State(state): State<AppState>,
    Path(draft_id): Path<Uuid>,
) -> Result<Json<ExportedDraft>> {
    let exported = state.drafts.export(draft_id).await?;
    Ok(Json(exported))
}
