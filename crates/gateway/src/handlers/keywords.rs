//! Keyword research handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use draftforge_common::{
    db::models::Keyword,
    errors::{AppError, Result},
    research::KeywordSuggestion,
};

/// Request for keyword suggestions
#[derive(Debug, Deserialize, Validate)]
pub struct SuggestKeywordsRequest {
    #[validate(length(min = 1, max = 255))]
    pub seed_keyword: String,
}

/// A suggestion enriched with its database id
#[derive(Serialize)]
pub struct SavedSuggestion {
    pub id: Uuid,
    #[serde(flatten)]
    pub suggestion: KeywordSuggestion,
}

#[derive(Serialize)]
pub struct SuggestKeywordsResponse {
    pub suggestions: Vec<SavedSuggestion>,
}

/// Keyword detail response
#[derive(Serialize)]
pub struct KeywordResponse {
    pub id: Uuid,
    pub keyword: String,
    pub difficulty: Option<i32>,
    pub difficulty_level: Option<String>,
    pub search_volume: Option<i32>,
    pub kcv: Option<f64>,
    pub created_at: String,
}

impl From<Keyword> for KeywordResponse {
    fn from(keyword: Keyword) -> Self {
        Self {
            id: keyword.id,
            keyword: keyword.keyword,
            difficulty: keyword.difficulty,
            difficulty_level: keyword.difficulty_level,
            search_volume: keyword.search_volume,
            kcv: keyword.kcv,
            created_at: keyword.created_at.to_rfc3339(),
        }
    }
}

/// Fetch suggestions for a seed keyword and persist them.
///
/// Suggestions dedup on keyword text: a keyword that already exists is
/// reused rather than inserted again.
pub async fn suggest_keywords(
    State(state): State<AppState>,
    Json(request): Json<SuggestKeywordsRequest>,
) -> Result<Json<SuggestKeywordsResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("seed_keyword".to_string()),
    })?;

    let seed = request.seed_keyword.trim();
    if seed.is_empty() {
        return Ok(Json(SuggestKeywordsResponse {
            suggestions: Vec::new(),
        }));
    }

    let suggestions = state.research.keyword_suggestions(seed).await?;
    let repo = state.drafts.repository();

    let mut saved = Vec::with_capacity(suggestions.len());
    for suggestion in suggestions {
        let existing = repo.find_keyword_by_text(&suggestion.keyword).await?;
        let keyword = match existing {
            Some(keyword) => keyword,
            None => {
                repo.create_keyword(
                    suggestion.keyword.clone(),
                    Some(suggestion.difficulty),
                    Some(suggestion.difficulty_level),
                    Some(suggestion.search_volume),
                    Some(suggestion.kcv),
                    Some(suggestion.metadata.clone()),
                )
                .await?
            }
        };

        saved.push(SavedSuggestion {
            id: keyword.id,
            suggestion,
        });
    }

    tracing::info!(seed = %seed, count = saved.len(), "Keyword suggestions saved");

    Ok(Json(SuggestKeywordsResponse { suggestions: saved }))
}

/// Get a keyword by ID
pub async fn get_keyword(
    State(state): State<AppState>,
    Path(keyword_id): Path<Uuid>,
) -> Result<Json<KeywordResponse>> {
    let keyword = state
        .drafts
        .repository()
        .find_keyword_by_id(keyword_id)
        .await?
        .ok_or_else(|| AppError::KeywordNotFound {
            id: keyword_id.to_string(),
        })?;

    Ok(Json(keyword.into()))
}
