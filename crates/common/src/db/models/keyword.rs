//! Keyword entity
//!
//! A research subject. Keyword text is the natural dedup key: lookups by text
//! reuse the existing row rather than inserting a duplicate.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Coarse difficulty tier derived from the 0-100 difficulty score
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DifficultyLevel {
    Low,
    Medium,
    High,
}

impl DifficultyLevel {
    /// Map a 0-100 difficulty score to its tier
    pub fn from_score(difficulty: i32) -> Self {
        if difficulty <= 30 {
            DifficultyLevel::Low
        } else if difficulty <= 60 {
            DifficultyLevel::Medium
        } else {
            DifficultyLevel::High
        }
    }
}

impl From<String> for DifficultyLevel {
    fn from(s: String) -> Self {
        match s.as_str() {
            "MEDIUM" => DifficultyLevel::Medium,
            "HIGH" => DifficultyLevel::High,
            _ => DifficultyLevel::Low,
        }
    }
}

impl From<DifficultyLevel> for String {
    fn from(level: DifficultyLevel) -> Self {
        match level {
            DifficultyLevel::Low => "LOW".to_string(),
            DifficultyLevel::Medium => "MEDIUM".to_string(),
            DifficultyLevel::High => "HIGH".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "keywords")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub keyword: String,

    /// 0-100 difficulty score from the research provider
    pub difficulty: Option<i32>,

    #[sea_orm(column_type = "Text", nullable)]
    pub difficulty_level: Option<String>,

    pub search_volume: Option<i32>,

    /// Composite keyword value: search_volume * cpc / (competition_index + 1)
    #[sea_orm(column_type = "Double", nullable)]
    pub kcv: Option<f64>,

    /// Opaque provider payload as JSONB
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub metadata: Option<serde_json::Value>,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Get the difficulty tier as an enum
    pub fn difficulty_tier(&self) -> Option<DifficultyLevel> {
        self.difficulty_level.clone().map(DifficultyLevel::from)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::draft::Entity")]
    Drafts,
}

impl Related<super::draft::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Drafts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_tier_boundaries() {
        assert_eq!(DifficultyLevel::from_score(0), DifficultyLevel::Low);
        assert_eq!(DifficultyLevel::from_score(30), DifficultyLevel::Low);
        assert_eq!(DifficultyLevel::from_score(31), DifficultyLevel::Medium);
        assert_eq!(DifficultyLevel::from_score(60), DifficultyLevel::Medium);
        assert_eq!(DifficultyLevel::from_score(61), DifficultyLevel::High);
        assert_eq!(DifficultyLevel::from_score(100), DifficultyLevel::High);
    }

    #[test]
    fn test_difficulty_level_string_round_trip() {
        for level in [
            DifficultyLevel::Low,
            DifficultyLevel::Medium,
            DifficultyLevel::High,
        ] {
            let s: String = level.into();
            assert_eq!(DifficultyLevel::from(s), level);
        }
    }
}
