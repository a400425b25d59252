//! Section entity
//!
//! One unit of generated prose owned by exactly one draft. Sections are
//! append-only during content generation; order 0 is the introduction,
//! 1..N the body sections in outline order, N+1 the conclusion.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Section kind tag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Introduction,
    Section,
    Conclusion,
}

impl From<String> for SectionKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "introduction" => SectionKind::Introduction,
            "conclusion" => SectionKind::Conclusion,
            _ => SectionKind::Section,
        }
    }
}

impl From<SectionKind> for String {
    fn from(kind: SectionKind) -> Self {
        match kind {
            SectionKind::Introduction => "introduction".to_string(),
            SectionKind::Section => "section".to_string(),
            SectionKind::Conclusion => "conclusion".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sections")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub draft_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub heading: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Position within the draft; unique per draft, assigned monotonically
    pub order: i32,

    #[sea_orm(column_type = "Text")]
    pub kind: String,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Get the section kind as an enum
    pub fn section_kind(&self) -> SectionKind {
        SectionKind::from(self.kind.clone())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::draft::Entity",
        from = "Column::DraftId",
        to = "super::draft::Column::Id",
        on_delete = "Cascade"
    )]
    Draft,
}

impl Related<super::draft::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Draft.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_string_round_trip() {
        for kind in [
            SectionKind::Introduction,
            SectionKind::Section,
            SectionKind::Conclusion,
        ] {
            let s: String = kind.into();
            assert_eq!(SectionKind::from(s), kind);
        }
    }
}
