//! SeaORM entity models
//!
//! Database entities for DraftForge

mod draft;
mod keyword;
mod section;

pub use draft::{
    ActiveModel as DraftActiveModel,
    Column as DraftColumn,
    DraftStatus,
    Entity as DraftEntity,
    Model as Draft,
};

pub use keyword::{
    ActiveModel as KeywordActiveModel,
    Column as KeywordColumn,
    DifficultyLevel,
    Entity as KeywordEntity,
    Model as Keyword,
};

pub use section::{
    ActiveModel as SectionActiveModel,
    Column as SectionColumn,
    Entity as SectionEntity,
    Model as Section,
    SectionKind,
};
