pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod text;
pub mod types;

pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use models::{GenerationRequest, TextGenerator};
pub use storage::ArticleStore;
pub use types::{
    ArticleFilter, ArticleId, ArticlePatch, ExtractedContent, NewArticle, Page, Reference,
    SourceArticle,
};

pub mod prelude {
    pub use super::{
        ArticleStore, Error, ExtractedContent, PipelineConfig, Reference, Result, SourceArticle,
        TextGenerator,
    };
}
