pub mod extract;
pub mod ingest;
pub mod search;
pub mod select;
pub(crate) mod utils;

pub use extract::{ContentExtractor, ContentSource, HtmlExtractor, PageFetcher};
pub use ingest::{ArticleIngester, IngestReport};
pub use search::{DuckDuckGoSearch, SearchProvider};
pub use select::ReferenceSelector;

pub mod prelude {
    pub use super::{ContentSource, ReferenceSelector, SearchProvider};
    pub use co_core::{Error, ExtractedContent, Result};
}
