use async_trait::async_trait;

use crate::types::{ArticleFilter, ArticlePatch, NewArticle, Page, SourceArticle};
use crate::Result;

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Persist a new article. Fails with `Error::Conflict` when the URL is
    /// taken or the original already has an optimized derivative.
    async fn create(&self, article: NewArticle) -> Result<SourceArticle>;

    async fn get(&self, id: &str) -> Result<Option<SourceArticle>>;

    async fn find_by_url(&self, url: &str) -> Result<Option<SourceArticle>>;

    /// The optimized derivative of `original_id`, if one was published.
    async fn find_optimized_for(&self, original_id: &str) -> Result<Option<SourceArticle>>;

    /// Newest first. `page` is one-based.
    async fn list(&self, filter: &ArticleFilter, page: usize, limit: usize) -> Result<Page<SourceArticle>>;

    async fn update(&self, id: &str, patch: ArticlePatch) -> Result<Option<SourceArticle>>;

    /// Returns false when nothing was deleted.
    async fn delete(&self, id: &str) -> Result<bool>;
}
