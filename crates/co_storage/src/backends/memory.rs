use async_trait::async_trait;
use chrono::Utc;
use co_core::{
    ArticleFilter, ArticlePatch, ArticleStore, Error, NewArticle, Page, Result, SourceArticle,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::StorageBackend;

#[derive(Default)]
pub struct MemoryStore {
    articles: Vec<SourceArticle>,
}

impl MemoryStore {
    fn check_unique(&self, url: &str, derived_from: Option<&str>, skip_id: Option<&str>) -> Result<()> {
        let others = self.articles.iter().filter(|a| Some(a.id.as_str()) != skip_id);
        for existing in others {
            if existing.url == url {
                return Err(Error::Conflict(format!("An article with URL {} already exists", url)));
            }
            if let Some(original) = derived_from {
                if existing.is_optimized && existing.original_article_id.as_deref() == Some(original) {
                    return Err(Error::Conflict(format!(
                        "Article {} already has an optimized version",
                        original
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn insert(&mut self, article: NewArticle) -> Result<SourceArticle> {
        article.validate()?;
        let derived_from = article
            .is_optimized
            .then(|| article.original_article_id.clone())
            .flatten();
        self.check_unique(article.url.trim(), derived_from.as_deref(), None)?;

        let stored = article.into_article(Uuid::new_v4().to_string(), Utc::now());
        self.articles.push(stored.clone());
        Ok(stored)
    }

    pub fn get(&self, id: &str) -> Option<SourceArticle> {
        self.articles.iter().find(|a| a.id == id).cloned()
    }

    pub fn find_by_url(&self, url: &str) -> Option<SourceArticle> {
        let url = url.trim();
        self.articles.iter().find(|a| a.url == url).cloned()
    }

    pub fn find_optimized_for(&self, original_id: &str) -> Option<SourceArticle> {
        self.articles
            .iter()
            .find(|a| a.is_optimized && a.original_article_id.as_deref() == Some(original_id))
            .cloned()
    }

    pub fn list(&self, filter: &ArticleFilter, page: usize, limit: usize) -> Page<SourceArticle> {
        // Newest first; insertion order breaks timestamp ties.
        let mut sorted: Vec<&SourceArticle> = self
            .articles
            .iter()
            .rev()
            .filter(|a| filter.matches(a))
            .collect();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = sorted.len();
        let items = sorted
            .into_iter()
            .skip(Page::<SourceArticle>::offset(page, limit))
            .take(limit)
            .cloned()
            .collect();
        Page::new(items, total, page, limit)
    }

    pub fn update(&mut self, id: &str, patch: ArticlePatch) -> Result<Option<SourceArticle>> {
        patch.validate()?;
        let Some(current) = self.get(id) else {
            return Ok(None);
        };

        let mut updated = current;
        patch.apply(&mut updated, Utc::now());
        updated.validate()?;
        let derived_from = updated
            .is_optimized
            .then(|| updated.original_article_id.clone())
            .flatten();
        self.check_unique(&updated.url, derived_from.as_deref(), Some(id))?;

        if let Some(slot) = self.articles.iter_mut().find(|a| a.id == id) {
            *slot = updated.clone();
        }
        Ok(Some(updated))
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.articles.len();
        self.articles.retain(|a| a.id != id);
        self.articles.len() != before
    }
}

/// Process-local document store. Enforces the same uniqueness rules as the
/// SQLite backend: one article per URL, one optimized derivative per source.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub async fn new() -> Result<Self> {
        Ok(Self::default())
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn new() -> Result<Self> {
        Ok(Self::default())
    }
}

#[async_trait]
impl ArticleStore for MemoryStorage {
    async fn create(&self, article: NewArticle) -> Result<SourceArticle> {
        self.store.write().await.insert(article)
    }

    async fn get(&self, id: &str) -> Result<Option<SourceArticle>> {
        Ok(self.store.read().await.get(id))
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<SourceArticle>> {
        Ok(self.store.read().await.find_by_url(url))
    }

    async fn find_optimized_for(&self, original_id: &str) -> Result<Option<SourceArticle>> {
        Ok(self.store.read().await.find_optimized_for(original_id))
    }

    async fn list(&self, filter: &ArticleFilter, page: usize, limit: usize) -> Result<Page<SourceArticle>> {
        Ok(self.store.read().await.list(filter, page, limit))
    }

    async fn update(&self, id: &str, patch: ArticlePatch) -> Result<Option<SourceArticle>> {
        self.store.write().await.update(id, patch)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.store.write().await.delete(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_article(url: &str) -> NewArticle {
        NewArticle {
            title: "Test Article".to_string(),
            url: url.to_string(),
            content: "This is a test article about chatbots.".to_string(),
            ..Default::default()
        }
    }

    fn derived_from(original: &SourceArticle) -> NewArticle {
        NewArticle {
            is_optimized: true,
            original_article_id: Some(original.id.clone()),
            ..new_article(&format!("{}?optimized=true", original.url))
        }
    }

    #[tokio::test]
    async fn test_memory_storage_crud() {
        let storage = MemoryStorage::new().await.unwrap();
        let created = storage.create(new_article("https://test.com/a")).await.unwrap();
        assert!(!created.id.is_empty());
        assert!(!created.is_optimized);

        let fetched = storage.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(
            storage.find_by_url("https://test.com/a").await.unwrap().map(|a| a.id),
            Some(created.id.clone())
        );

        let patch = ArticlePatch {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        let updated = storage.update(&created.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.title, "Renamed");
        assert!(updated.updated_at >= created.updated_at);

        assert!(storage.delete(&created.id).await.unwrap());
        assert!(!storage.delete(&created.id).await.unwrap());
        assert!(storage.get(&created.id).await.unwrap().is_none());
        assert!(storage.update("missing", ArticlePatch::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_url_is_conflict() {
        let storage = MemoryStorage::new().await.unwrap();
        storage.create(new_article("https://test.com/a")).await.unwrap();
        let result = storage.create(new_article("https://test.com/a")).await;
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[tokio::test]
    async fn test_single_optimized_derivative() {
        let storage = MemoryStorage::new().await.unwrap();
        let original = storage.create(new_article("https://test.com/a")).await.unwrap();
        let derived = storage.create(derived_from(&original)).await.unwrap();

        let found = storage.find_optimized_for(&original.id).await.unwrap().unwrap();
        assert_eq!(found.id, derived.id);

        let mut second = derived_from(&original);
        second.url = "https://test.com/a?optimized=true&v=2".to_string();
        assert!(matches!(storage.create(second).await, Err(Error::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_cannot_orphan_optimized_flag() {
        let storage = MemoryStorage::new().await.unwrap();
        let source = storage.create(new_article("https://test.com/a")).await.unwrap();
        let patch = ArticlePatch {
            is_optimized: Some(true),
            ..Default::default()
        };
        let result = storage.update(&source.id, patch).await;
        assert!(matches!(result, Err(Error::Validation(_))));

        let stored = storage.get(&source.id).await.unwrap().unwrap();
        assert!(!stored.is_optimized);
    }

    #[tokio::test]
    async fn test_find_by_url_ignores_surrounding_whitespace() {
        let storage = MemoryStorage::new().await.unwrap();
        let created = storage.create(new_article("  https://test.com/a ")).await.unwrap();
        assert_eq!(created.url, "https://test.com/a");

        let found = storage.find_by_url(" https://test.com/a ").await.unwrap();
        assert_eq!(found.map(|a| a.id), Some(created.id));
    }

    #[tokio::test]
    async fn test_list_page_far_past_the_end_is_empty() {
        let storage = MemoryStorage::new().await.unwrap();
        storage.create(new_article("https://test.com/a")).await.unwrap();

        let page = storage.list(&ArticleFilter::default(), usize::MAX / 2, 100).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_list_filters_and_paginates() {
        let storage = MemoryStorage::new().await.unwrap();
        let mut originals = Vec::new();
        for i in 0..5 {
            originals.push(storage.create(new_article(&format!("https://test.com/{}", i))).await.unwrap());
        }
        storage.create(derived_from(&originals[0])).await.unwrap();

        let all = storage.list(&ArticleFilter::default(), 1, 10).await.unwrap();
        assert_eq!(all.total, 6);

        let pending = storage.list(&ArticleFilter::pending(), 1, 2).await.unwrap();
        assert_eq!(pending.total, 5);
        assert_eq!(pending.items.len(), 2);
        assert_eq!(pending.pages, 3);
        assert_eq!(pending.items[0].url, "https://test.com/4");

        let last = storage.list(&ArticleFilter::pending(), 3, 2).await.unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].url, "https://test.com/0");

        let optimized = ArticleFilter {
            is_optimized: Some(true),
            ..Default::default()
        };
        assert_eq!(storage.list(&optimized, 1, 10).await.unwrap().total, 1);
    }
}
