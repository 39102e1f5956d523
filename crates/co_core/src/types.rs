use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

pub type ArticleId = String;

/// A source consulted while optimizing an article. Order reflects the order
/// in which the sources were consulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub title: String,
    pub url: String,
}

impl From<&ExtractedContent> for Reference {
    fn from(content: &ExtractedContent) -> Self {
        Self {
            title: content.title.clone(),
            url: content.url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceArticle {
    pub id: ArticleId,
    pub title: String,
    pub url: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub author: Option<String>,
    pub published_date: Option<DateTime<Utc>>,
    pub scraped_at: DateTime<Utc>,
    pub is_optimized: bool,
    pub original_article_id: Option<ArticleId>,
    pub references: Vec<Reference>,
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SourceArticle {
    /// Invariants that must hold for the merged record after an update.
    pub fn validate(&self) -> Result<()> {
        check_back_reference(self.is_optimized, self.original_article_id.as_deref())
    }
}

fn check_back_reference(is_optimized: bool, original_article_id: Option<&str>) -> Result<()> {
    if is_optimized && original_article_id.is_none() {
        return Err(Error::Validation(
            "optimized articles must reference their original article".to_string(),
        ));
    }
    Ok(())
}

/// Payload accepted by `ArticleStore::create`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArticle {
    pub title: String,
    pub url: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_optimized: bool,
    #[serde(default)]
    pub original_article_id: Option<ArticleId>,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl NewArticle {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("title is required".to_string()));
        }
        if self.url.trim().is_empty() {
            return Err(Error::Validation("url is required".to_string()));
        }
        url::Url::parse(self.url.trim()).map_err(|e| Error::InvalidUrl(format!("{}: {}", self.url, e)))?;
        if self.content.is_empty() {
            return Err(Error::Validation("content is required".to_string()));
        }
        check_back_reference(self.is_optimized, self.original_article_id.as_deref())
    }

    pub fn into_article(self, id: ArticleId, now: DateTime<Utc>) -> SourceArticle {
        SourceArticle {
            id,
            title: self.title.trim().to_string(),
            url: self.url.trim().to_string(),
            content: self.content,
            excerpt: self.excerpt.map(|e| e.trim().to_string()),
            author: self.author.map(|a| a.trim().to_string()),
            published_date: self.published_date,
            scraped_at: now,
            is_optimized: self.is_optimized,
            original_article_id: self.original_article_id,
            references: self.references,
            metadata: self.metadata,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub url: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub author: Option<String>,
    pub published_date: Option<DateTime<Utc>>,
    pub is_optimized: Option<bool>,
    pub original_article_id: Option<ArticleId>,
    pub references: Option<Vec<Reference>>,
    pub metadata: Option<Map<String, Value>>,
}

impl ArticlePatch {
    pub fn validate(&self) -> Result<()> {
        if matches!(&self.title, Some(t) if t.trim().is_empty()) {
            return Err(Error::Validation("title cannot be empty".to_string()));
        }
        if let Some(url) = &self.url {
            url::Url::parse(url.trim()).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
        }
        Ok(())
    }

    pub fn apply(self, article: &mut SourceArticle, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            article.title = title.trim().to_string();
        }
        if let Some(url) = self.url {
            article.url = url.trim().to_string();
        }
        if let Some(content) = self.content {
            article.content = content;
        }
        if let Some(excerpt) = self.excerpt {
            article.excerpt = Some(excerpt);
        }
        if let Some(author) = self.author {
            article.author = Some(author);
        }
        if let Some(published_date) = self.published_date {
            article.published_date = Some(published_date);
        }
        if let Some(is_optimized) = self.is_optimized {
            article.is_optimized = is_optimized;
        }
        if let Some(original) = self.original_article_id {
            article.original_article_id = Some(original);
        }
        if let Some(references) = self.references {
            article.references = references;
        }
        if let Some(metadata) = self.metadata {
            article.metadata = metadata;
        }
        article.updated_at = now;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleFilter {
    pub is_optimized: Option<bool>,
    pub original_article_id: Option<ArticleId>,
}

impl ArticleFilter {
    pub fn pending() -> Self {
        Self {
            is_optimized: Some(false),
            original_article_id: None,
        }
    }

    pub fn matches(&self, article: &SourceArticle) -> bool {
        if let Some(flag) = self.is_optimized {
            if article.is_optimized != flag {
                return false;
            }
        }
        if let Some(original) = &self.original_article_id {
            if article.original_article_id.as_ref() != Some(original) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub pages: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: usize, page: usize, limit: usize) -> Self {
        let pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            items,
            total,
            page,
            limit,
            pages,
        }
    }

    /// Zero-based offset of the first item for a one-based `page`.
    pub fn offset(page: usize, limit: usize) -> usize {
        page.saturating_sub(1).saturating_mul(limit)
    }
}

/// Title and cleaned body text pulled from a reference page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub title: String,
    pub url: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(is_optimized: bool, original: Option<&str>) -> SourceArticle {
        NewArticle {
            title: "Title".to_string(),
            url: "https://example.com/a".to_string(),
            content: "body".to_string(),
            is_optimized,
            original_article_id: original.map(str::to_string),
            ..Default::default()
        }
        .into_article("id".to_string(), Utc::now())
    }

    #[test]
    fn test_validate_requires_back_reference_for_optimized() {
        let new = NewArticle {
            title: "t".to_string(),
            url: "https://example.com".to_string(),
            content: "c".to_string(),
            is_optimized: true,
            ..Default::default()
        };
        assert!(matches!(new.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let new = NewArticle {
            title: "t".to_string(),
            url: "not a url".to_string(),
            content: "c".to_string(),
            ..Default::default()
        };
        assert!(matches!(new.validate(), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_filter_matches() {
        let source = article(false, None);
        let derived = article(true, Some("src"));

        assert!(ArticleFilter::pending().matches(&source));
        assert!(!ArticleFilter::pending().matches(&derived));

        let by_original = ArticleFilter {
            is_optimized: Some(true),
            original_article_id: Some("src".to_string()),
        };
        assert!(by_original.matches(&derived));
        assert!(!by_original.matches(&source));
        assert!(ArticleFilter::default().matches(&source));
    }

    #[test]
    fn test_page_count() {
        let page = Page::new(vec![1, 2], 11, 1, 5);
        assert_eq!(page.pages, 3);
        assert_eq!(Page::<u8>::offset(3, 5), 10);
        assert_eq!(Page::<u8>::offset(0, 5), 0);
        assert_eq!(Page::<u8>::offset(usize::MAX / 2, 100), usize::MAX);
    }

    #[test]
    fn test_patched_article_keeps_back_reference() {
        let mut source = article(false, None);
        ArticlePatch {
            is_optimized: Some(true),
            ..Default::default()
        }
        .apply(&mut source, Utc::now());
        assert!(matches!(source.validate(), Err(Error::Validation(_))));

        assert!(article(true, Some("src")).validate().is_ok());
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(article(true, Some("src"))).unwrap();
        assert_eq!(json["isOptimized"], true);
        assert_eq!(json["originalArticleId"], "src");
    }
}
