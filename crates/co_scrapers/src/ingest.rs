use chrono::{DateTime, Utc};
use co_core::config::{ExtractionConfig, IngestionConfig};
use co_core::text::{excerpt, word_count};
use co_core::{ArticleStore, Error, NewArticle, Result, SourceArticle};
use scraper::Html;
use serde::Serialize;
use serde_json::{json, Map};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::extract::{HtmlExtractor, PageFetcher};
use crate::utils;

const AUTHOR_SELECTORS: [&str; 2] = [".author", "[rel=\"author\"]"];

#[derive(Debug, Clone, Serialize)]
pub struct IngestFailure {
    pub url: String,
    pub error: String,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct IngestReport {
    pub created: Vec<SourceArticle>,
    pub skipped: Vec<String>,
    pub failed: Vec<IngestFailure>,
}

/// Seeds the store with source articles scraped from the blog.
pub struct ArticleIngester {
    store: Arc<dyn ArticleStore>,
    fetcher: Arc<dyn PageFetcher>,
    html: HtmlExtractor,
    config: IngestionConfig,
    delay: Duration,
}

impl ArticleIngester {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        fetcher: Arc<dyn PageFetcher>,
        extraction: &ExtractionConfig,
        config: IngestionConfig,
        delay: Duration,
    ) -> Result<Self> {
        Ok(Self {
            store,
            fetcher,
            html: HtmlExtractor::new(extraction)?,
            config,
            delay,
        })
    }

    pub fn seed_urls(&self) -> &[String] {
        &self.config.seed_urls
    }

    /// Never fails as a whole; each URL lands in exactly one report bucket.
    pub async fn ingest(&self, urls: &[String]) -> IngestReport {
        let mut report = IngestReport::default();
        let mut fetched_any = false;

        for url in urls {
            match self.store.find_by_url(url).await {
                Ok(Some(_)) => {
                    info!("⏭️ Already stored: {}", url);
                    report.skipped.push(url.clone());
                    continue;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("❌ Store lookup failed for {}: {}", url, e);
                    report.failed.push(IngestFailure {
                        url: url.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            }

            if fetched_any && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            fetched_any = true;

            match self.ingest_one(url).await {
                Ok(article) => {
                    info!("✅ Stored \"{}\"", article.title);
                    report.created.push(article);
                }
                Err(e) => {
                    warn!("❌ Failed to ingest {}: {}", url, e);
                    report.failed.push(IngestFailure {
                        url: url.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "📊 Ingestion finished: {} created, {} skipped, {} failed",
            report.created.len(),
            report.skipped.len(),
            report.failed.len()
        );
        report
    }

    async fn ingest_one(&self, url: &str) -> Result<SourceArticle> {
        let html = self.fetcher.fetch(url).await?;
        let article = self.read_article(&html, url)?;
        self.store.create(article).await
    }

    /// Byline and date are read before cleaning; they usually live in
    /// header chrome that the cleaner removes.
    pub fn read_article(&self, html: &str, url: &str) -> Result<NewArticle> {
        let mut document = Html::parse_document(html);
        let author = self.find_author(&document);
        let published_date = find_published_date(&document);

        self.html.clean(&mut document);
        let title = self.html.title(&document);
        let content = self.html.body(&document).text;
        if content.is_empty() {
            return Err(Error::Scraping(format!("No readable content on {}", url)));
        }

        let mut metadata = Map::new();
        metadata.insert("scrapedFrom".to_string(), json!(self.config.source_label));
        metadata.insert("wordCount".to_string(), json!(word_count(&content)));

        Ok(NewArticle {
            title,
            url: url.to_string(),
            excerpt: Some(excerpt(&content, self.config.excerpt_chars)),
            content,
            author: Some(author),
            published_date,
            metadata,
            ..Default::default()
        })
    }

    fn find_author(&self, document: &Html) -> String {
        AUTHOR_SELECTORS
            .iter()
            .find_map(|selector| utils::extract_text(document, selector))
            .or_else(|| utils::extract_attr(document, "meta[name=\"author\"]", "content"))
            .or_else(|| utils::json_ld_values(document, "author").into_iter().next())
            .unwrap_or_else(|| self.config.default_author.clone())
    }
}

fn find_published_date(document: &Html) -> Option<DateTime<Utc>> {
    let candidates = [
        utils::extract_attr(document, "time[datetime]", "datetime"),
        utils::extract_attr(document, "meta[property=\"article:published_time\"]", "content"),
        utils::json_ld_values(document, "datePublished").into_iter().next(),
    ];
    candidates.into_iter().flatten().find_map(|raw| utils::parse_date(&raw))
}
