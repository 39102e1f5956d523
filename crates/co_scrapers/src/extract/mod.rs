//! Turns arbitrary web pages into clean reference text.

#[cfg(feature = "browser")]
mod browser;
pub mod cascade;
pub mod clean;
pub mod fetch;

use async_trait::async_trait;
use co_core::config::ExtractionConfig;
use co_core::text::{char_len, truncate_chars};
use co_core::{Error, ExtractedContent, Result};
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[cfg(feature = "browser")]
pub use browser::BrowserFetcher;
pub use cascade::{Candidate, Cascade, ContainerStrategy, DocumentStrategy, ExtractionStrategy};
pub use fetch::{HttpFetcher, PageFetcher};

use crate::utils;

/// Anything that can turn a URL into reference material. Failures are
/// absorbed and reported as `None`.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn extract(&self, url: &str) -> Option<ExtractedContent>;
}

/// Synchronous HTML-to-text half of the extractor: noise removal, title
/// lookup and the body cascade. Shared with the ingester.
pub struct HtmlExtractor {
    noise: Vec<Selector>,
    cascade: Cascade,
    max_content_chars: usize,
}

impl HtmlExtractor {
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let noise = utils::parse_selectors(&config.noise_selectors)?;

        let mut strategies: Vec<Box<dyn ExtractionStrategy>> = Vec::new();
        for container in &config.container_selectors {
            strategies.push(Box::new(ContainerStrategy::new(
                container.clone(),
                utils::parse_selector(container)?,
                utils::parse_selector(&config.fragment_selector)?,
                config.min_fragment_chars,
            )));
        }
        let fallback = DocumentStrategy::new(
            "paragraphs",
            utils::parse_selector(&config.fallback_selector)?,
            config.min_fragment_chars,
        );

        Ok(Self {
            noise,
            cascade: Cascade::new(strategies, Box::new(fallback), config.good_enough_chars),
            max_content_chars: config.max_content_chars,
        })
    }

    pub fn clean(&self, document: &mut Html) {
        clean::remove_noise(document, &self.noise);
    }

    pub fn title(&self, document: &Html) -> String {
        clean::extract_title(document)
    }

    pub fn body(&self, document: &Html) -> Candidate {
        self.cascade.run(document)
    }

    /// Full pass over a raw page; the body is capped at the configured
    /// number of characters.
    pub fn parse(&self, html: &str, url: &str) -> ExtractedContent {
        let mut document = Html::parse_document(html);
        self.clean(&mut document);
        let title = self.title(&document);
        let body = self.body(&document);
        debug!("{} chars from {} via {}", body.score(), url, body.strategy);

        ExtractedContent {
            title,
            url: url.to_string(),
            content: truncate_chars(&body.text, self.max_content_chars).to_string(),
        }
    }
}

pub struct ContentExtractor {
    http: Arc<dyn PageFetcher>,
    browser: Option<Arc<dyn PageFetcher>>,
    html: HtmlExtractor,
    browser_hosts: Vec<String>,
    min_http_yield_chars: usize,
}

impl ContentExtractor {
    /// Plain HTTP always; headless rendering too when built with the
    /// `browser` feature.
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        let http: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(&config)?);
        #[cfg(feature = "browser")]
        let browser: Option<Arc<dyn PageFetcher>> = Some(Arc::new(BrowserFetcher::new(&config)));
        #[cfg(not(feature = "browser"))]
        let browser: Option<Arc<dyn PageFetcher>> = None;
        Self::with_fetchers(config, http, browser)
    }

    pub fn with_fetchers(
        config: ExtractionConfig,
        http: Arc<dyn PageFetcher>,
        browser: Option<Arc<dyn PageFetcher>>,
    ) -> Result<Self> {
        Ok(Self {
            http,
            browser,
            html: HtmlExtractor::new(&config)?,
            browser_hosts: config.browser_hosts,
            min_http_yield_chars: config.min_http_yield_chars,
        })
    }

    fn wants_browser(&self, url: &str) -> bool {
        let Some(host) = url::Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_lowercase)) else {
            return false;
        };
        self.browser_hosts
            .iter()
            .any(|h| host == *h || host.ends_with(&format!(".{}", h)))
    }

    async fn extract_with(&self, fetcher: &dyn PageFetcher, url: &str) -> Result<ExtractedContent> {
        let html = fetcher.fetch(url).await?;
        let content = self.html.parse(&html, url);
        if content.content.is_empty() {
            return Err(Error::Scraping(format!("No readable text on {} via {}", url, fetcher.name())));
        }
        Ok(content)
    }

    /// Like [`ContentSource::extract`] but keeps the failure reason.
    pub async fn try_extract(&self, url: &str) -> Result<ExtractedContent> {
        let Some(browser) = self.browser.as_deref() else {
            return self.extract_with(self.http.as_ref(), url).await;
        };
        if self.wants_browser(url) {
            return self.extract_with(browser, url).await;
        }

        match self.extract_with(self.http.as_ref(), url).await {
            Ok(content) if char_len(&content.content) >= self.min_http_yield_chars => Ok(content),
            Ok(thin) => {
                debug!("Thin HTTP yield for {}, rendering in browser", url);
                match self.extract_with(browser, url).await {
                    Ok(rendered) if char_len(&rendered.content) > char_len(&thin.content) => Ok(rendered),
                    Ok(_) => Ok(thin),
                    Err(e) => {
                        warn!("Browser render failed for {}: {}", url, e);
                        Ok(thin)
                    }
                }
            }
            Err(http_error) => {
                debug!("HTTP fetch failed for {}: {}, rendering in browser", url, http_error);
                self.extract_with(browser, url).await
            }
        }
    }
}

#[async_trait]
impl ContentSource for ContentExtractor {
    async fn extract(&self, url: &str) -> Option<ExtractedContent> {
        info!("📄 Extracting {}", url);
        match self.try_extract(url).await {
            Ok(content) => {
                info!("✅ Extracted \"{}\" ({} chars)", content.title, char_len(&content.content));
                Some(content)
            }
            Err(e) => {
                warn!("⚠️ Failed to extract {}: {}", url, e);
                None
            }
        }
    }
}
