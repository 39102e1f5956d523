use async_trait::async_trait;
use co_core::config::SearchConfig;
use co_core::{Error, Result};
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use url::Url;

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Candidate result URLs for `query`, in ranking order. Never fails:
    /// providers degrade to a fallback list instead.
    async fn search(&self, query: &str) -> Vec<String>;
}

/// Harvests organic results from DuckDuckGo's script-free HTML endpoint.
pub struct DuckDuckGoSearch {
    client: Client,
    config: SearchConfig,
}

impl DuckDuckGoSearch {
    pub fn new(config: SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;
        Ok(Self { client, config })
    }

    pub fn fallback_urls(&self) -> Vec<String> {
        self.config.fallback_urls.clone()
    }

    async fn fetch_results(&self, query: &str) -> Result<Vec<String>> {
        let url = format!("{}{}", self.config.endpoint, urlencoding::encode(query));
        let html = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_result_links(&html, &self.config.result_selector, &self.config.excluded_domains)
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    async fn search(&self, query: &str) -> Vec<String> {
        info!("🔍 Searching for \"{}\"", query);
        match self.fetch_results(query).await {
            Ok(links) if !links.is_empty() => {
                info!("✨ Found {} search results", links.len());
                debug!("Top results: {:?}", links.iter().take(3).collect::<Vec<_>>());
                links
            }
            Ok(_) => {
                warn!("⚠️ No usable search results for \"{}\", using fallback references", query);
                self.fallback_urls()
            }
            Err(e) => {
                warn!("⚠️ Search failed for \"{}\": {}. Using fallback references", query, e);
                self.fallback_urls()
            }
        }
    }
}

/// Pull result links out of a search result page, unwrapping redirect
/// wrappers and dropping excluded domains and duplicates.
pub fn parse_result_links(html: &str, result_selector: &str, excluded_domains: &[String]) -> Result<Vec<String>> {
    let selector = Selector::parse(result_selector)
        .map_err(|e| Error::Scraping(format!("Invalid result selector {}: {:?}", result_selector, e)))?;
    let document = Html::parse_document(html);

    let mut seen = HashSet::new();
    let links = document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(clean_result_href)
        .filter(|url| !is_excluded(url, excluded_domains))
        .filter(|url| seen.insert(url.clone()))
        .collect();
    Ok(links)
}

/// `//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fpost&rut=...`
/// becomes `https://example.com/post`. Everything after the first `&` of
/// the decoded URL is tracking noise.
pub fn clean_result_href(href: &str) -> Option<String> {
    let href = href.trim();
    let target = match href.find("uddg=") {
        Some(pos) => &href[pos + "uddg=".len()..],
        None => href,
    };
    let decoded = urlencoding::decode(target)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| target.to_string());
    let cleaned = decoded.split('&').next().unwrap_or_default().trim();

    if cleaned.starts_with("http://") || cleaned.starts_with("https://") {
        Some(cleaned.to_string())
    } else {
        None
    }
}

/// Unparseable URLs count as excluded.
pub fn is_excluded(url: &str, excluded_domains: &[String]) -> bool {
    let Some(host) = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_lowercase)) else {
        return true;
    };
    excluded_domains.iter().any(|domain| {
        let domain = domain.to_lowercase();
        host == domain || host.ends_with(&format!(".{}", domain))
    })
}
