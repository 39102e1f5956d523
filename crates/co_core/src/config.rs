use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{Error, Result};

const DESKTOP_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Every tunable of the optimization pipeline. Each section can be omitted
/// from a config file and falls back to its defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub search: SearchConfig,
    pub selection: SelectionConfig,
    pub extraction: ExtractionConfig,
    pub optimization: OptimizationConfig,
    pub orchestration: OrchestrationConfig,
    pub ingestion: IngestionConfig,
}

impl PipelineConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::Config(format!("Invalid pipeline config: {}", e)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Query string is appended URL-encoded.
    pub endpoint: String,
    pub result_selector: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub excluded_domains: Vec<String>,
    pub fallback_urls: Vec<String>,
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://html.duckduckgo.com/html/?q=".to_string(),
            result_selector: ".result__a".to_string(),
            user_agent: DESKTOP_USER_AGENT.to_string(),
            timeout_secs: 15,
            excluded_domains: vec![
                "youtube.com".to_string(),
                "facebook.com".to_string(),
                "twitter.com".to_string(),
                "instagram.com".to_string(),
                "duckduckgo.com".to_string(),
            ],
            fallback_urls: vec![
                "https://www.forbes.com/advisor/business/software/what-is-a-chatbot/".to_string(),
                "https://www.ibm.com/topics/chatbots".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionStrategy {
    /// Prefer URLs that look like articles, else the first two results.
    #[default]
    Keyword,
    /// The first two results, as returned by the search provider.
    FirstTwo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub strategy: SelectionStrategy,
    pub keywords: Vec<String>,
    pub generic_markers: Vec<String>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            strategy: SelectionStrategy::Keyword,
            keywords: ["blog", "article", "post", "news", "guide", "tutorial", "what-is", "how-to"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
            generic_markers: vec![".com/".to_string(), ".org/".to_string(), ".io/".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Removed from the document before any text pass.
    pub noise_selectors: Vec<String>,
    /// Candidate containers, highest priority first.
    pub container_selectors: Vec<String>,
    pub fragment_selector: String,
    pub fallback_selector: String,
    /// Fragments of this many characters or fewer are dropped.
    pub min_fragment_chars: usize,
    /// A candidate is accepted once its joined text is longer than this.
    pub good_enough_chars: usize,
    pub max_content_chars: usize,
    /// Hosts that are always rendered with the headless browser.
    pub browser_hosts: Vec<String>,
    /// Plain-HTTP body text shorter than this is retried in the browser.
    pub min_http_yield_chars: usize,
    pub network_idle_timeout_secs: u64,
    pub selector_timeout_secs: u64,
    pub content_ready_selector: String,
}

impl ExtractionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn network_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.network_idle_timeout_secs)
    }

    pub fn selector_timeout(&self) -> Duration {
        Duration::from_secs(self.selector_timeout_secs)
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            user_agent: DESKTOP_USER_AGENT.to_string(),
            timeout_secs: 15,
            noise_selectors: [
                "script",
                "style",
                "noscript",
                "iframe",
                "nav",
                "header",
                "footer",
                "aside",
                ".navigation",
                ".comments",
                "#comments",
                ".sidebar",
                ".ads",
                ".advertisement",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            container_selectors: [
                "article",
                "[role=\"main\"]",
                "main",
                ".post-content",
                ".entry-content",
                ".article-content",
                ".content",
                "body",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            fragment_selector: "p, h1, h2, h3, h4, li".to_string(),
            fallback_selector: "p".to_string(),
            min_fragment_chars: 20,
            good_enough_chars: 500,
            max_content_chars: 10_000,
            browser_hosts: Vec::new(),
            min_http_yield_chars: 200,
            network_idle_timeout_secs: 30,
            selector_timeout_secs: 10,
            content_ready_selector: "article, main, [role=\"main\"], .content".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    pub temperature: f32,
    pub max_tokens: u32,
    pub original_excerpt_chars: usize,
    pub reference_excerpt_chars: usize,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 8192,
            original_excerpt_chars: 3000,
            reference_excerpt_chars: 2000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestrationConfig {
    /// Pause between successive outbound page fetches.
    pub politeness_delay_ms: u64,
    /// Articles processed per batch run.
    pub batch_limit: usize,
}

impl OrchestrationConfig {
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            politeness_delay_ms: 1000,
            batch_limit: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    pub seed_urls: Vec<String>,
    pub default_author: String,
    pub source_label: String,
    pub excerpt_chars: usize,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            seed_urls: [
                "https://beyondchats.com/blogs/google-ads-are-you-wasting-your-money-on-clicks/",
                "https://beyondchats.com/blogs/should-you-trust-ai-in-healthcare/",
                "https://beyondchats.com/blogs/why-we-are-building-yet-another-ai-chatbot/",
                "https://beyondchats.com/blogs/will-ai-understand-the-complexities-of-patient-care/",
                "https://beyondchats.com/blogs/choosing-the-right-ai-chatbot-a-guide/",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            default_author: "BeyondChats".to_string(),
            source_label: "BeyondChats Blog".to_string(),
            excerpt_chars: 200,
        }
    }
}
