use co_core::config::{SelectionConfig, SelectionStrategy};
use tracing::debug;

/// Never more than this many references feed a rewrite.
pub const MAX_REFERENCES: usize = 2;

/// Picks which search results become reference material.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSelector {
    config: SelectionConfig,
}

impl ReferenceSelector {
    pub fn new(config: SelectionConfig) -> Self {
        Self { config }
    }

    /// Deterministic and pure: the same input list always yields the same
    /// selection, in input order, at most two entries.
    pub fn select_top(&self, urls: &[String]) -> Vec<String> {
        let selected = match self.config.strategy {
            SelectionStrategy::FirstTwo => first_n(urls),
            SelectionStrategy::Keyword => {
                let matching: Vec<String> = urls
                    .iter()
                    .filter(|url| self.looks_like_article(url))
                    .take(MAX_REFERENCES)
                    .cloned()
                    .collect();
                // A lone match is not enough to prefer over raw ranking.
                if matching.len() < MAX_REFERENCES {
                    first_n(urls)
                } else {
                    matching
                }
            }
        };
        debug!("Selected {} of {} candidate URLs", selected.len(), urls.len());
        selected
    }

    fn looks_like_article(&self, url: &str) -> bool {
        let lowered = url.to_lowercase();
        self.config
            .keywords
            .iter()
            .chain(self.config.generic_markers.iter())
            .any(|needle| lowered.contains(&needle.to_lowercase()))
    }
}

fn first_n(urls: &[String]) -> Vec<String> {
    urls.iter().take(MAX_REFERENCES).cloned().collect()
}
