use co_core::text::char_len;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// Body text produced by one extraction strategy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub strategy: String,
    pub text: String,
}

impl Candidate {
    /// Quality score: length of the joined text in characters.
    pub fn score(&self) -> usize {
        char_len(&self.text)
    }
}

pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// `None` when the structure this strategy looks for is absent.
    fn extract(&self, document: &Html) -> Option<Candidate>;
}

fn fragment_text(el: ElementRef, min_chars: usize) -> Option<String> {
    let text = el.text().collect::<String>().trim().to_string();
    (char_len(&text) > min_chars).then_some(text)
}

/// Text fragments found under every element matching a container selector.
pub struct ContainerStrategy {
    name: String,
    container: Selector,
    fragments: Selector,
    min_fragment_chars: usize,
}

impl ContainerStrategy {
    pub fn new(name: impl Into<String>, container: Selector, fragments: Selector, min_fragment_chars: usize) -> Self {
        Self {
            name: name.into(),
            container,
            fragments,
            min_fragment_chars,
        }
    }
}

impl ExtractionStrategy for ContainerStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self, document: &Html) -> Option<Candidate> {
        let containers: Vec<ElementRef> = document.select(&self.container).collect();
        if containers.is_empty() {
            return None;
        }

        // Nested containers share descendants; count each fragment once.
        let mut seen = HashSet::new();
        let parts: Vec<String> = containers
            .iter()
            .flat_map(|container| container.select(&self.fragments))
            .filter(|el| seen.insert(el.id()))
            .filter_map(|el| fragment_text(el, self.min_fragment_chars))
            .collect();

        Some(Candidate {
            strategy: self.name.clone(),
            text: parts.join("\n\n"),
        })
    }
}

/// Every matching element in the whole document, container or not.
pub struct DocumentStrategy {
    name: String,
    fragments: Selector,
    min_fragment_chars: usize,
}

impl DocumentStrategy {
    pub fn new(name: impl Into<String>, fragments: Selector, min_fragment_chars: usize) -> Self {
        Self {
            name: name.into(),
            fragments,
            min_fragment_chars,
        }
    }
}

impl ExtractionStrategy for DocumentStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self, document: &Html) -> Option<Candidate> {
        let parts: Vec<String> = document
            .select(&self.fragments)
            .filter_map(|el| fragment_text(el, self.min_fragment_chars))
            .collect();
        Some(Candidate {
            strategy: self.name.clone(),
            text: parts.join("\n\n"),
        })
    }
}

/// Ordered strategies tried until one scores above `good_enough`. When the
/// last present candidate still scores below it, `fallback` runs instead.
pub struct Cascade {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    fallback: Box<dyn ExtractionStrategy>,
    good_enough: usize,
}

impl Cascade {
    pub fn new(
        strategies: Vec<Box<dyn ExtractionStrategy>>,
        fallback: Box<dyn ExtractionStrategy>,
        good_enough: usize,
    ) -> Self {
        Self {
            strategies,
            fallback,
            good_enough,
        }
    }

    pub fn run(&self, document: &Html) -> Candidate {
        let mut current: Option<Candidate> = None;
        for strategy in &self.strategies {
            if let Some(candidate) = strategy.extract(document) {
                let accepted = candidate.score() > self.good_enough;
                current = Some(candidate);
                if accepted {
                    break;
                }
            }
        }

        match current {
            Some(candidate) if candidate.score() >= self.good_enough => candidate,
            _ => self.fallback.extract(document).unwrap_or_default(),
        }
    }
}
