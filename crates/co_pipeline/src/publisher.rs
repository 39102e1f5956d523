use chrono::Utc;
use co_core::text::excerpt;
use co_core::{ArticleStore, Error, NewArticle, Reference, Result, SourceArticle};
use serde_json::{json, Map};
use std::sync::Arc;
use tracing::{info, warn};

const REFERENCES_INTRO: &str =
    "This article was optimized based on analysis of the following top-ranking articles:";

/// Stores a rewrite as the single optimized derivative of its source.
pub struct Publisher {
    store: Arc<dyn ArticleStore>,
    llm_model: String,
    excerpt_chars: usize,
}

impl Publisher {
    pub fn new(store: Arc<dyn ArticleStore>, llm_model: impl Into<String>, excerpt_chars: usize) -> Self {
        Self {
            store,
            llm_model: llm_model.into(),
            excerpt_chars,
        }
    }

    /// Returns the existing derivative instead of writing a second one.
    pub async fn publish(
        &self,
        original: &SourceArticle,
        rewritten: &str,
        references: &[Reference],
    ) -> Result<SourceArticle> {
        if let Some(existing) = self.store.find_optimized_for(&original.id).await? {
            info!("♻️ \"{}\" already has an optimized version", original.title);
            return Ok(existing);
        }

        let derivative = self.build(original, rewritten, references);
        match self.store.create(derivative).await {
            Ok(stored) => {
                info!("💾 Published \"{}\" ({})", stored.title, stored.id);
                Ok(stored)
            }
            Err(Error::Conflict(message)) => {
                warn!("Concurrent publish detected for {}: {}", original.id, message);
                self.store
                    .find_optimized_for(&original.id)
                    .await?
                    .ok_or(Error::Conflict(message))
            }
            Err(e) => Err(e),
        }
    }

    fn build(&self, original: &SourceArticle, rewritten: &str, references: &[Reference]) -> NewArticle {
        let mut metadata = Map::new();
        metadata.insert("optimizedAt".to_string(), json!(Utc::now().to_rfc3339()));
        metadata.insert("llmModel".to_string(), json!(self.llm_model));
        metadata.insert("referenceCount".to_string(), json!(references.len()));

        NewArticle {
            title: format!("{} (Optimized)", original.title),
            url: derivative_url(&original.url),
            content: compose_content(original, rewritten, references),
            excerpt: Some(excerpt(rewritten, self.excerpt_chars)),
            author: original.author.clone(),
            published_date: original.published_date,
            is_optimized: true,
            original_article_id: Some(original.id.clone()),
            references: references.to_vec(),
            metadata,
        }
    }
}

/// Rewritten body followed by the citation block.
pub fn compose_content(original: &SourceArticle, rewritten: &str, references: &[Reference]) -> String {
    let citations = references
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. [{}]({})", i + 1, r.title, r.url))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{}\n\n---\n\n## References\n\n{}\n\n{}\n\n*Original article: [{}]({})*",
        rewritten, REFERENCES_INTRO, citations, original.title, original.url
    )
}

pub fn derivative_url(url: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}optimized=true", url, separator)
}
