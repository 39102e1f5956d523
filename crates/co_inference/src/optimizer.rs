use co_core::config::OptimizationConfig;
use co_core::{Error, ExtractedContent, GenerationRequest, Result, SourceArticle, TextGenerator};
use std::sync::Arc;
use tracing::info;

use crate::prompt::{build_optimization_prompt, MAX_PROMPT_REFERENCES};

/// Turns an article plus one or two reference extractions into a rewritten
/// markdown body.
#[derive(Clone)]
pub struct Optimizer {
    model: Arc<dyn TextGenerator>,
    config: OptimizationConfig,
}

impl Optimizer {
    pub fn new(model: Arc<dyn TextGenerator>, config: OptimizationConfig) -> Self {
        Self { model, config }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub async fn optimize(&self, original: &SourceArticle, references: &[ExtractedContent]) -> Result<String> {
        if references.is_empty() {
            return Err(Error::Validation(
                "At least one reference article is required to optimize".to_string(),
            ));
        }
        let references = &references[..references.len().min(MAX_PROMPT_REFERENCES)];

        info!(
            "🤖 Optimizing \"{}\" with {} using {} reference(s)",
            original.title,
            self.model.name(),
            references.len()
        );
        let request = GenerationRequest {
            prompt: build_optimization_prompt(original, references, &self.config),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };
        self.model.generate(&request).await
    }
}
