use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier recorded in the metadata of published articles.
    fn name(&self) -> &str;

    /// Run a single-message completion. An empty completion is `Ok("")`;
    /// transport, auth and quota failures are errors.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}
