pub mod models;
pub mod optimizer;
pub mod prompt;

/// Selects and authenticates the text-generation provider.
#[derive(Clone, Default)]
pub struct Config {
    /// Provider: `groq`, `openai` or `dummy`.
    pub provider: String,
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub base_url: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("model_name", &self.model_name)
            .field("base_url", &self.base_url)
            .finish()
    }
}

pub use models::create_model;
pub use optimizer::Optimizer;
pub use prompt::build_optimization_prompt;

pub mod prelude {
    pub use super::models::create_model;
    pub use super::{Config, Optimizer};
    pub use co_core::{Error, ExtractedContent, Result, SourceArticle, TextGenerator};
}
