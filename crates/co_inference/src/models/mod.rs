use co_core::{Error, Result, TextGenerator};
use std::sync::Arc;

use crate::Config;

pub mod chat;
pub mod dummy;

pub use chat::ChatCompletionsModel;
pub use dummy::DummyModel;

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const GROQ_DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Build the configured text generator. Remote providers without an API
/// key fail here, before any article is touched.
pub async fn create_model(config: Option<Config>) -> Result<Arc<dyn TextGenerator>> {
    let config = config.unwrap_or_default();
    let provider = if config.provider.is_empty() {
        "groq"
    } else {
        config.provider.as_str()
    };

    let (base_url, default_model) = match provider {
        "groq" => (GROQ_BASE_URL, GROQ_DEFAULT_MODEL),
        "openai" => (OPENAI_BASE_URL, OPENAI_DEFAULT_MODEL),
        "dummy" => return Ok(Arc::new(DummyModel::new())),
        other => {
            return Err(Error::Config(format!(
                "Unknown model provider: {} (available: groq, openai, dummy)",
                other
            )))
        }
    };

    let model = ChatCompletionsModel::new(
        config.api_key,
        config.base_url.as_deref().unwrap_or(base_url),
        config.model_name.as_deref().unwrap_or(default_model),
    )?;
    tracing::info!("🧠 Using {} via {}", model.name(), provider);
    Ok(Arc::new(model))
}
