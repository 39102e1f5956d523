use async_trait::async_trait;
use co_core::{GenerationRequest, Result, TextGenerator};
use std::fmt;

/// Offline generator: echoes the original title back as a markdown outline.
/// Useful for dry runs of the pipeline without provider credentials.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for DummyModel {
    fn name(&self) -> &str {
        "dummy"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let title = request
            .prompt
            .lines()
            .find_map(|line| line.strip_prefix("Title: "))
            .unwrap_or("Untitled");
        let words: Vec<&str> = request.prompt.split_whitespace().take(20).collect();
        Ok(format!("## {}\n\n- {}", title.trim(), words.join(" ")))
    }
}
