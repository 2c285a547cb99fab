use anyhow::Result;

/// A text-generation backend used for narrative summaries (e.g., Gemini).
#[async_trait::async_trait]
pub trait NarrativeBackend: Send + Sync {
    /// Returns the model's reply to `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
