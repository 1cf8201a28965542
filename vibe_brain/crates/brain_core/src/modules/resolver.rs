use crate::modules::gemini::{GeminiError, TextGenerator};
use crate::modules::protocol::VibeParams;
use crate::modules::system_prompt::{build_prompt, response_schema};
use crate::modules::value_resolver::{parse_vibe_params, FormatError};
use thiserror::Error;

/// The only error callers of [`VibeSettingsResolver::resolve`] see. The underlying cause is
/// logged, never attached.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Failed to get mood settings from AI. Please check your prompt or API key.")]
pub struct ResolutionError;

#[derive(Debug, Error)]
enum ResolveFailure {
    #[error(transparent)]
    Transport(#[from] GeminiError),
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Maps a free-text scene description onto effect parameters via a text generator.
///
/// Holds no state between calls; `resolve` can run concurrently from as many tasks as needed.
pub struct VibeSettingsResolver<G> {
    generator: G,
}

impl<G: TextGenerator> VibeSettingsResolver<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn into_inner(self) -> G {
        self.generator
    }

    /// One request, no retries. Out-of-range values are returned unchanged.
    pub async fn resolve(&self, prompt: &str) -> Result<VibeParams, ResolutionError> {
        self.try_resolve(prompt).await.map_err(|e| {
            log::error!("error generating mood settings from Gemini: {e}");
            ResolutionError
        })
    }

    async fn try_resolve(&self, prompt: &str) -> Result<VibeParams, ResolveFailure> {
        let instruction = build_prompt(prompt);
        let schema = response_schema();
        let text = self.generator.generate_json(&instruction, &schema).await?;
        Ok(parse_vibe_params(&text)?)
    }
}
