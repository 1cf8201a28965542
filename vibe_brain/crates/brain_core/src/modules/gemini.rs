use crate::modules::config::{ConfigError, GeminiAuth, GeminiConfig};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use url::Url;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid gemini endpoint: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid gemini url: {0}")]
    Url(#[from] url::ParseError),
    #[error("gemini request failed: status={status} body={body}")]
    BadStatus { status: StatusCode, body: String },
    #[error("gemini auth error: {0}")]
    Auth(String),
    #[error("gemini blocked the prompt: {0}")]
    Blocked(String),
    #[error("gemini response envelope invalid: {0}")]
    Envelope(String),
}

/// Anything that can answer a prompt with schema-constrained JSON text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<String, GeminiError>;
}

/// Client for the Generative Language `generateContent` endpoint.
///
/// Construct it once and hand it to whoever needs it; the inner `reqwest::Client` pools
/// connections across calls.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, GeminiError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, config })
    }

    pub fn model(&self) -> &str {
        self.config.model()
    }

    fn endpoint(&self) -> Result<Url, GeminiError> {
        let base = self.config.base_url()?;
        Ok(base.join(&format!(
            "v1beta/models/{}:generateContent",
            self.config.model()
        ))?)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<String, GeminiError> {
        let url = self.endpoint()?;

        let payload = json!({
            "contents": [
                { "role": "user", "parts": [ { "text": prompt } ] }
            ],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema
            }
        });

        // Keep credentials out of the URL: reqwest error text includes it.
        let mut req = self.http.post(url).json(&payload);
        match &self.config.auth {
            GeminiAuth::ApiKey(key) => req = req.header(API_KEY_HEADER, key.as_str()),
            GeminiAuth::AccessToken(token) => req = req.bearer_auth(token.as_str()),
            GeminiAuth::None => log::debug!("sending gemini request without credentials"),
        }

        log::debug!("gemini generateContent model={}", self.config.model());
        let resp = req.send().await?;

        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            return extract_candidate_text(&body);
        }

        let body = resp.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GeminiError::Auth(format!("status={status} body={body}")));
        }
        Err(GeminiError::BadStatus { status, body })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    candidates: Option<Vec<Candidate>>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    parts: Option<Vec<Part>>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

/// Pulls the text of the first candidate out of a `generateContent` response body.
pub fn extract_candidate_text(body: &str) -> Result<String, GeminiError> {
    let env: Envelope =
        serde_json::from_str(body).map_err(|e| GeminiError::Envelope(format!("{e}: {body}")))?;

    let parts = env
        .candidates
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.content)
        .and_then(|c| c.parts);

    let Some(parts) = parts else {
        if let Some(reason) = env.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(GeminiError::Blocked(reason));
        }
        return Err(GeminiError::Envelope(format!(
            "missing candidates.content.parts: {body}"
        )));
    };

    let text: String = parts
        .into_iter()
        .filter(|p| !p.thought)
        .filter_map(|p| p.text)
        .collect();
    if text.is_empty() {
        return Err(GeminiError::Envelope(format!(
            "missing candidates.content.parts.text: {body}"
        )));
    }
    Ok(text)
}
