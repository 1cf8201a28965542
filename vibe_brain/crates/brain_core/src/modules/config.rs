use std::fmt;
use thiserror::Error;
use url::Url;
use zeroize::Zeroizing;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base url {url:?}: {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("base url {0:?} cannot carry a path")]
    NotABase(String),
}

/// How requests authenticate against the Generative Language API.
#[derive(Clone, Default)]
pub enum GeminiAuth {
    /// AI Studio key, sent in the `x-goog-api-key` header.
    ApiKey(Zeroizing<String>),
    /// OAuth access token, sent as a bearer header.
    AccessToken(Zeroizing<String>),
    /// No credential. Requests still go out and the service decides.
    #[default]
    None,
}

impl GeminiAuth {
    pub fn api_key(key: impl Into<String>) -> Self {
        GeminiAuth::ApiKey(Zeroizing::new(key.into()))
    }

    pub fn access_token(token: impl Into<String>) -> Self {
        GeminiAuth::AccessToken(Zeroizing::new(token.into()))
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, GeminiAuth::None)
    }
}

impl fmt::Debug for GeminiAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeminiAuth::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            GeminiAuth::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
            GeminiAuth::None => f.write_str("None"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    model: String,
    /// `None` means [`DEFAULT_BASE_URL`]. Only set through `parse_base_url`.
    base_url: Option<Url>,
    pub auth: GeminiAuth,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            auth: GeminiAuth::None,
        }
    }
}

impl GeminiConfig {
    /// Reads `GEMINI_API_KEY` (or `API_KEY`), `GEMINI_ACCESS_TOKEN`, `GEMINI_MODEL` and
    /// `GEMINI_BASE_URL`. A missing credential only produces a warning.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = GeminiConfig::default();

        if let Some(model) = env_nonempty("GEMINI_MODEL") {
            cfg = cfg.with_model(model);
        }
        if let Some(base) = env_nonempty("GEMINI_BASE_URL") {
            cfg = cfg.with_base_url(&base)?;
        }

        cfg.auth = if let Some(key) =
            env_nonempty("GEMINI_API_KEY").or_else(|| env_nonempty("API_KEY"))
        {
            GeminiAuth::api_key(key)
        } else if let Some(token) = env_nonempty("GEMINI_ACCESS_TOKEN") {
            GeminiAuth::access_token(token)
        } else {
            log::warn!(
                "GEMINI_API_KEY environment variable not set; mood generation requests will likely be rejected"
            );
            GeminiAuth::None
        };

        Ok(cfg)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into().trim().to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn with_auth(mut self, auth: GeminiAuth) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = Some(parse_base_url(base_url)?);
        Ok(self)
    }

    pub fn base_url(&self) -> Result<Url, ConfigError> {
        match &self.base_url {
            Some(url) => Ok(url.clone()),
            None => parse_base_url(DEFAULT_BASE_URL),
        }
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Endpoint paths are joined onto the base, so it must end with `/` to keep any prefix.
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim()).map_err(|source| ConfigError::BaseUrl {
        url: raw.to_string(),
        source,
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::NotABase(raw.to_string()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    Ok(url)
}
