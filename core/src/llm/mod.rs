//! Text-generation backends
//!
//! Every hosted model the team can deploy is a closed `BackendId` variant.
//! The same backend may act as an intern (answers the product prompt) or a
//! reviewer (compares the interns' answers); the role is decided per run.
//!
//! # Main Types
//! - `BackendId`: named backend, with its provider, model and capabilities
//! - `Backend`: async capability to turn a prompt into text plus citations
//! - `BackendRegistry`: backends built once at start-up, keyed by id

pub mod gemini;
pub mod openai;
pub mod registry;

pub use gemini::GeminiBackend;
pub use openai::OpenAiCompatibleBackend;
pub use registry::BackendRegistry;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SherwoodError, UpstreamCause};

/// Hosted API family a backend talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Perplexity,
    OpenAi,
    Google,
}

impl Provider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Perplexity => "https://api.perplexity.ai",
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Google => "https://generativelanguage.googleapis.com",
        }
    }

    /// Environment variable holding this provider's API key
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Provider::Perplexity => "PERPLEXITY_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Google => "GOOGLE_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Perplexity => write!(f, "Perplexity"),
            Provider::OpenAi => write!(f, "OpenAI"),
            Provider::Google => write!(f, "Google"),
        }
    }
}

/// Named text-generation backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendId {
    /// Web-grounded, high quality general model
    Sonar,
    /// Web-grounded reasoning model
    Deepseek,
    /// Google model with search grounding
    Gemini,
    /// Reasoning model, no web access
    Oscar,
    /// Thinking model, no web access
    Graham,
    /// Fast and cheap general model
    Mini,
}

impl BackendId {
    pub const ALL: [BackendId; 6] = [
        BackendId::Sonar,
        BackendId::Deepseek,
        BackendId::Gemini,
        BackendId::Oscar,
        BackendId::Graham,
        BackendId::Mini,
    ];

    pub fn default_interns() -> Vec<BackendId> {
        vec![BackendId::Sonar, BackendId::Deepseek, BackendId::Gemini]
    }

    pub fn default_reviewers() -> Vec<BackendId> {
        vec![BackendId::Graham, BackendId::Oscar]
    }

    pub fn name(&self) -> &'static str {
        match self {
            BackendId::Sonar => "Sonar",
            BackendId::Deepseek => "Deepseek",
            BackendId::Gemini => "Gemini",
            BackendId::Oscar => "Oscar",
            BackendId::Graham => "Graham",
            BackendId::Mini => "Mini",
        }
    }

    /// Lowercase key used in config files and on the command line
    pub fn key(&self) -> &'static str {
        match self {
            BackendId::Sonar => "sonar",
            BackendId::Deepseek => "deepseek",
            BackendId::Gemini => "gemini",
            BackendId::Oscar => "oscar",
            BackendId::Graham => "graham",
            BackendId::Mini => "mini",
        }
    }

    pub fn provider(&self) -> Provider {
        match self {
            BackendId::Sonar | BackendId::Deepseek => Provider::Perplexity,
            BackendId::Oscar | BackendId::Mini => Provider::OpenAi,
            BackendId::Gemini | BackendId::Graham => Provider::Google,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            BackendId::Sonar => "sonar-pro",
            BackendId::Deepseek => "sonar-reasoning",
            BackendId::Gemini => "gemini-1.5-pro-002",
            BackendId::Oscar => "o1",
            BackendId::Graham => "gemini-2.0-flash-thinking-exp-01-21",
            BackendId::Mini => "gpt-4o-mini",
        }
    }

    /// Whether the backend can consult external sources.
    ///
    /// Declared capability only; nothing stops a reviewer without web
    /// access from being used as an intern.
    pub fn has_web_access(&self) -> bool {
        matches!(self, BackendId::Sonar | BackendId::Deepseek | BackendId::Gemini)
    }

    pub fn description(&self) -> String {
        format!("{} by {}", self.default_model(), self.provider())
    }
}

impl std::str::FromStr for BackendId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        BackendId::ALL
            .iter()
            .copied()
            .find(|id| id.key() == wanted)
            .ok_or_else(|| format!("Unknown backend: {}", s))
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Source surfaced by a grounded backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: Option<String>,
    pub url: String,
}

impl Citation {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            title: None,
            url: url.into(),
        }
    }

    pub fn titled(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            url: url.into(),
        }
    }
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.title {
            Some(title) => write!(f, "[{}]({})", title, self.url),
            None => f.write_str(&self.url),
        }
    }
}

/// Text returned by a single backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// Sampling knobs forwarded to the provider
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    /// `None` leaves the provider default in place
    pub temperature: Option<f32>,
    pub candidate_count: u32,
    /// Turn Google's harm-category filters down to BLOCK_NONE
    pub block_none_safety: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: Some(0.5),
            candidate_count: 1,
            block_none_safety: true,
        }
    }
}

impl GenerationOptions {
    /// Options for reviewers and helper calls: provider defaults only.
    pub fn provider_defaults() -> Self {
        Self {
            temperature: None,
            candidate_count: 1,
            block_none_safety: false,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A hosted text-generation capability
#[async_trait]
pub trait Backend: Send + Sync {
    fn id(&self) -> BackendId;

    /// Send `prompt` as the sole user input and return the answer.
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<Generation>;
}

/// Map a non-success HTTP status into an upstream error for `backend`.
pub(crate) fn status_error(backend: BackendId, status: StatusCode, body: &str) -> SherwoodError {
    let cause = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UpstreamCause::Unauthorized {
            status: status.as_u16(),
        },
        StatusCode::TOO_MANY_REQUESTS => UpstreamCause::Quota,
        _ => {
            let message = serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| {
                    v.get("error")
                        .and_then(|e| e.get("message").or(Some(e)))
                        .and_then(|m| m.as_str().map(str::to_string))
                })
                .unwrap_or_else(|| body.chars().take(200).collect());
            UpstreamCause::Provider {
                status: status.as_u16(),
                message,
            }
        }
    };
    SherwoodError::upstream(backend, cause)
}

pub(crate) fn transport_error(backend: BackendId, err: reqwest::Error) -> SherwoodError {
    SherwoodError::upstream(backend, UpstreamCause::Transport(err.to_string()))
}

pub(crate) fn malformed(backend: BackendId, detail: impl Into<String>) -> SherwoodError {
    SherwoodError::upstream(backend, UpstreamCause::Malformed(detail.into()))
}
