//! OpenAI-compatible chat completions backend.
//!
//! Serves both Perplexity (Sonar, Deepseek) and OpenAI (Oscar, Mini).
//! Perplexity attaches its sources to the completion, either as
//! `search_results` with titles or as a bare `citations` URL list.

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client as HttpClient};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{malformed, status_error, transport_error, Backend, BackendId, Citation, Generation, GenerationOptions};
use crate::error::{Result, SherwoodError, UpstreamCause};

pub struct OpenAiCompatibleBackend {
    id: BackendId,
    endpoint: String,
    model: String,
    api_key: String,
    /// Reasoning models (o1) reject any explicit temperature
    accepts_temperature: bool,
    http_client: HttpClient,
}

impl OpenAiCompatibleBackend {
    pub fn new(
        id: BackendId,
        base_url: &str,
        model: impl Into<String>,
        api_key: impl Into<String>,
        http_client: HttpClient,
    ) -> Self {
        let endpoint = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        Self {
            id,
            endpoint,
            model: model.into(),
            api_key: api_key.into(),
            accepts_temperature: true,
            http_client,
        }
    }

    /// Never send `temperature`, whatever the caller's options say.
    pub fn without_temperature(mut self) -> Self {
        self.accepts_temperature = false;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Backend for OpenAiCompatibleBackend {
    fn id(&self) -> BackendId {
        self.id
    }

    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<Generation> {
        let body = CompletionRequest {
            model: &self.model,
            messages: vec![RequestMessage {
                role: "user",
                content: prompt,
            }],
            temperature: options.temperature.filter(|_| self.accepts_temperature),
            n: (options.candidate_count > 1).then_some(options.candidate_count),
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(self.id, e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| transport_error(self.id, e))?;
        debug!(
            "{} response status: {}, preview: {}",
            self.id,
            status,
            text.chars().take(500).collect::<String>()
        );

        if !status.is_success() {
            return Err(status_error(self.id, status, &text));
        }
        parse_completion(self.id, &text)
    }
}

/// Decode a chat completion body into text and citations.
pub(crate) fn parse_completion(id: BackendId, body: &str) -> Result<Generation> {
    let completion: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| malformed(id, format!("failed to decode completion: {}", e)))?;

    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| malformed(id, "no choices in completion"))?;

    let text = choice.message.content.unwrap_or_default();
    if text.trim().is_empty() {
        if choice.finish_reason.as_deref() == Some("content_filter") {
            return Err(SherwoodError::upstream(
                id,
                UpstreamCause::ContentFiltered {
                    reason: "content_filter".to_string(),
                },
            ));
        }
        return Err(malformed(id, "completion has no content"));
    }

    let citations = if completion.search_results.is_empty() {
        completion.citations.into_iter().map(Citation::url).collect()
    } else {
        completion
            .search_results
            .into_iter()
            .map(|r| Citation {
                title: r.title.filter(|t| !t.is_empty()),
                url: r.url,
            })
            .collect()
    };

    Ok(Generation { text, citations })
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<RequestMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    n: Option<u32>,
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    citations: Vec<String>,
    #[serde(default)]
    search_results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: Option<String>,
    url: String,
}
