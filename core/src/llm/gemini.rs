//! Google Generative Language backend (Gemini, Graham).
//!
//! Gemini answers with Google Search grounding and reports its sources in
//! `groundingMetadata`. Graham runs a thinking model on the `v1alpha` API;
//! thought parts are requested and then left out of the returned text.

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client as HttpClient};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use super::{malformed, status_error, transport_error, Backend, BackendId, Citation, Generation, GenerationOptions};
use crate::error::{Result, SherwoodError, UpstreamCause};

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Search tool flavour; 1.5 models use retrieval, 2.x models use search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTool {
    Retrieval,
    Search,
}

impl SearchTool {
    /// Tool accepted by `model`: retrieval on 1.x, search from 2.0 on.
    pub fn for_model(model: &str) -> Self {
        if model.starts_with("gemini-1.") {
            SearchTool::Retrieval
        } else {
            SearchTool::Search
        }
    }

    fn key(&self) -> &'static str {
        match self {
            SearchTool::Retrieval => "google_search_retrieval",
            SearchTool::Search => "google_search",
        }
    }
}

pub struct GeminiBackend {
    id: BackendId,
    base_url: String,
    api_version: String,
    model: String,
    api_key: String,
    search_tool: Option<SearchTool>,
    include_thoughts: bool,
    http_client: HttpClient,
}

impl GeminiBackend {
    pub fn new(
        id: BackendId,
        base_url: &str,
        model: impl Into<String>,
        api_key: impl Into<String>,
        http_client: HttpClient,
    ) -> Self {
        Self {
            id,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version: "v1beta".to_string(),
            model: model.into(),
            api_key: api_key.into(),
            search_tool: None,
            include_thoughts: false,
            http_client,
        }
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_search(mut self, tool: SearchTool) -> Self {
        self.search_tool = Some(tool);
        self
    }

    pub fn with_thoughts(mut self) -> Self {
        self.include_thoughts = true;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}/models/{}:generateContent",
            self.base_url, self.api_version, self.model
        )
    }

    fn request_body(&self, prompt: &str, options: &GenerationOptions) -> Value {
        let mut generation_config = Map::new();
        generation_config.insert("candidateCount".into(), json!(options.candidate_count));
        if let Some(temperature) = options.temperature {
            generation_config.insert("temperature".into(), json!(temperature));
        }
        if self.include_thoughts {
            generation_config.insert("thinkingConfig".into(), json!({ "includeThoughts": true }));
        }

        let mut body = Map::new();
        body.insert(
            "contents".into(),
            json!([{ "role": "user", "parts": [{ "text": prompt }] }]),
        );
        body.insert("generationConfig".into(), Value::Object(generation_config));

        if options.block_none_safety {
            let settings: Vec<Value> = HARM_CATEGORIES
                .iter()
                .map(|category| json!({ "category": category, "threshold": "BLOCK_NONE" }))
                .collect();
            body.insert("safetySettings".into(), Value::Array(settings));
        }

        if let Some(tool) = self.search_tool {
            let mut entry = Map::new();
            entry.insert(tool.key().into(), json!({}));
            body.insert("tools".into(), json!([Value::Object(entry)]));
        }

        Value::Object(body)
    }
}

#[async_trait]
impl Backend for GeminiBackend {
    fn id(&self) -> BackendId {
        self.id
    }

    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<Generation> {
        let body = self.request_body(prompt, options);

        let response = self
            .http_client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .header(CONTENT_TYPE, "application/json")
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
        parse_generate_content(self.id, &text)
    }
}

/// Decode a `generateContent` body: first candidate, non-thought parts only.
pub(crate) fn parse_generate_content(id: BackendId, body: &str) -> Result<Generation> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| malformed(id, format!("failed to decode response: {}", e)))?;

    let candidate = match response.candidates.into_iter().next() {
        Some(candidate) => candidate,
        None => {
            return Err(match response.prompt_feedback.and_then(|f| f.block_reason) {
                Some(reason) => SherwoodError::upstream(id, UpstreamCause::ContentFiltered { reason }),
                None => malformed(id, "no candidates in response"),
            })
        }
    };

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter(|p| !p.thought)
        .filter_map(|p| p.text)
        .collect();

    if text.trim().is_empty() {
        return Err(match candidate.finish_reason.as_deref() {
            Some(reason @ ("SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST")) => SherwoodError::upstream(
                id,
                UpstreamCause::ContentFiltered {
                    reason: reason.to_string(),
                },
            ),
            _ => malformed(id, "candidate has no text"),
        });
    }

    let citations = candidate
        .grounding_metadata
        .map(|m| m.grounding_chunks)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|chunk| chunk.web)
        .filter_map(|web| {
            Some(Citation {
                url: web.uri.filter(|u| !u.is_empty())?,
                title: web.title,
            })
        })
        .collect();

    Ok(Generation { text, citations })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebSource>,
}

#[derive(Deserialize)]
struct WebSource {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}
