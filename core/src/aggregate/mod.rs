//! Fan-out and comparison.
//!
//! The same prompt goes to every selected intern; their answers are kept in
//! selection order and concatenated inside `<answer_Name>` tags. When two or
//! more interns answered and reviewers were chosen, the tagged bundle is
//! handed to each reviewer for a side-by-side comparison.
//!
//! # Main Types
//! - `Selection`: ordered, duplicate-free list of backends
//! - `ResponseBundle`: the interns' answers plus their tagged form
//! - `Aggregator`: runs the fan-out and comparison stages

mod compare;
mod observer;

pub use compare::{comparison_preamble, Comparison, ComparisonRequest};
pub use observer::{RunObserver, Silent};

use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

use crate::error::{Result, SherwoodError};
use crate::llm::{Backend, BackendId, BackendRegistry, Citation, GenerationOptions};
use crate::template::{ProductKind, RenderedPrompt};
use crate::{debug_log, error_log, info_log};

/// One backend's answer
#[derive(Debug, Clone, PartialEq)]
pub struct BackendResponse {
    pub backend: BackendId,
    pub text: String,
    pub citations: Vec<Citation>,
    pub latency: Duration,
}

/// A reviewer's answer to the comparison prompt
pub type ComparisonResponse = BackendResponse;

/// Ordered, duplicate-free list of backends
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection(Vec<BackendId>);

impl Selection {
    /// Keep the first occurrence of every id, in the given order.
    pub fn new(ids: impl IntoIterator<Item = BackendId>) -> Self {
        let mut seen = HashSet::new();
        Self(ids.into_iter().filter(|id| seen.insert(*id)).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[BackendId] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = BackendId> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<BackendId> for Selection {
    fn from_iter<I: IntoIterator<Item = BackendId>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Interns' answers in the order the interns were selected
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseBundle {
    responses: Vec<BackendResponse>,
}

impl ResponseBundle {
    pub fn push(&mut self, response: BackendResponse) {
        self.responses.push(response);
    }

    pub fn responses(&self) -> &[BackendResponse] {
        &self.responses
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn backends(&self) -> Vec<BackendId> {
        self.responses.iter().map(|r| r.backend).collect()
    }

    pub fn distinct_backends(&self) -> usize {
        self.responses
            .iter()
            .map(|r| r.backend)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Every answer wrapped in `<answer_Name>` tags, blank-line separated.
    pub fn tagged(&self) -> String {
        self.responses
            .iter()
            .map(|r| {
                format!(
                    "<answer_{name}>\n\n{text}\n\n</answer_{name}>\n\n",
                    name = r.backend.name(),
                    text = r.text
                )
            })
            .collect()
    }
}

/// How the interns are dispatched. Results keep selection order either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanOutMode {
    #[default]
    Sequential,
    Concurrent { max_in_flight: usize },
}

pub struct Aggregator {
    registry: Arc<BackendRegistry>,
    timeout: Duration,
    mode: FanOutMode,
    intern_options: GenerationOptions,
    reviewer_options: GenerationOptions,
}

impl Aggregator {
    pub fn new(registry: Arc<BackendRegistry>) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(120),
            mode: FanOutMode::Sequential,
            intern_options: GenerationOptions::default(),
            reviewer_options: GenerationOptions::provider_defaults(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_mode(mut self, mode: FanOutMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_intern_options(mut self, options: GenerationOptions) -> Self {
        self.intern_options = options;
        self
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Ask every intern the same prompt.
    ///
    /// Stops at the first failure; the error names the failing backend and
    /// answers gathered so far are dropped (the observer has already seen them).
    pub async fn fan_out(
        &self,
        prompt: &RenderedPrompt,
        interns: &Selection,
        observer: &dyn RunObserver,
    ) -> Result<ResponseBundle> {
        if interns.is_empty() {
            return Err(SherwoodError::validation("no interns selected"));
        }
        let backends = self.resolve(interns)?;
        let mut bundle = ResponseBundle::default();

        match self.mode {
            FanOutMode::Sequential => {
                for backend in &backends {
                    let response = self
                        .call(backend.as_ref(), prompt.as_str(), &self.intern_options)
                        .await?;
                    observer.on_response(&response).await;
                    bundle.push(response);
                }
            }
            FanOutMode::Concurrent { max_in_flight } => {
                let semaphore = Semaphore::new(max_in_flight.max(1));
                let semaphore = &semaphore;
                let calls = backends.iter().map(|backend| async move {
                    let _permit = semaphore.acquire().await.ok();
                    self.call(backend.as_ref(), prompt.as_str(), &self.intern_options)
                        .await
                });
                for result in join_all(calls).await {
                    let response = result?;
                    observer.on_response(&response).await;
                    bundle.push(response);
                }
            }
        }

        Ok(bundle)
    }

    /// Have each reviewer compare the interns' answers.
    ///
    /// Returns `Ok(None)` without calling anyone when no reviewer was chosen
    /// or fewer than two distinct interns answered.
    pub async fn compare(
        &self,
        bundle: &ResponseBundle,
        kind: ProductKind,
        reviewers: &Selection,
        observer: &dyn RunObserver,
    ) -> Result<Option<Comparison>> {
        if reviewers.is_empty() {
            info_log!("No reviewers selected, skipping comparison");
            return Ok(None);
        }
        let Some(request) = ComparisonRequest::new(bundle, kind) else {
            info_log!(
                "Only {} distinct intern(s) answered, skipping comparison",
                bundle.distinct_backends()
            );
            return Ok(None);
        };

        let backends = self.resolve(reviewers)?;
        let prompt = request.render()?;
        observer.on_comparison_prompt(&prompt).await;

        let mut reviews = Vec::with_capacity(backends.len());
        for backend in &backends {
            let review = self
                .call(backend.as_ref(), &prompt, &self.reviewer_options)
                .await?;
            observer.on_review(&review).await;
            reviews.push(review);
        }

        Ok(Some(Comparison { prompt, reviews }))
    }

    /// Single call with the per-call timeout applied.
    pub async fn call(
        &self,
        backend: &dyn Backend,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<BackendResponse> {
        let id = backend.id();
        debug_log!("{} request: {} chars", id, prompt.len());
        let start = Instant::now();

        let generation = match tokio::time::timeout(self.timeout, backend.generate(prompt, options)).await {
            Ok(Ok(generation)) => generation,
            Ok(Err(e)) => {
                error_log!("{} failed after {:?}: {}", id, start.elapsed(), e);
                return Err(e);
            }
            Err(_) => {
                error_log!("{} timed out after {:?}", id, self.timeout);
                return Err(SherwoodError::Timeout {
                    backend: id,
                    after: self.timeout,
                });
            }
        };

        let latency = start.elapsed();
        info_log!(
            "{} answered in {:?}: {} chars, {} citation(s)",
            id,
            latency,
            generation.text.len(),
            generation.citations.len()
        );

        Ok(BackendResponse {
            backend: id,
            text: generation.text,
            citations: generation.citations,
            latency,
        })
    }

    /// Look every id up before the first request goes out.
    fn resolve(&self, selection: &Selection) -> Result<Vec<Arc<dyn Backend>>> {
        selection.iter().map(|id| self.registry.get(id)).collect()
    }
}
