//! Progress hooks for a run.

use async_trait::async_trait;

use super::{BackendResponse, ComparisonResponse};
use crate::template::RenderedPrompt;

/// Receives results as soon as they exist, in selection order.
///
/// Every method defaults to doing nothing.
#[async_trait]
pub trait RunObserver: Send + Sync {
    async fn on_prompt(&self, _prompt: &RenderedPrompt, _key_phrase: &str) {}

    async fn on_response(&self, _response: &BackendResponse) {}

    async fn on_comparison_prompt(&self, _prompt: &str) {}

    async fn on_review(&self, _review: &ComparisonResponse) {}
}

/// Observer that ignores everything
pub struct Silent;

impl RunObserver for Silent {}
