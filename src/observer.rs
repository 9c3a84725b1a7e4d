//! Prints results as the run produces them.

use async_trait::async_trait;
use std::sync::OnceLock;

use sherwood_core::aggregate::{BackendResponse, ComparisonResponse, RunObserver};
use sherwood_core::output::OutputFormatter;
use sherwood_core::{ProductKind, RenderedPrompt};

pub struct TerminalObserver<'a> {
    formatter: &'a OutputFormatter,
    product: ProductKind,
    key_phrase: OnceLock<String>,
}

impl<'a> TerminalObserver<'a> {
    pub fn new(formatter: &'a OutputFormatter, product: ProductKind) -> Self {
        Self {
            formatter,
            product,
            key_phrase: OnceLock::new(),
        }
    }

    fn key_phrase(&self) -> &str {
        self.key_phrase.get().map(String::as_str).unwrap_or_default()
    }
}

#[async_trait]
impl<'a> RunObserver for TerminalObserver<'a> {
    async fn on_prompt(&self, prompt: &RenderedPrompt, key_phrase: &str) {
        let _ = self.key_phrase.set(key_phrase.to_string());
        self.formatter.print_prompt(prompt, key_phrase);
    }

    async fn on_response(&self, response: &BackendResponse) {
        self.formatter
            .print_response(response, self.product, self.key_phrase());
    }

    async fn on_comparison_prompt(&self, prompt: &str) {
        self.formatter.print_comparison_prompt(prompt);
    }

    async fn on_review(&self, review: &ComparisonResponse) {
        self.formatter
            .print_response(review, self.product, self.key_phrase());
    }
}
