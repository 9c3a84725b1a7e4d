//! One user-initiated run: render, fan out, compare.
//!
//! Every input check happens before the first remote call. Each answer is
//! handed to the observer and announced to the notifier as soon as it
//! arrives; the first upstream failure ends the run.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::aggregate::{
    Aggregator, BackendResponse, ComparisonResponse, ResponseBundle, RunObserver, Selection,
};
use crate::error::{Result, SherwoodError};
use crate::llm::{BackendId, GenerationOptions};
use crate::notify::{format_message, Notifier};
use crate::template::{ProductKind, PromptRequest, RenderedPrompt};
use crate::{info_log, warn_log};

/// Instruction prepended to custom product text to get a short label
pub const KEY_PHRASE_INSTRUCTION: &str = "Summarise into a short phrase, not more than a few words:\n\n";

const FALLBACK_PHRASE_WORDS: usize = 6;

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub product: ProductKind,
    pub subject: String,
    pub interns: Selection,
    pub reviewers: Selection,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    /// Short label used in headings and notifications
    pub key_phrase: String,
    pub prompt: RenderedPrompt,
    pub bundle: ResponseBundle,
    /// Present only when the comparison stage ran
    pub comparison_prompt: Option<String>,
    pub reviews: Vec<ComparisonResponse>,
    pub elapsed: Duration,
}

pub struct Pipeline {
    aggregator: Aggregator,
    notifier: Arc<dyn Notifier>,
}

impl Pipeline {
    pub fn new(aggregator: Aggregator, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            aggregator,
            notifier,
        }
    }

    pub async fn run(&self, request: &RunRequest, observer: &dyn RunObserver) -> Result<RunReport> {
        let start = Instant::now();

        let prompt_request = PromptRequest::new(request.product, &request.subject)?;
        if request.interns.is_empty() {
            return Err(SherwoodError::validation("no interns selected"));
        }
        let registry = self.aggregator.registry();
        for id in request.interns.iter().chain(request.reviewers.iter()) {
            registry.get(id)?;
        }

        let prompt = prompt_request.render();
        let key_phrase = self.key_phrase(&prompt_request).await;
        info_log!(
            "Run started: {} / {:?}, interns {:?}, reviewers {:?}",
            request.product.label(),
            key_phrase,
            request.interns.as_slice(),
            request.reviewers.as_slice()
        );
        observer.on_prompt(&prompt, &key_phrase).await;

        let relay = Relay {
            inner: observer,
            notifier: self.notifier.as_ref(),
            product: request.product,
            key_phrase: &key_phrase,
        };

        let bundle = self
            .aggregator
            .fan_out(&prompt, &request.interns, &relay)
            .await?;
        let comparison = self
            .aggregator
            .compare(&bundle, request.product, &request.reviewers, &relay)
            .await?;

        let (comparison_prompt, reviews) = match comparison {
            Some(c) => (Some(c.prompt), c.reviews),
            None => (None, Vec::new()),
        };

        let elapsed = start.elapsed();
        info_log!(
            "Run finished in {:?}: {} answer(s), {} review(s)",
            elapsed,
            bundle.len(),
            reviews.len()
        );

        Ok(RunReport {
            key_phrase,
            prompt,
            bundle,
            comparison_prompt,
            reviews,
            elapsed,
        })
    }

    /// The subject itself, or a summary of the custom text.
    async fn key_phrase(&self, request: &PromptRequest) -> String {
        if request.kind() != ProductKind::Custom {
            return request.subject().to_string();
        }

        let fallback = || first_words(request.subject(), FALLBACK_PHRASE_WORDS);
        let Ok(summariser) = self.aggregator.registry().get(BackendId::Mini) else {
            return fallback();
        };

        let instruction = format!("{}{}", KEY_PHRASE_INSTRUCTION, request.subject());
        match self
            .aggregator
            .call(summariser.as_ref(), &instruction, &GenerationOptions::provider_defaults())
            .await
        {
            Ok(response) if !response.text.trim().is_empty() => response.text.trim().to_string(),
            Ok(_) => fallback(),
            Err(e) => {
                warn_log!("Key phrase summary failed, using first words: {}", e);
                fallback()
            }
        }
    }
}

fn first_words(text: &str, count: usize) -> String {
    text.split_whitespace().take(count).collect::<Vec<_>>().join(" ")
}

/// Forwards to the caller's observer, then announces the answer.
struct Relay<'a> {
    inner: &'a dyn RunObserver,
    notifier: &'a dyn Notifier,
    product: ProductKind,
    key_phrase: &'a str,
}

impl Relay<'_> {
    async fn announce(&self, backend: BackendId) {
        let message = format_message(backend, self.product, self.key_phrase);
        if let Err(e) = self.notifier.notify(&message).await {
            warn_log!("Notification for {} not delivered: {}", backend, e);
        }
    }
}

#[async_trait]
impl<'a> RunObserver for Relay<'a> {
    async fn on_prompt(&self, prompt: &RenderedPrompt, key_phrase: &str) {
        self.inner.on_prompt(prompt, key_phrase).await;
    }

    async fn on_response(&self, response: &BackendResponse) {
        self.inner.on_response(response).await;
        self.announce(response.backend).await;
    }

    async fn on_comparison_prompt(&self, prompt: &str) {
        self.inner.on_comparison_prompt(prompt).await;
    }

    async fn on_review(&self, review: &ComparisonResponse) {
        self.inner.on_review(review).await;
        self.announce(review.backend).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Silent;
    use crate::llm::BackendRegistry;
    use crate::testing::{CallLog, RecordingNotifier, RecordingObserver, ScriptedBackend};

    fn registry(log: &CallLog) -> BackendRegistry {
        BackendRegistry::new()
            .with(ScriptedBackend::new(BackendId::Sonar, "sonar answer", log))
            .with(ScriptedBackend::new(BackendId::Deepseek, "deepseek answer", log))
            .with(ScriptedBackend::new(BackendId::Gemini, "gemini answer", log))
            .with(ScriptedBackend::new(BackendId::Oscar, "oscar review", log))
            .with(ScriptedBackend::new(BackendId::Graham, "graham review", log))
            .with(ScriptedBackend::new(BackendId::Mini, "  Lao rice policy \n", log))
    }

    fn pipeline(registry: BackendRegistry, notifier: Arc<dyn Notifier>) -> Pipeline {
        Pipeline::new(Aggregator::new(Arc::new(registry)), notifier)
    }

    fn request(product: ProductKind, subject: &str, interns: &[BackendId], reviewers: &[BackendId]) -> RunRequest {
        RunRequest {
            product,
            subject: subject.to_string(),
            interns: Selection::new(interns.iter().copied()),
            reviewers: Selection::new(reviewers.iter().copied()),
        }
    }

    #[tokio::test]
    async fn single_intern_without_reviewers() {
        let log = CallLog::default();
        let notifier = Arc::new(RecordingNotifier::default());
        let pipeline = pipeline(registry(&log), notifier.clone());

        let report = pipeline
            .run(
                &request(ProductKind::CountryDevelopments, "Singapore", &[BackendId::Sonar], &[]),
                &Silent,
            )
            .await
            .unwrap();

        assert_eq!(log.backends(), vec![BackendId::Sonar]);
        assert!(report
            .prompt
            .as_str()
            .contains("1. **DEVELOPMENTS IN Singapore**"));
        assert_eq!(report.key_phrase, "Singapore");
        assert!(report.comparison_prompt.is_none());
        assert!(report.reviews.is_empty());
        assert_eq!(
            notifier.messages(),
            vec!["Sherwood Generator\nSonar\nDevelopments\nSingapore".to_string()]
        );
    }

    #[tokio::test]
    async fn two_interns_and_one_reviewer() {
        let log = CallLog::default();
        let notifier = Arc::new(RecordingNotifier::default());
        let pipeline = pipeline(registry(&log), notifier.clone());
        let observer = RecordingObserver::default();

        let report = pipeline
            .run(
                &request(
                    ProductKind::Biography,
                    "Jane Doe",
                    &[BackendId::Sonar, BackendId::Gemini],
                    &[BackendId::Oscar],
                ),
                &observer,
            )
            .await
            .unwrap();

        assert_eq!(
            log.backends(),
            vec![BackendId::Sonar, BackendId::Gemini, BackendId::Oscar]
        );
        assert_eq!(report.bundle.backends(), vec![BackendId::Sonar, BackendId::Gemini]);
        let tagged = report.bundle.tagged();
        assert!(tagged.find("<answer_Sonar>").unwrap() < tagged.find("<answer_Gemini>").unwrap());

        let reviewer_input = &log.prompts()[2];
        assert!(reviewer_input.contains("<answer_Sonar>\n\nsonar answer\n\n</answer_Sonar>"));
        assert!(reviewer_input.contains("<answer_Gemini>\n\ngemini answer\n\n</answer_Gemini>"));
        assert_eq!(report.comparison_prompt.as_deref(), Some(reviewer_input.as_str()));
        assert_eq!(report.reviews.len(), 1);
        assert_eq!(report.reviews[0].text, "oscar review");

        assert_eq!(observer.responses(), vec![BackendId::Sonar, BackendId::Gemini]);
        assert_eq!(observer.reviews(), vec![BackendId::Oscar]);
        assert_eq!(notifier.messages().len(), 3);
        assert!(notifier.messages()[2].starts_with("Sherwood Generator\nOscar\nCV\n"));
    }

    #[tokio::test]
    async fn reviewers_use_provider_defaults() {
        let log = CallLog::default();
        let pipeline = pipeline(registry(&log), Arc::new(RecordingNotifier::default()));

        pipeline
            .run(
                &request(
                    ProductKind::Factsheet,
                    "Laos",
                    &[BackendId::Sonar, BackendId::Deepseek],
                    &[BackendId::Graham],
                ),
                &Silent,
            )
            .await
            .unwrap();

        let options = log.options();
        assert_eq!(options[0].temperature, Some(0.5));
        assert_eq!(options[2], GenerationOptions::provider_defaults());
    }

    #[tokio::test]
    async fn failing_intern_aborts_before_review() {
        let log = CallLog::default();
        let registry = registry(&log).with(ScriptedBackend::new(BackendId::Gemini, "x", &log).failing());
        let notifier = Arc::new(RecordingNotifier::default());
        let pipeline = pipeline(registry, notifier.clone());
        let observer = RecordingObserver::default();

        let err = pipeline
            .run(
                &request(
                    ProductKind::Biography,
                    "Jane Doe",
                    &[BackendId::Sonar, BackendId::Gemini],
                    &[BackendId::Oscar],
                ),
                &observer,
            )
            .await
            .unwrap_err();

        assert_eq!(err.backend(), Some(BackendId::Gemini));
        assert!(err.to_string().contains("Gemini"));
        assert_eq!(log.backends(), vec![BackendId::Sonar, BackendId::Gemini]);
        assert_eq!(observer.responses(), vec![BackendId::Sonar]);
        assert!(observer.reviews().is_empty());
        assert_eq!(notifier.messages().len(), 1);
    }

    #[tokio::test]
    async fn single_intern_skips_selected_reviewers() {
        let log = CallLog::default();
        let pipeline = pipeline(registry(&log), Arc::new(RecordingNotifier::default()));

        let report = pipeline
            .run(
                &request(
                    ProductKind::Biography,
                    "Jane Doe",
                    &[BackendId::Deepseek],
                    &[BackendId::Graham, BackendId::Oscar],
                ),
                &Silent,
            )
            .await
            .unwrap();

        assert_eq!(log.backends(), vec![BackendId::Deepseek]);
        assert!(report.comparison_prompt.is_none());
    }

    #[tokio::test]
    async fn blank_subject_is_rejected_before_any_call() {
        let log = CallLog::default();
        let pipeline = pipeline(registry(&log), Arc::new(RecordingNotifier::default()));

        let err = pipeline
            .run(
                &request(ProductKind::Factsheet, "   ", &[BackendId::Sonar], &[]),
                &Silent,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SherwoodError::Validation { .. }));
        assert!(log.backends().is_empty());
    }

    #[tokio::test]
    async fn unconfigured_reviewer_is_rejected_before_any_call() {
        let log = CallLog::default();
        let registry = BackendRegistry::new()
            .with(ScriptedBackend::new(BackendId::Sonar, "a", &log))
            .with(ScriptedBackend::new(BackendId::Gemini, "b", &log));
        let pipeline = pipeline(registry, Arc::new(RecordingNotifier::default()));

        let err = pipeline
            .run(
                &request(
                    ProductKind::Biography,
                    "Jane Doe",
                    &[BackendId::Sonar, BackendId::Gemini],
                    &[BackendId::Oscar],
                ),
                &Silent,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SherwoodError::InvalidConfig { .. }));
        assert!(log.backends().is_empty());
    }

    #[tokio::test]
    async fn custom_product_asks_mini_for_key_phrase() {
        let log = CallLog::default();
        let notifier = Arc::new(RecordingNotifier::default());
        let pipeline = pipeline(registry(&log), notifier.clone());
        let observer = RecordingObserver::default();
        let text = "Write a briefing on rice export policy in Laos since 2020.";

        let report = pipeline
            .run(&request(ProductKind::Custom, text, &[BackendId::Sonar], &[]), &observer)
            .await
            .unwrap();

        assert_eq!(log.backends(), vec![BackendId::Mini, BackendId::Sonar]);
        assert_eq!(log.prompts()[0], format!("{}{}", KEY_PHRASE_INSTRUCTION, text));
        assert_eq!(log.prompts()[1], text);
        assert_eq!(report.key_phrase, "Lao rice policy");
        assert_eq!(observer.key_phrases(), vec!["Lao rice policy".to_string()]);
        assert_eq!(
            notifier.messages(),
            vec!["Sherwood Generator\nSonar\nCustom\nLao rice policy".to_string()]
        );
    }

    #[tokio::test]
    async fn custom_key_phrase_falls_back_to_first_words() {
        let log = CallLog::default();
        let registry = BackendRegistry::new().with(ScriptedBackend::new(BackendId::Sonar, "a", &log));
        let pipeline = pipeline(registry, Arc::new(RecordingNotifier::default()));

        let report = pipeline
            .run(
                &request(
                    ProductKind::Custom,
                    "Explain the history of the Mekong River Commission in detail",
                    &[BackendId::Sonar],
                    &[],
                ),
                &Silent,
            )
            .await
            .unwrap();

        assert_eq!(report.key_phrase, "Explain the history of the Mekong");
    }

    #[tokio::test]
    async fn notification_failure_does_not_abort() {
        let log = CallLog::default();
        let pipeline = pipeline(registry(&log), Arc::new(RecordingNotifier::failing()));

        let report = pipeline
            .run(
                &request(ProductKind::Factsheet, "Laos", &[BackendId::Sonar, BackendId::Gemini], &[]),
                &Silent,
            )
            .await
            .unwrap();

        assert_eq!(report.bundle.len(), 2);
    }
}
