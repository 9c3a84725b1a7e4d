//! Scripted fakes shared by the aggregator and pipeline tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::aggregate::{BackendResponse, ComparisonResponse, RunObserver};
use crate::error::{Result, SherwoodError, UpstreamCause};
use crate::llm::{Backend, BackendId, Citation, Generation, GenerationOptions};
use crate::notify::Notifier;
use crate::template::RenderedPrompt;

/// Every call made to any scripted backend, in call order
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<(BackendId, String, GenerationOptions)>>>);

impl CallLog {
    pub fn backends(&self) -> Vec<BackendId> {
        self.0.lock().iter().map(|(id, _, _)| *id).collect()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.0.lock().iter().map(|(_, p, _)| p.clone()).collect()
    }

    pub fn options(&self) -> Vec<GenerationOptions> {
        self.0.lock().iter().map(|(_, _, o)| o.clone()).collect()
    }
}

pub struct ScriptedBackend {
    id: BackendId,
    reply: String,
    delay: Duration,
    fail: bool,
    log: CallLog,
}

impl ScriptedBackend {
    pub fn new(id: BackendId, reply: &str, log: &CallLog) -> Self {
        Self {
            id,
            reply: reply.to_string(),
            delay: Duration::ZERO,
            fail: false,
            log: log.clone(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn id(&self) -> BackendId {
        self.id
    }

    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<Generation> {
        self.log
            .0
            .lock()
            .push((self.id, prompt.to_string(), options.clone()));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(SherwoodError::upstream(
                self.id,
                UpstreamCause::Provider {
                    status: 500,
                    message: "scripted failure".to_string(),
                },
            ));
        }
        Ok(Generation {
            text: self.reply.clone(),
            citations: vec![Citation::url(format!("https://{}.example", self.id.key()))],
        })
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    prompts: Mutex<Vec<String>>,
    responses: Mutex<Vec<BackendId>>,
    comparison_prompts: Mutex<usize>,
    reviews: Mutex<Vec<BackendId>>,
}

impl RecordingObserver {
    pub fn key_phrases(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn responses(&self) -> Vec<BackendId> {
        self.responses.lock().clone()
    }

    pub fn comparison_prompts(&self) -> usize {
        *self.comparison_prompts.lock()
    }

    pub fn reviews(&self) -> Vec<BackendId> {
        self.reviews.lock().clone()
    }
}

#[async_trait]
impl RunObserver for RecordingObserver {
    async fn on_prompt(&self, _prompt: &RenderedPrompt, key_phrase: &str) {
        self.prompts.lock().push(key_phrase.to_string());
    }

    async fn on_response(&self, response: &BackendResponse) {
        self.responses.lock().push(response.backend);
    }

    async fn on_comparison_prompt(&self, _prompt: &str) {
        *self.comparison_prompts.lock() += 1;
    }

    async fn on_review(&self, review: &ComparisonResponse) {
        self.reviews.lock().push(review.backend);
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        self.messages.lock().push(message.to_string());
        if self.fail {
            return Err(SherwoodError::Notification {
                message: "bot unreachable".to_string(),
            });
        }
        Ok(())
    }
}
