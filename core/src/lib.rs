pub mod aggregate;
pub mod config;
pub mod error;
pub mod llm;
pub mod logger;
pub mod notify;
pub mod output;
pub mod pipeline;
pub mod template;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use aggregate::{Aggregator, FanOutMode, RunObserver, Selection};
pub use config::{Config, Secrets};
pub use error::{Result, SherwoodError};
pub use llm::{BackendId, BackendRegistry};
pub use pipeline::{Pipeline, RunReport, RunRequest};
pub use template::{ProductKind, PromptRequest, RenderedPrompt};
