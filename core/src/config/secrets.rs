//! API keys and bot credentials, read from the environment.

use std::fmt;

use crate::error::{OptionExt, Result};
use crate::llm::Provider;

pub const BOT_TOKEN_VAR: &str = "BOT_TOKEN";
pub const RECIPIENT_VAR: &str = "RECIPIENT_USER_ID";

#[derive(Clone)]
pub struct BotSecrets {
    pub token: String,
    pub recipient_id: String,
}

#[derive(Clone)]
pub struct Secrets {
    pub perplexity_api_key: String,
    pub openai_api_key: String,
    pub google_api_key: String,
    /// Absent when notifications are switched off
    pub bot: Option<BotSecrets>,
}

impl Secrets {
    /// Read every secret from the process environment.
    pub fn from_env(require_bot: bool) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), require_bot)
    }

    /// Read secrets through `lookup`. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F, require_bot: bool) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fetch = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_missing(key)
        };

        let perplexity_api_key = fetch(Provider::Perplexity.api_key_var())?;
        let openai_api_key = fetch(Provider::OpenAi.api_key_var())?;
        let google_api_key = fetch(Provider::Google.api_key_var())?;

        let bot = if require_bot {
            Some(BotSecrets {
                token: fetch(BOT_TOKEN_VAR)?,
                recipient_id: fetch(RECIPIENT_VAR)?,
            })
        } else {
            None
        };

        Ok(Self {
            perplexity_api_key,
            openai_api_key,
            google_api_key,
            bot,
        })
    }

    pub fn api_key(&self, provider: Provider) -> &str {
        match provider {
            Provider::Perplexity => &self.perplexity_api_key,
            Provider::OpenAi => &self.openai_api_key,
            Provider::Google => &self.google_api_key,
        }
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("perplexity_api_key", &"<redacted>")
            .field("openai_api_key", &"<redacted>")
            .field("google_api_key", &"<redacted>")
            .field("bot", &self.bot.as_ref().map(|b| &b.recipient_id))
            .finish()
    }
}
