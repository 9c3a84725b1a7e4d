//! Backends built once at start-up and looked up by id.

use reqwest::Client as HttpClient;
use std::collections::HashMap;
use std::sync::Arc;

use super::gemini::{GeminiBackend, SearchTool};
use super::{Backend, BackendId, OpenAiCompatibleBackend, Provider};
use crate::config::{Config, Secrets};
use crate::error::{Result, SherwoodError};

#[derive(Default, Clone)]
pub struct BackendRegistry {
    backends: HashMap<BackendId, Arc<dyn Backend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every known backend from config and secrets.
    pub fn from_config(config: &Config, secrets: &Secrets) -> Result<Self> {
        let http_client = HttpClient::builder()
            .user_agent(concat!("sherwood/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SherwoodError::InvalidConfig {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        let mut registry = Self::new();
        for id in BackendId::ALL {
            let base_url = config.base_url_for(id);
            let model = config.model_for(id);
            let api_key = secrets.api_key(id.provider()).to_string();

            let backend: Arc<dyn Backend> = match id.provider() {
                Provider::Perplexity | Provider::OpenAi => {
                    let backend =
                        OpenAiCompatibleBackend::new(id, &base_url, model, api_key, http_client.clone());
                    Arc::new(match id {
                        BackendId::Oscar => backend.without_temperature(),
                        _ => backend,
                    })
                }
                Provider::Google => {
                    let search = SearchTool::for_model(&model);
                    let backend = GeminiBackend::new(id, &base_url, model, api_key, http_client.clone());
                    Arc::new(match id {
                        BackendId::Graham => backend.with_api_version("v1alpha").with_thoughts(),
                        _ => backend.with_search(search),
                    })
                }
            };
            registry.insert(backend);
        }
        Ok(registry)
    }

    pub fn with(mut self, backend: impl Backend + 'static) -> Self {
        self.insert(Arc::new(backend));
        self
    }

    /// Register a backend, replacing any previous one with the same id.
    pub fn insert(&mut self, backend: Arc<dyn Backend>) {
        self.backends.insert(backend.id(), backend);
    }

    pub fn get(&self, id: BackendId) -> Result<Arc<dyn Backend>> {
        self.backends
            .get(&id)
            .cloned()
            .ok_or_else(|| SherwoodError::InvalidConfig {
                message: format!("backend {} is not configured", id),
            })
    }

    /// Registered ids in declaration order
    pub fn ids(&self) -> Vec<BackendId> {
        BackendId::ALL
            .into_iter()
            .filter(|id| self.backends.contains_key(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendOverride;
    use crate::llm::GenerationOptions;

    fn secrets() -> Secrets {
        Secrets {
            perplexity_api_key: "pplx".to_string(),
            openai_api_key: "sk".to_string(),
            google_api_key: "g".to_string(),
            bot: None,
        }
    }

    #[test]
    fn builds_every_backend() {
        let registry = BackendRegistry::from_config(&Config::default(), &secrets()).unwrap();
        assert_eq!(registry.ids(), BackendId::ALL.to_vec());
        for id in BackendId::ALL {
            assert_eq!(registry.get(id).unwrap().id(), id);
        }
    }

    #[tokio::test]
    async fn oscar_as_intern_sends_no_temperature() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(mockito::Matcher::Regex(r#"^\{"model":"o1","messages":\[.*\]\}$"#.to_string()))
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"Oscar draft"}}]}"#)
            .create_async()
            .await;

        let mut config = Config::default();
        config.backends.insert(
            "oscar".to_string(),
            BackendOverride {
                model: None,
                base_url: Some(server.url()),
            },
        );
        let registry = BackendRegistry::from_config(&config, &secrets()).unwrap();
        let generation = registry
            .get(BackendId::Oscar)
            .unwrap()
            .generate("Write about Laos", &GenerationOptions::default())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(generation.text, "Oscar draft");
    }

    #[test]
    fn unknown_backend_is_configuration_error() {
        let registry = BackendRegistry::new();
        let err = registry.get(BackendId::Oscar).err().unwrap();
        assert!(matches!(err, SherwoodError::InvalidConfig { .. }));
        assert!(err.to_string().contains("Oscar"));
    }
}
