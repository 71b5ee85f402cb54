use std::time::Duration;

use async_trait::async_trait;
use log::info;
use ollama_rs::generation::completion::request::GenerationRequest;
use ollama_rs::Ollama;
use url::Url;

use crate::errors::GenerationError;
use crate::models::prompt::{GenerationReply, PromptDocument};

/// Turns a rendered prompt into the model's reply.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, document: &PromptDocument) -> Result<GenerationReply, GenerationError>;
}

/// Non-streaming completion against a local Ollama server.
pub struct OllamaGenerator {
    ollama: Ollama,
    model: String,
    timeout: Duration,
}

impl OllamaGenerator {
    pub fn new(url: Url, model: impl Into<String>, timeout: Duration) -> Self {
        OllamaGenerator {
            ollama: Ollama::from_url(url),
            model: model.into(),
            timeout,
        }
    }
}

#[async_trait]
impl GenerationClient for OllamaGenerator {
    async fn generate(&self, document: &PromptDocument) -> Result<GenerationReply, GenerationError> {
        info!("Sending prompt to model {}", self.model);
        let request = GenerationRequest::new(self.model.clone(), document.to_string());

        let response = tokio::time::timeout(self.timeout, self.ollama.generate(request))
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout.as_secs()))?
            .map_err(GenerationError::from)?;

        Ok(GenerationReply {
            text: response.response,
        })
    }
}
