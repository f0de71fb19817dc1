use std::future::Future;

use genai::Client;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest, ChatResponseFormat};
use tracing::{debug, error, instrument};

use super::config::LlmConfig;
use super::error::LlmError;

/// One chat turn: a system instruction and a user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    /// Ask the provider for a JSON object response.
    pub json_mode: bool,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            json_mode: false,
        }
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

/// Text completion backend.
pub trait LanguageModel: Send + Sync {
    fn model_id(&self) -> &str;

    fn complete(
        &self,
        request: CompletionRequest,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;
}

/// Chat model reached through `genai`; the provider is resolved from the model name.
#[derive(Clone)]
pub struct GenaiModel {
    client: Client,
    config: LlmConfig,
}

impl GenaiModel {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        config.validate()?;
        Ok(Self {
            client: Client::default(),
            config,
        })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn options(&self, json_mode: bool) -> ChatOptions {
        let options = ChatOptions::default().with_temperature(self.config.temperature);
        if json_mode {
            options.with_response_format(ChatResponseFormat::JsonMode)
        } else {
            options
        }
    }
}

impl std::fmt::Debug for GenaiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaiModel")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LanguageModel for GenaiModel {
    fn model_id(&self) -> &str {
        &self.config.model
    }

    #[instrument(skip(self, request), fields(model = %self.config.model, json_mode = request.json_mode))]
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let chat = ChatRequest::new(vec![
            ChatMessage::system(request.system),
            ChatMessage::user(request.user),
        ]);
        let options = self.options(request.json_mode);

        let response = self
            .client
            .exec_chat(&self.config.model, chat, Some(&options))
            .await
            .map_err(|e| {
                error!(error = %e, "Provider error");
                LlmError::ProviderFailed {
                    model: self.config.model.clone(),
                    message: e.to_string(),
                }
            })?;

        let text = response.first_text().unwrap_or_default().trim().to_string();
        if text.is_empty() {
            return Err(LlmError::EmptyResponse {
                model: self.config.model.clone(),
            });
        }

        debug!(chars = text.len(), "Model responded");
        Ok(text)
    }
}
