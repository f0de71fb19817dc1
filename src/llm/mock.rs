use parking_lot::Mutex;

use super::client::{CompletionRequest, LanguageModel};
use super::error::LlmError;

/// Scripted language model for tests.
///
/// Responses are served in order; once the script runs out the last one repeats.
#[derive(Debug)]
pub struct MockLanguageModel {
    model_id: String,
    responses: Mutex<Vec<String>>,
    cursor: Mutex<usize>,
    prompts: Mutex<Vec<CompletionRequest>>,
    failing: Mutex<Option<String>>,
}

impl MockLanguageModel {
    pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            model_id: "mock-llm".to_string(),
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            cursor: Mutex::new(0),
            prompts: Mutex::new(Vec::new()),
            failing: Mutex::new(None),
        }
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Makes every following call fail with `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failing.lock() = Some(message.into());
    }

    pub fn prompts(&self) -> Vec<CompletionRequest> {
        self.prompts.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }
}

impl LanguageModel for MockLanguageModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.prompts.lock().push(request);

        if let Some(message) = self.failing.lock().clone() {
            return Err(LlmError::ProviderFailed {
                model: self.model_id.clone(),
                message,
            });
        }

        let responses = self.responses.lock();
        let mut cursor = self.cursor.lock();
        let idx = (*cursor).min(responses.len().saturating_sub(1));
        *cursor += 1;

        match responses.get(idx) {
            Some(text) if !text.trim().is_empty() => Ok(text.clone()),
            _ => Err(LlmError::EmptyResponse {
                model: self.model_id.clone(),
            }),
        }
    }
}
