use thiserror::Error;

/// Language model call failures.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("provider request failed for model {model}: {message}")]
    ProviderFailed { model: String, message: String },

    #[error("model {model} returned an empty response")]
    EmptyResponse { model: String },

    #[error("invalid llm configuration: {reason}")]
    InvalidConfig { reason: String },
}
