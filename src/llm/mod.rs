//! Language model collaborator.

mod client;
mod config;
mod error;

#[cfg(any(test, feature = "mock"))]
mod mock;

#[cfg(test)]
mod tests;

pub use client::{CompletionRequest, GenaiModel, LanguageModel};
pub use config::{DEFAULT_LLM_MODEL, DEFAULT_LLM_TEMPERATURE, LlmConfig};
pub use error::LlmError;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockLanguageModel;
