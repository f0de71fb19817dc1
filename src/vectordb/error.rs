use thiserror::Error;

/// Law store failures. An empty result set is not an error.
#[derive(Debug, Error)]
pub enum VectorDbError {
    #[error("law store unreachable at '{url}': {message}")]
    ConnectionFailed { url: String, message: String },

    /// The corpus has not been ingested into `collection`.
    #[error("law collection '{collection}' does not exist")]
    CollectionNotFound { collection: String },

    #[error("law search in '{collection}' failed: {message}")]
    SearchFailed { collection: String, message: String },
}
