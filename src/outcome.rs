//! Result type for best-effort stages.
//!
//! Reranking, few-shot selection and model-output parsing never fail the pipeline. They
//! return an [`Outcome`] so callers can tell a nominal value from a fallback, and why the
//! fallback happened.

/// Value produced by a best-effort stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The stage ran as intended.
    Ok(T),
    /// The stage fell back to a default or secondary value.
    Degraded {
        /// The fallback value.
        value: T,
        /// Human-readable cause of the fallback.
        reason: String,
    },
}

impl<T> Outcome<T> {
    /// Builds a degraded outcome.
    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        Self::Degraded {
            value,
            reason: reason.into(),
        }
    }

    /// Returns `true` if the stage fell back.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Returns the fallback reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Ok(_) => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }

    /// Borrows the carried value.
    pub fn value(&self) -> &T {
        match self {
            Self::Ok(value) | Self::Degraded { value, .. } => value,
        }
    }

    /// Consumes the outcome and returns the carried value.
    pub fn into_value(self) -> T {
        match self {
            Self::Ok(value) | Self::Degraded { value, .. } => value,
        }
    }

    /// Maps the carried value, keeping the degradation reason.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Self::Ok(value) => Outcome::Ok(f(value)),
            Self::Degraded { value, reason } => Outcome::Degraded {
                value: f(value),
                reason,
            },
        }
    }
}
