use crate::config::Capability;
use std::sync::Arc;

/// Outcome of one gated pipeline step for a plugin.
///
/// Every step either runs or is explicitly held back, and the reason it was held back stays
/// visible to the caller instead of collapsing into a missing value.
#[derive(Debug, Clone)]
pub enum Resolution<T> {
    /// The step ran and produced a value.
    Resolved(T),

    /// The policy declined this step for the plugin.
    Skipped(Capability),

    /// A step this one depends on produced nothing, so it was never attempted.
    Gated,

    /// The step ran and failed.
    Failed(Arc<ohno::AppError>),
}

impl<T> Resolution<T> {
    /// Returns a reference to the contained value if `Resolved`, otherwise `None`.
    #[must_use]
    pub const fn as_ref(&self) -> Option<&T> {
        match self {
            Self::Resolved(value) => Some(value),
            _ => None,
        }
    }

    /// Wraps the outcome of a step that was allowed to run.
    pub fn from_result(result: crate::Result<T>) -> Self {
        match result {
            Ok(value) => Self::Resolved(value),
            Err(e) => Self::Failed(Arc::new(e)),
        }
    }

    /// Runs `f` on the resolved value, passing every other outcome through as `Gated`.
    pub fn and_then<U>(&self, f: impl FnOnce(&T) -> Resolution<U>) -> Resolution<U> {
        match self {
            Self::Resolved(value) => f(value),
            _ => Resolution::Gated,
        }
    }
}
