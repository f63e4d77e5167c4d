//! Error taxonomy for transitions.
//!
//! Aborts and redirects travel down the same rejection channel as genuine
//! failures, so every variant here must be clonable: a settled outcome is
//! observed by any number of promise handles.

use std::sync::Arc;

use thiserror::Error;

use crate::transition::{Transition, TransitionId};

/// Rejection reason of a transition promise.
///
/// A redirect *is an* abort: plain observers see both as cancellation, while
/// `redirect_target` keeps the redirect filterable for the follower.
#[derive(Debug, Clone, Error)]
pub enum TransitionError {
    /// The transition was superseded or explicitly aborted.
    ///
    /// Carries the transition's id rather than the transition itself: the
    /// settled outcome lives inside the transition, so a handle here would
    /// make the `Arc` self-referential and leak. Callers that need the
    /// transition back already hold it, having observed the rejection
    /// through its promise.
    #[error("transition {id} was aborted")]
    Aborted { id: TransitionId },

    /// The transition was abandoned mid-flight in favor of `to`.
    #[error("transition redirected to {}", .to.id())]
    Redirected { to: Transition },

    /// `trigger` exhausted the handler chain without a listener.
    #[error("no route handler responded to event `{name}`")]
    UnhandledEvent { name: String },

    /// `retry` could not reach the owning router anymore.
    #[error("router was dropped before a new transition could begin")]
    RouterDropped,

    /// A failure raised while resolving the destination, propagated verbatim.
    #[error("{0}")]
    Resolution(Arc<anyhow::Error>),
}

impl TransitionError {
    /// Wrap a resolution failure without losing the original cause.
    pub fn resolution(err: anyhow::Error) -> Self {
        Self::Resolution(Arc::new(err))
    }

    /// True for both plain aborts and redirects.
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Aborted { .. } | Self::Redirected { .. })
    }

    /// The successor transition, when this rejection is a redirect.
    pub fn redirect_target(&self) -> Option<Transition> {
        match self {
            Self::Redirected { to } => Some(to.clone()),
            _ => None,
        }
    }

    /// The original resolution cause, when there is one.
    pub fn resolution_error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Resolution(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T, E = TransitionError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_abort_classification() {
        let aborted = TransitionError::Aborted { id: Uuid::new_v4() };
        let unhandled = TransitionError::UnhandledEvent {
            name: "willTransition".to_string(),
        };
        let failed = TransitionError::resolution(anyhow::anyhow!("boom"));

        assert!(aborted.is_abort());
        assert!(!unhandled.is_abort());
        assert!(!failed.is_abort());
        assert!(aborted.redirect_target().is_none());
    }

    #[test]
    fn test_resolution_cause_preserved() {
        let err = TransitionError::resolution(anyhow::anyhow!("route not found"));

        assert_eq!(err.to_string(), "route not found");
        assert!(err.resolution_error().is_some());
    }
}
