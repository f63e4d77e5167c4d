//! Intent - Opaque Destination Description
//!
//! An `Intent` describes *where* a transition wants to go. The core never
//! interprets it; only the router that created it knows how to resolve it
//! back into a destination (which is exactly what `retry` relies on).

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque, cheaply clonable destination description.
///
/// The payload is type-erased so the core stays agnostic of how a router
/// models its destinations (URL string, named route + params, ...). The
/// label exists purely for diagnostics and logging.
#[derive(Clone)]
pub struct Intent {
    label: Arc<str>,
    payload: Arc<dyn Any + Send + Sync>,
}

impl Intent {
    /// Wrap a router-defined payload with a diagnostic label.
    pub fn new<T: Any + Send + Sync>(label: impl Into<String>, payload: T) -> Self {
        Self {
            label: label.into().into(),
            payload: Arc::new(payload),
        }
    }

    /// Diagnostic label, e.g. the requested URL or route name.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Borrow the payload back as its concrete type.
    ///
    /// Returns `None` when `T` is not the type the intent was built with.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref()
    }
}

impl fmt::Debug for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Intent").field(&self.label).finish()
    }
}
