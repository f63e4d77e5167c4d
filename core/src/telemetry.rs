//! # Telemetry: Observability Decorators
//!
//! Decorators for adding observability to the collaborator seams without
//! touching the collaborators themselves.

use crate::router::LocationUpdater;

/// A wrapper that logs every URL mutation performed through an inner
/// [`LocationUpdater`].
#[derive(Clone)]
pub struct Traced<L> {
    inner: L,
    name: String,
}

impl<L> Traced<L> {
    pub fn new(inner: L, name: &str) -> Self {
        Self {
            inner,
            name: name.to_string(),
        }
    }
}

impl<L: LocationUpdater> LocationUpdater for Traced<L> {
    fn update_url(&self, url: &str) {
        tracing::info!(location = %self.name, %url, "location update");
        self.inner.update_url(url);
    }

    fn replace_with(&self, url: &str) {
        tracing::info!(location = %self.name, %url, "location replace");
        self.inner.replace_with(url);
    }
}
