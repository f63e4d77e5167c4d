//! Test utilities for Switchback transitions.
//!
//! Provides the collaborator doubles the core's scenario tests need: a
//! [`TestRouter`] that enforces the one-active-transition rule, a
//! [`TestLocation`] that records URL mutations, a [`RecordingHandler`] for
//! event-trigger assertions, and the `assert_aborted!`/`assert_redirected!`
//! macros.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;
use switchback_core::handler::{EventDisposition, RouteHandler, TransitionEvent};
use switchback_core::intent::Intent;
use switchback_core::route_info::RouteInfo;
use switchback_core::router::{LocationUpdater, Router};
use switchback_core::transition::{Transition, TransitionState};

/// A router double that owns the active-transition slot.
///
/// `begin` aborts the previously active transition (implicit supersession);
/// [`TestRouter::redirect`] settles it with a redirect instead, the way a
/// real router reacts to a handler requesting a different destination
/// mid-resolution.
pub struct TestRouter {
    weak: Weak<TestRouter>,
    begun: Mutex<Vec<Transition>>,
    current: Mutex<Option<Transition>>,
}

impl TestRouter {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            weak: weak.clone(),
            begun: Mutex::new(Vec::new()),
            current: Mutex::new(None),
        })
    }

    pub fn as_router(&self) -> Weak<dyn Router> {
        self.weak.clone()
    }

    /// Every transition this router ever began, in order.
    pub fn begun(&self) -> Vec<Transition> {
        self.begun.lock().clone()
    }

    pub fn current(&self) -> Option<Transition> {
        self.current.lock().clone()
    }

    /// Redirect the active transition to a fresh one for `intent`.
    pub fn redirect(&self, intent: Intent) -> Transition {
        let next = Transition::new(self.as_router(), intent);
        if let Some(previous) = self.current.lock().replace(next.clone()) {
            previous.redirect_to(&next);
        }
        self.begun.lock().push(next.clone());
        next
    }
}

#[async_trait]
impl Router for TestRouter {
    async fn begin(&self, intent: Intent) -> Transition {
        let from = self.current.lock().as_ref().and_then(|t| t.to());
        if let Some(previous) = self.current.lock().take() {
            previous.abort();
        }
        let state = TransitionState {
            from,
            ..TransitionState::default()
        };
        let next = Transition::with_state(self.as_router(), intent, state);
        *self.current.lock() = Some(next.clone());
        self.begun.lock().push(next.clone());
        next
    }
}

/// Records `update_url`/`replace_with` calls for assertions.
#[derive(Default)]
pub struct TestLocation {
    calls: Mutex<Vec<LocationCall>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationCall {
    Update(String),
    Replace(String),
}

impl TestLocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<LocationCall> {
        self.calls.lock().clone()
    }
}

impl LocationUpdater for TestLocation {
    fn update_url(&self, url: &str) {
        self.calls.lock().push(LocationCall::Update(url.to_string()));
    }

    fn replace_with(&self, url: &str) {
        self.calls.lock().push(LocationCall::Replace(url.to_string()));
    }
}

/// A route handler that records every event it sees and handles a
/// configurable set of event names.
pub struct RecordingHandler {
    name: String,
    handles: Vec<String>,
    seen: Mutex<Vec<String>>,
}

impl RecordingHandler {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handles: Vec::new(),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Declare an event name this handler consumes.
    pub fn handling(mut self, event: impl Into<String>) -> Self {
        self.handles.push(event.into());
        self
    }

    /// Event names this handler observed, in order.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().clone()
    }
}

impl RouteHandler for RecordingHandler {
    fn route_name(&self) -> &str {
        &self.name
    }

    fn on_event(&self, event: &TransitionEvent<'_>) -> EventDisposition {
        self.seen.lock().push(event.name.to_string());
        if self.handles.iter().any(|h| h.as_str() == event.name) {
            EventDisposition::Handled
        } else {
            EventDisposition::Pass
        }
    }
}

/// Build a parent-linked route chain from root to leaf, returning the leaf.
///
/// Panics on an empty slice; it is a test helper.
pub fn route_chain(names: &[&str]) -> Arc<RouteInfo> {
    let (root, rest) = names.split_first().expect("route_chain needs at least one name");
    rest.iter()
        .fold(RouteInfo::root(*root), |parent, name| parent.child(*name))
}

/// Install a fmt subscriber honoring `RUST_LOG`, once per process. Safe to
/// call from every test.
pub fn trace_init() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Assert that a `TransitionOutcome` is an abort-kind rejection (plain abort
/// or redirect).
#[macro_export]
macro_rules! assert_aborted {
    ($outcome:expr) => {
        match &$outcome {
            Err(err) if err.is_abort() => {}
            other => panic!("expected an abort rejection, got {other:?}"),
        }
    };
}

/// Assert that a `TransitionOutcome` is a redirect rejection; evaluates to
/// the successor transition.
#[macro_export]
macro_rules! assert_redirected {
    ($outcome:expr) => {
        match &$outcome {
            Err(err) => err
                .redirect_target()
                .unwrap_or_else(|| panic!("expected a redirect rejection, got {err:?}")),
            Ok(value) => panic!("expected a redirect rejection, got fulfillment {value:?}"),
        }
    };
}
