//! RouteHandler - Event Listener Seam
//!
//! The hierarchy walker registers one handler per resolved (or resolving)
//! route level. The core only needs the event-listener lookup used by
//! `Transition::trigger`.

use serde_json::Value;

/// An event fired across the transition's handler chain.
#[derive(Debug, Clone)]
pub struct TransitionEvent<'a> {
    pub name: &'a str,
    pub args: &'a [Value],
}

/// What a handler did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    /// The event was consumed; propagation stops.
    Handled,
    /// Not interested; keep walking the chain.
    Pass,
}

/// One level of the (possibly partially resolved) handler chain.
pub trait RouteHandler: Send + Sync {
    /// Name of the route level this handler belongs to.
    fn route_name(&self) -> &str;

    /// Event listener lookup. Handlers that do not listen for anything can
    /// rely on the default.
    fn on_event(&self, event: &TransitionEvent<'_>) -> EventDisposition {
        let _ = event;
        EventDisposition::Pass
    }
}
