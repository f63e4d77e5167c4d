//! Transition - The Cancellable Unit of Navigation
//!
//! A `Transition` is a promise-like handle for one attempt to move the
//! application to a new route position. It can be aborted, either explicitly
//! via [`Transition::abort`] or implicitly by the router starting another
//! transition while this one is underway, and an aborted transition can be
//! [`Transition::retry`]d later.
//!
//! The promise side is a settled-exactly-once deferred outcome; any number of
//! [`TransitionPromise`] handles observe the same settlement. Cancellation is
//! cooperative: `abort` settles the outcome and flips a flag, and resolution
//! code driving the transition re-checks [`Transition::is_aborted`] before
//! producing further side effects.

use std::collections::HashMap;
use std::fmt;
use std::future::IntoFuture;
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::TransitionError;
use crate::handler::{EventDisposition, RouteHandler, TransitionEvent};
use crate::intent::Intent;
use crate::route_info::RouteInfo;
use crate::router::{LocationUpdater, Router};

pub type TransitionId = Uuid;

/// The settled result of a transition attempt.
pub type TransitionOutcome = Result<Destination, TransitionError>;

/// Fulfillment value of a successful transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Leafmost node of the resolved route position.
    pub to: Arc<RouteInfo>,
    /// URL the location updater is handed on completion.
    pub url: String,
}

/// How the external location should be changed once a transition completes.
///
/// `None` is used for transitions whose URL already reflects the destination
/// (handling a URL change that already happened) or that must not touch
/// history at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlMethod {
    #[default]
    Update,
    Replace,
    None,
}

impl UrlMethod {
    /// Coercion table for string-typed method names: `"replace"` selects
    /// [`UrlMethod::Replace`], any other non-empty name selects
    /// [`UrlMethod::Update`], and an absent or empty name disables the URL
    /// change entirely.
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("replace") => Self::Replace,
            Some(other) if !other.is_empty() => Self::Update,
            _ => Self::None,
        }
    }
}

/// Mutable resolution snapshot owned by the driving router.
///
/// The handler list is root-first and may be partial while the destination is
/// still resolving; `trigger` walks it in reverse (leaf to root).
#[derive(Default)]
pub struct TransitionState {
    pub handlers: Vec<Arc<dyn RouteHandler>>,
    pub to: Option<Arc<RouteInfo>>,
    pub from: Option<Arc<RouteInfo>>,
    pub error: Option<Arc<anyhow::Error>>,
    pub aborted: bool,
}

impl fmt::Debug for TransitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionState")
            .field(
                "handlers",
                &self
                    .handlers
                    .iter()
                    .map(|h| h.route_name().to_string())
                    .collect::<Vec<_>>(),
            )
            .field("to", &self.to.as_ref().map(|r| r.name().to_string()))
            .field("from", &self.from.as_ref().map(|r| r.name().to_string()))
            .field("error", &self.error)
            .field("aborted", &self.aborted)
            .finish()
    }
}

struct Inner {
    id: TransitionId,
    router: Weak<dyn Router>,
    intent: Intent,
    started_at: DateTime<Utc>,
    state: Mutex<TransitionState>,
    data: Mutex<HashMap<String, Value>>,
    url_method: Mutex<UrlMethod>,
    settle_tx: watch::Sender<Option<TransitionOutcome>>,
    settle_rx: watch::Receiver<Option<TransitionOutcome>>,
}

/// One attempt to navigate. Cheap to clone; all clones share the same
/// underlying attempt.
#[derive(Clone)]
pub struct Transition {
    inner: Arc<Inner>,
}

impl Transition {
    /// Create a pending transition for `intent`.
    ///
    /// The router reference is weak on purpose: routers hold their active
    /// transition, and a strong back-reference would cycle.
    pub fn new(router: Weak<dyn Router>, intent: Intent) -> Self {
        Self::with_state(router, intent, TransitionState::default())
    }

    /// Create a pending transition seeded with resolution state, deriving
    /// `to`/`from` from it.
    pub fn with_state(router: Weak<dyn Router>, intent: Intent, state: TransitionState) -> Self {
        let (settle_tx, settle_rx) = watch::channel(None);
        let transition = Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                router,
                intent,
                started_at: Utc::now(),
                state: Mutex::new(state),
                data: Mutex::new(HashMap::new()),
                url_method: Mutex::new(UrlMethod::default()),
                settle_tx,
                settle_rx,
            }),
        };
        tracing::debug!(
            transition = %transition.id(),
            intent = transition.intent().label(),
            "transition started"
        );
        transition
    }

    /// Create a transition that is already rejected with `error`. No
    /// resolution is attempted.
    pub fn failed(router: Weak<dyn Router>, intent: Intent, error: anyhow::Error) -> Self {
        let transition = Self::new(router, intent);
        transition.fail(error);
        transition
    }

    pub fn id(&self) -> TransitionId {
        self.inner.id
    }

    pub fn intent(&self) -> &Intent {
        &self.inner.intent
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner.started_at
    }

    /// Leafmost node of the destination, once known.
    pub fn to(&self) -> Option<Arc<RouteInfo>> {
        self.inner.state.lock().to.clone()
    }

    /// Leafmost node of the origin position; `None` for an initial
    /// transition with no prior position.
    pub fn from(&self) -> Option<Arc<RouteInfo>> {
        self.inner.state.lock().from.clone()
    }

    pub fn url_method(&self) -> UrlMethod {
        *self.inner.url_method.lock()
    }

    pub fn is_settled(&self) -> bool {
        self.inner.settle_tx.borrow().is_some()
    }

    /// Monotonic: once aborted, a transition stays aborted. `retry` produces
    /// a fresh transition instead of resetting this one.
    pub fn is_aborted(&self) -> bool {
        self.inner.state.lock().aborted
    }

    /// A promise handle for this attempt. The handle can be passed around
    /// where the transition itself (which is externally abortable) should
    /// not be.
    pub fn promise(&self) -> TransitionPromise {
        TransitionPromise {
            id: self.inner.id,
            label: None,
            rx: self.inner.settle_rx.clone(),
        }
    }

    /// Settle exactly once. Returns whether this call performed the
    /// settlement; later attempts are no-ops.
    fn settle(&self, outcome: TransitionOutcome) -> bool {
        self.inner.settle_tx.send_if_modified(|slot| {
            if slot.is_none() {
                *slot = Some(outcome);
                true
            } else {
                false
            }
        })
    }

    /// Abort the transition. No-op once settled; idempotent otherwise.
    pub fn abort(&self) -> &Self {
        if self.is_settled() {
            return self;
        }
        self.inner.state.lock().aborted = true;
        if self.settle(Err(TransitionError::Aborted { id: self.inner.id })) {
            tracing::debug!(transition = %self.id(), "transition aborted");
        }
        self
    }

    /// Abandon this transition in favor of `successor`.
    ///
    /// This is an abort with a payload: plain promise observers see a
    /// cancellation, while `follow_redirects` chases the successor.
    pub fn redirect_to(&self, successor: &Transition) -> &Self {
        if self.is_settled() {
            return self;
        }
        self.inner.state.lock().aborted = true;
        if self.settle(Err(TransitionError::Redirected {
            to: successor.clone(),
        })) {
            tracing::debug!(
                transition = %self.id(),
                successor = %successor.id(),
                "transition redirected"
            );
        }
        self
    }

    /// Reject the transition with a resolution failure, preserving the
    /// original cause for promise observers.
    pub fn fail(&self, error: anyhow::Error) -> bool {
        if self.is_settled() {
            return false;
        }
        let cause = Arc::new(error);
        self.inner.state.lock().error = Some(cause.clone());
        let settled = self.settle(Err(TransitionError::Resolution(cause)));
        if settled {
            tracing::debug!(transition = %self.id(), "transition failed");
        }
        settled
    }

    /// Fulfill the transition and apply the configured URL change.
    ///
    /// The promise is fulfilled strictly before the location updater is
    /// invoked, so `then` observers can never race the URL mutation. Returns
    /// whether this call performed the settlement (false when the transition
    /// was already settled or aborted).
    pub fn complete(&self, destination: Destination, location: &dyn LocationUpdater) -> bool {
        if self.is_aborted() || self.is_settled() {
            return false;
        }
        let method = self.url_method();
        self.inner.state.lock().to = Some(destination.to.clone());
        if !self.settle(Ok(destination.clone())) {
            return false;
        }
        match method {
            UrlMethod::Update => location.update_url(&destination.url),
            UrlMethod::Replace => location.replace_with(&destination.url),
            UrlMethod::None => {}
        }
        tracing::debug!(
            transition = %self.id(),
            url = %destination.url,
            ?method,
            "transition completed"
        );
        true
    }

    /// Abort this transition if still pending and ask the router to start a
    /// fresh attempt for the same intent. Entries in the transition's data
    /// map survive into the new transition.
    pub async fn retry(&self) -> Result<Transition, TransitionError> {
        self.abort();
        let router = self
            .inner
            .router
            .upgrade()
            .ok_or(TransitionError::RouterDropped)?;
        let next = router.begin(self.inner.intent.clone()).await;
        let carried = self.inner.data.lock().clone();
        next.inner.data.lock().extend(carried);
        tracing::debug!(transition = %self.id(), retry = %next.id(), "transition retried");
        Ok(next)
    }

    /// Select the URL-changing method employed at the end of a successful
    /// transition. Has no observable effect once the transition settled
    /// (completion has already read the method by then).
    pub fn method(&self, method: UrlMethod) -> &Self {
        if !self.is_settled() {
            *self.inner.url_method.lock() = method;
        }
        self
    }

    /// Store a caller-defined decoration on this transition. Entries are
    /// copied into transitions produced by `retry`.
    pub fn set_data(&self, key: impl Into<String>, value: Value) -> &Self {
        self.inner.data.lock().insert(key.into(), value);
        self
    }

    /// Read back a decoration set via [`Transition::set_data`].
    pub fn data(&self, key: &str) -> Option<Value> {
        self.inner.data.lock().get(key).cloned()
    }

    pub fn data_snapshot(&self) -> HashMap<String, Value> {
        self.inner.data.lock().clone()
    }

    /// Record a handler as resolved/resolving. Routers push these root-first
    /// as resolution proceeds, which is what lets `trigger` operate on a
    /// partially entered hierarchy.
    pub fn push_handler(&self, handler: Arc<dyn RouteHandler>) {
        self.inner.state.lock().handlers.push(handler);
    }

    pub fn handlers(&self) -> Vec<Arc<dyn RouteHandler>> {
        self.inner.state.lock().handlers.clone()
    }

    /// Fire an event on the current list of resolved/resolving handlers,
    /// leaf to root, until one handles it.
    ///
    /// With `ignore_failure` an unhandled event completes silently;
    /// otherwise it is a [`TransitionError::UnhandledEvent`].
    pub fn trigger(
        &self,
        ignore_failure: bool,
        name: &str,
        args: &[Value],
    ) -> Result<(), TransitionError> {
        let event = TransitionEvent { name, args };
        let handlers = self.handlers();
        for handler in handlers.iter().rev() {
            if handler.on_event(&event) == EventDisposition::Handled {
                tracing::trace!(
                    transition = %self.id(),
                    event = name,
                    handled_by = handler.route_name(),
                    "event handled"
                );
                return Ok(());
            }
        }
        if ignore_failure {
            Ok(())
        } else {
            Err(TransitionError::UnhandledEvent {
                name: name.to_string(),
            })
        }
    }

    /// Alias for [`Transition::trigger`].
    pub fn send(
        &self,
        ignore_failure: bool,
        name: &str,
        args: &[Value],
    ) -> Result<(), TransitionError> {
        self.trigger(ignore_failure, name, args)
    }

    /// Standard promise hook: run one of the callbacks once the transition
    /// settles, mapping both sides to a common result.
    pub async fn then<T>(
        &self,
        on_fulfilled: impl FnOnce(Destination) -> T,
        on_rejected: impl FnOnce(TransitionError) -> T,
    ) -> T {
        self.promise().then(on_fulfilled, on_rejected).await
    }

    /// Recover from (or rethrow) a rejection.
    pub async fn catch(
        &self,
        on_rejection: impl FnOnce(TransitionError) -> TransitionOutcome,
    ) -> TransitionOutcome {
        self.promise().catch(on_rejection).await
    }

    /// Run `callback` after settlement, passing the outcome through.
    pub async fn finally(&self, callback: impl FnOnce()) -> TransitionOutcome {
        self.promise().finally(callback).await
    }

    /// Follow any redirects and settle with the final transition's outcome.
    /// See [`crate::redirect::follow_redirects`].
    pub async fn follow_redirects(&self) -> TransitionOutcome {
        crate::redirect::follow_redirects(self).await
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("id", &self.inner.id)
            .field("intent", &self.inner.intent)
            .field("settled", &self.is_settled())
            .field("aborted", &self.is_aborted())
            .field("url_method", &self.url_method())
            .finish()
    }
}

impl IntoFuture for Transition {
    type Output = TransitionOutcome;
    type IntoFuture = BoxFuture<'static, TransitionOutcome>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.promise().outcome())
    }
}

impl IntoFuture for &Transition {
    type Output = TransitionOutcome;
    type IntoFuture = BoxFuture<'static, TransitionOutcome>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.promise().outcome())
    }
}

/// Clonable promise handle on a transition's deferred outcome.
///
/// Unlike the [`Transition`] it came from, a promise handle cannot abort the
/// attempt; it only observes the settlement.
#[derive(Clone)]
pub struct TransitionPromise {
    id: TransitionId,
    label: Option<&'static str>,
    rx: watch::Receiver<Option<TransitionOutcome>>,
}

impl TransitionPromise {
    /// Attach an advisory label, surfaced through tracing when the promise
    /// observes settlement. Has no effect on resolution order.
    pub fn labeled(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    pub fn transition_id(&self) -> TransitionId {
        self.id
    }

    /// Wait for the transition to settle.
    ///
    /// If every transition handle is dropped before settlement the attempt
    /// can never finish, which observers see as an abort.
    pub async fn outcome(mut self) -> TransitionOutcome {
        let settled = self
            .rx
            .wait_for(Option::is_some)
            .await
            .map(|slot| (*slot).clone());
        let outcome = match settled {
            Ok(Some(outcome)) => outcome,
            _ => Err(TransitionError::Aborted { id: self.id }),
        };
        if let Some(label) = self.label {
            tracing::trace!(
                promise = label,
                transition = %self.id,
                fulfilled = outcome.is_ok(),
                "promise settled"
            );
        }
        outcome
    }

    pub async fn then<T>(
        self,
        on_fulfilled: impl FnOnce(Destination) -> T,
        on_rejected: impl FnOnce(TransitionError) -> T,
    ) -> T {
        match self.outcome().await {
            Ok(destination) => on_fulfilled(destination),
            Err(err) => on_rejected(err),
        }
    }

    pub async fn catch(
        self,
        on_rejection: impl FnOnce(TransitionError) -> TransitionOutcome,
    ) -> TransitionOutcome {
        match self.outcome().await {
            Ok(destination) => Ok(destination),
            Err(err) => on_rejection(err),
        }
    }

    pub async fn finally(self, callback: impl FnOnce()) -> TransitionOutcome {
        let outcome = self.outcome().await;
        callback();
        outcome
    }
}

impl fmt::Debug for TransitionPromise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionPromise")
            .field("transition", &self.id)
            .field("label", &self.label)
            .finish()
    }
}

impl IntoFuture for TransitionPromise {
    type Output = TransitionOutcome;
    type IntoFuture = BoxFuture<'static, TransitionOutcome>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.outcome())
    }
}
