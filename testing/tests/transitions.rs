//! Scenario tests for the transition lifecycle: supersession, redirects,
//! retries, URL-method policy, and the promise surface.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use switchback_core::prelude::*;
use switchback_core::telemetry::Traced;
use switchback_test::{
    assert_aborted, assert_redirected, route_chain, trace_init, LocationCall, RecordingHandler,
    TestLocation, TestRouter,
};

fn intent(label: &str) -> Intent {
    Intent::new(label, label.to_string())
}

fn destination(url: &str) -> Destination {
    Destination {
        to: route_chain(&["app", "section", "leaf"]),
        url: url.to_string(),
    }
}

#[tokio::test]
async fn settles_exactly_once() {
    trace_init();
    let router = TestRouter::new();
    let location = TestLocation::new();
    let transition = router.begin(intent("/a")).await;
    let promise = transition.promise();

    assert!(transition.complete(destination("/a"), &location));
    assert!(!transition.complete(destination("/b"), &location));
    transition.abort();

    // abort after settlement left no trace
    assert!(!transition.is_aborted());
    assert_eq!(promise.outcome().await.unwrap().url, "/a");
    assert_eq!(location.calls(), vec![LocationCall::Update("/a".into())]);
    assert_eq!(transition.to().unwrap().name(), "leaf");
}

#[tokio::test]
async fn abort_rejects_every_observer() {
    trace_init();
    let router = TestRouter::new();
    let transition = router.begin(intent("/a")).await;
    let first = transition.promise().labeled("bare observer");
    let second = transition.promise();

    transition.abort();

    assert_aborted!(first.outcome().await);
    assert_aborted!(second.outcome().await);
    // a settled-as-aborted transition refuses completion
    assert!(!transition.complete(destination("/a"), &TestLocation::new()));
}

#[tokio::test]
async fn newer_transition_supersedes_older() {
    trace_init();
    let router = TestRouter::new();
    let a = router.begin(intent("/x")).await;
    let b = router.begin(intent("/y")).await;

    let outcome = a.promise().outcome().await;
    assert_aborted!(outcome);
    assert!(outcome.unwrap_err().redirect_target().is_none());

    let location = TestLocation::new();
    assert!(b.complete(destination("/y"), &location));
    assert_eq!(b.promise().outcome().await.unwrap().url, "/y");
    assert_eq!(router.begun().len(), 2);
}

#[tokio::test]
async fn retry_carries_data_into_new_attempt() {
    trace_init();
    let router = TestRouter::new();
    let transition = router.begin(intent("/settings")).await;
    transition.set_data("auth", json!({ "user": "sam" }));
    transition.set_data("attempts", json!(1));

    let retried = transition.retry().await.unwrap();

    assert!(transition.is_aborted());
    assert_ne!(transition.id(), retried.id());
    assert_eq!(retried.data("auth"), Some(json!({ "user": "sam" })));
    assert_eq!(retried.data("attempts"), Some(json!(1)));
    assert_eq!(retried.intent().label(), "/settings");
    assert_eq!(router.current().unwrap().id(), retried.id());
}

#[tokio::test]
async fn follow_redirects_adopts_final_outcome() {
    trace_init();
    let router = TestRouter::new();
    let a = router.begin(intent("/start")).await;

    let follower = tokio::spawn({
        let a = a.clone();
        async move { follow_redirects(&a).await }
    });

    let b = router.redirect(intent("/via"));
    let c = router.redirect(intent("/end"));
    assert!(c.complete(destination("/end"), &TestLocation::new()));

    // the bare promise surfaces the redirect, referencing the direct successor
    let a_outcome = a.promise().outcome().await;
    let successor = assert_redirected!(a_outcome);
    assert_eq!(successor.id(), b.id());

    // the follower sees only the terminal outcome, transitively
    assert_eq!(follower.await.unwrap().unwrap().url, "/end");
    assert_eq!(follow_redirects(&b).await.unwrap().url, "/end");
}

#[tokio::test]
async fn redirected_then_failed_chain_propagates_failure() {
    trace_init();
    let router = TestRouter::new();
    let a = router.begin(intent("/start")).await;
    let b = router.redirect(intent("/broken"));
    b.fail(anyhow::anyhow!("could not resolve `/broken`"));

    let err = follow_redirects(&a).await.unwrap_err();
    assert!(!err.is_abort());
    assert_eq!(err.to_string(), "could not resolve `/broken`");
}

#[tokio::test]
async fn url_method_none_suppresses_location_calls() {
    trace_init();
    let router = TestRouter::new();
    let location = TestLocation::new();
    let transition = router.begin(intent("/silent")).await;
    transition.method(UrlMethod::None);

    assert!(transition.complete(destination("/silent"), &location));
    assert_eq!((&transition).await.unwrap().url, "/silent");
    assert!(location.calls().is_empty());
}

struct SettledProbe {
    transition: Transition,
    calls: Mutex<Vec<(String, bool)>>,
}

impl LocationUpdater for SettledProbe {
    fn update_url(&self, url: &str) {
        self.calls
            .lock()
            .push((format!("update:{url}"), self.transition.is_settled()));
    }

    fn replace_with(&self, url: &str) {
        self.calls
            .lock()
            .push((format!("replace:{url}"), self.transition.is_settled()));
    }
}

#[tokio::test]
async fn replace_is_called_once_and_only_after_fulfillment() {
    trace_init();
    let router = TestRouter::new();
    let transition = router.begin(intent("/p")).await;
    transition.method(UrlMethod::from_name(Some("replace")));

    let probe = SettledProbe {
        transition: transition.clone(),
        calls: Mutex::new(Vec::new()),
    };
    assert!(transition.complete(destination("/p"), &probe));

    let calls = probe.calls.lock().clone();
    assert_eq!(calls, vec![("replace:/p".to_string(), true)]);
}

#[tokio::test]
async fn trigger_works_on_partially_resolved_hierarchy() {
    trace_init();
    let router = TestRouter::new();
    let transition = router.begin(intent("/posts/7")).await;

    let app = Arc::new(RecordingHandler::new("app").handling("warn"));
    transition.push_handler(app.clone());

    // leaf not entered yet; events still reach the resolved portion
    transition.trigger(false, "warn", &[json!("disk full")]).unwrap();
    assert_eq!(app.seen(), ["warn"]);

    let post = Arc::new(RecordingHandler::new("post").handling("save"));
    transition.push_handler(post.clone());

    // leaf handles it first; the root never sees the event
    transition.send(false, "save", &[]).unwrap();
    assert_eq!(post.seen(), ["save"]);
    assert_eq!(app.seen(), ["warn"]);

    let err = transition.trigger(false, "missing", &[]).unwrap_err();
    match err {
        TransitionError::UnhandledEvent { name } => assert_eq!(name, "missing"),
        other => panic!("expected UnhandledEvent, got {other:?}"),
    }
    transition.trigger(true, "missing", &[]).unwrap();
}

#[tokio::test]
async fn combinators_follow_promise_semantics() {
    trace_init();
    let router = TestRouter::new();
    let location = TestLocation::new();

    let fulfilled = router.begin(intent("/a")).await;
    fulfilled.complete(destination("/a"), &location);
    let url = fulfilled
        .then(|destination| destination.url, |err| err.to_string())
        .await;
    assert_eq!(url, "/a");

    let ran = Arc::new(AtomicBool::new(false));
    let outcome = fulfilled
        .finally({
            let ran = ran.clone();
            move || ran.store(true, Ordering::SeqCst)
        })
        .await;
    assert!(ran.load(Ordering::SeqCst));
    assert!(outcome.is_ok());

    // callers who do not want to see aborts can recover in catch
    let aborted = router.begin(intent("/b")).await;
    aborted.abort();
    let recovered = aborted
        .catch(|err| {
            if err.is_abort() {
                Ok(destination("/recovered"))
            } else {
                Err(err)
            }
        })
        .await;
    assert_eq!(recovered.unwrap().url, "/recovered");
}

#[tokio::test]
async fn from_tracks_the_previous_position() {
    trace_init();
    let router = TestRouter::new();
    let first = router.begin(intent("/a")).await;
    assert!(first.from().is_none());

    first.complete(destination("/a"), &TestLocation::new());
    let second = router.begin(intent("/b")).await;

    assert_eq!(second.from().unwrap().name(), "leaf");
}

#[tokio::test]
async fn traced_location_passes_through() {
    trace_init();
    let router = TestRouter::new();
    let location = TestLocation::new();
    let traced = Traced::new(&location, "memory");

    let transition = router.begin(intent("/t")).await;
    assert!(transition.complete(destination("/t"), &traced));
    assert_eq!(location.calls(), vec![LocationCall::Update("/t".into())]);
}
