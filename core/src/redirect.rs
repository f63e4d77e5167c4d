//! Redirect Follower
//!
//! Transitions are aborted and their promises rejected when redirects occur.
//! [`follow_redirects`] adapts that into a promise for the *final* outcome:
//! it chases [`TransitionError::Redirected`] rejections from transition to
//! transition and settles with whatever the last one settles with.

use serde::{Deserialize, Serialize};

use crate::transition::{Transition, TransitionOutcome};

/// Tunables for redirect following.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowPolicy {
    /// Number of redirect hops after which a warning is logged. Each redirect
    /// produces a genuinely new transition, so a degenerate cycle shows up as
    /// an ever-growing chain rather than a hang; the warning makes that
    /// observable.
    pub warn_after: usize,
}

impl Default for FollowPolicy {
    fn default() -> Self {
        Self { warn_after: 16 }
    }
}

/// Settle with the outcome of the final transition in the redirect chain.
///
/// Fulfillments and non-redirect rejections are passed through verbatim, so
/// callers see aborts and resolution failures exactly as a plain promise
/// observer of the final transition would.
pub async fn follow_redirects(transition: &Transition) -> TransitionOutcome {
    follow_redirects_with(transition, FollowPolicy::default()).await
}

/// [`follow_redirects`] with an explicit policy.
pub async fn follow_redirects_with(
    transition: &Transition,
    policy: FollowPolicy,
) -> TransitionOutcome {
    let mut current = transition.clone();
    let mut hops = 0usize;
    loop {
        let outcome = current.promise().outcome().await;
        let err = match outcome {
            Ok(destination) => return Ok(destination),
            Err(err) => err,
        };
        match err.redirect_target() {
            Some(next) => {
                hops += 1;
                if hops == policy.warn_after {
                    tracing::warn!(
                        origin = %transition.id(),
                        hops,
                        "redirect chain is unusually long; possible redirect loop"
                    );
                }
                current = next;
            }
            None => return Err(err),
        }
    }
}
