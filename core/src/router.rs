//! Router and Location Seams
//!
//! The core does not decide which destination an intent resolves to, nor how
//! the external location is mutated. Both concerns live behind traits so the
//! transition primitive stays collaborator-agnostic.

use async_trait::async_trait;

use crate::intent::Intent;
use crate::transition::Transition;

/// The collaborator that initiates transitions.
///
/// Contract, beyond the signature:
///
/// - at most one transition per router is active at a time; `begin` must
///   abort (or redirect) the previously active transition before activating
///   the new one;
/// - on a redirect, the router constructs the successor and settles the
///   superseded transition via [`Transition::redirect_to`], never via a
///   plain [`Transition::abort`];
/// - resolution steps driven by the router must re-check
///   [`Transition::is_aborted`] before producing side effects, since abort
///   is cooperative and never interrupts scheduled work.
#[async_trait]
pub trait Router: Send + Sync {
    /// Construct and activate a new transition for `intent`.
    async fn begin(&self, intent: Intent) -> Transition;
}

/// External location-update capability invoked by the completion step.
pub trait LocationUpdater: Send + Sync {
    /// Push `url` as a new history entry.
    fn update_url(&self, url: &str);

    /// Replace the current history entry with `url`.
    fn replace_with(&self, url: &str);
}

impl<'a, L: LocationUpdater + ?Sized> LocationUpdater for &'a L {
    fn update_url(&self, url: &str) {
        (**self).update_url(url);
    }

    fn replace_with(&self, url: &str) {
        (**self).replace_with(url);
    }
}

impl<L: LocationUpdater + ?Sized> LocationUpdater for std::sync::Arc<L> {
    fn update_url(&self, url: &str) {
        (**self).update_url(url);
    }

    fn replace_with(&self, url: &str) {
        (**self).replace_with(url);
    }
}
