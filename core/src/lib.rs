pub mod error;
pub mod handler;
pub mod intent;
pub mod redirect;
pub mod route_info;
pub mod router;
pub mod telemetry;
pub mod transition;

pub use error::TransitionError;
pub use handler::{EventDisposition, RouteHandler, TransitionEvent};
pub use intent::Intent;
pub use redirect::{follow_redirects, follow_redirects_with, FollowPolicy};
pub use route_info::RouteInfo;
pub use router::{LocationUpdater, Router};
pub use transition::{
    Destination, Transition, TransitionId, TransitionOutcome, TransitionPromise, TransitionState,
    UrlMethod,
};

pub mod prelude {
    pub use crate::error::TransitionError;
    pub use crate::handler::{EventDisposition, RouteHandler, TransitionEvent};
    pub use crate::intent::Intent;
    pub use crate::redirect::{follow_redirects, FollowPolicy};
    pub use crate::route_info::RouteInfo;
    pub use crate::router::{LocationUpdater, Router};
    pub use crate::transition::{Destination, Transition, TransitionOutcome, UrlMethod};
}
