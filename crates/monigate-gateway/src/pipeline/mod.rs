//! Request pipeline.
//!
//! Every request passes through [`STAGES`] in order, outermost first:
//!
//! | stage        | may short-circuit | notes                                        |
//! |--------------|-------------------|----------------------------------------------|
//! | `Cors`       | yes (preflight)   | stamps `Access-Control-Allow-Origin`         |
//! | `RateLimit`  | yes (429)         | fixed window per client address              |
//! | `Instrument` | no                | feeds both metric views on completion        |
//! | `Audit`      | no                | records the attempt before any auth decision |
//! | `Recover`    | yes (500)         | turns a handler panic into a generic 500     |
//!
//! After the stages, each route's access gate ([`gate::gate`]) runs, then the
//! handler. A stage either answers the request itself or calls the next one;
//! none of them swallow a response once the next stage has produced it.

pub mod gate;
pub mod stages;

use axum::{middleware, Router};

use crate::app_state::AppState;

pub use gate::GateState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Cors,
    RateLimit,
    Instrument,
    Audit,
    Recover,
}

/// Stage order, outermost first.
pub const STAGES: [Stage; 5] = [
    Stage::Cors,
    Stage::RateLimit,
    Stage::Instrument,
    Stage::Audit,
    Stage::Recover,
];

impl Stage {
    fn wrap(self, router: Router<AppState>, app: &AppState) -> Router<AppState> {
        match self {
            Stage::Cors => router.layer(middleware::from_fn_with_state(app.clone(), stages::cors)),
            Stage::RateLimit => {
                router.layer(middleware::from_fn_with_state(app.clone(), stages::rate_limit))
            }
            Stage::Instrument => {
                router.layer(middleware::from_fn_with_state(app.clone(), stages::instrument))
            }
            Stage::Audit => router.layer(middleware::from_fn_with_state(app.clone(), stages::audit)),
            Stage::Recover => router.layer(middleware::from_fn(stages::recover)),
        }
    }
}

/// Wrap `router` in every stage. The last layer added is the outermost, so
/// stages are applied innermost first.
pub fn apply(router: Router<AppState>, app: &AppState) -> Router<AppState> {
    STAGES
        .iter()
        .rev()
        .fold(router, |r, stage| stage.wrap(r, app))
}
