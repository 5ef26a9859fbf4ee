//! Axum router wiring.
//!
//! Each endpoint declares its access class here; protected endpoints get an
//! access gate as a route layer, and the whole router is then wrapped in the
//! pipeline stages.

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    Json, Router,
};
use serde_json::json;

use crate::app_state::AppState;
use crate::auth::RouteAccess;
use crate::handlers::{data, ops};
use crate::pipeline::{self, gate, GateState};

pub const PATH_HEALTH: &str = "/health";
pub const PATH_PROMETHEUS: &str = "/metrics/prometheus";
pub const PATH_INFO: &str = "/api/info";
pub const PATH_METRICS: &str = "/metrics";
pub const PATH_APP_METRICS: &str = "/metrics/application";
pub const PATH_PROCESSES: &str = "/health/processes";
pub const PATH_ALERTS: &str = "/alerts";
pub const PATH_SECURITY: &str = "/security";
pub const PATH_SYSTEM_LOGS: &str = "/logs/system";
pub const PATH_AUDIT_LOGS: &str = "/logs/audit";

struct Endpoint {
    path: &'static str,
    access: RouteAccess,
    handler: MethodRouter<AppState>,
}

fn ep(path: &'static str, access: RouteAccess, handler: MethodRouter<AppState>) -> Endpoint {
    Endpoint {
        path,
        access,
        handler,
    }
}

fn endpoints() -> Vec<Endpoint> {
    use RouteAccess::{Authenticated, Public};

    vec![
        ep(PATH_HEALTH, Public, get(ops::health)),
        ep(PATH_PROMETHEUS, Public, get(ops::prometheus)),
        ep(PATH_INFO, Public, get(ops::info)),
        ep(PATH_METRICS, Authenticated, get(data::metrics_records)),
        ep(PATH_APP_METRICS, Authenticated, get(data::application_metrics)),
        ep(PATH_PROCESSES, Authenticated, get(data::process_health)),
        ep(PATH_ALERTS, Authenticated, get(data::alerts)),
        ep(PATH_SECURITY, Authenticated, get(data::security)),
        ep(PATH_SYSTEM_LOGS, RouteAccess::admin_only(), get(data::system_logs)),
        ep(PATH_AUDIT_LOGS, RouteAccess::admin_only(), get(data::audit_logs)),
    ]
}

/// `(path, access)` for every registered endpoint, in registration order.
pub fn endpoint_table() -> Vec<(&'static str, RouteAccess)> {
    endpoints().into_iter().map(|e| (e.path, e.access)).collect()
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))).into_response()
}

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new();
    for ep in endpoints() {
        let route = Router::new().route(ep.path, ep.handler);
        let route = if ep.access.requires_token() {
            route.route_layer(middleware::from_fn_with_state(
                GateState::new(state.clone(), ep.access),
                gate::gate,
            ))
        } else {
            route
        };
        router = router.merge(route);
    }
    let router = router.fallback(not_found);

    pipeline::apply(router, &state).with_state(state)
}
