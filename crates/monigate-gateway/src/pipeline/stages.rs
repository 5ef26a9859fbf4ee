use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, MatchedPath, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use futures_util::FutureExt;

use monigate_core::{AuditEntry, MonigateError, RequestEvent};

use crate::app_state::AppState;
use crate::auth::TOKEN_HEADER;
use crate::error::{unhandled_response, ApiError};
use crate::policy::RateDecision;

/// Route label for requests that matched no route.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Client key for rate limiting and audit: the peer IP, when known.
pub fn client_key(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn header_str<'a>(req: &'a Request, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

pub async fn cors(State(app): State<AppState>, req: Request, next: Next) -> Response {
    let origin = HeaderValue::from_str(&app.cfg().gateway.cors_allow_origin)
        .unwrap_or_else(|_| HeaderValue::from_static("*"));

    if req.method() == Method::OPTIONS {
        let mut resp = StatusCode::NO_CONTENT.into_response();
        let h = resp.headers_mut();
        h.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        h.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, HEAD, OPTIONS"),
        );
        h.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type, X-API-Token"),
        );
        return resp;
    }

    let mut resp = next.run(req).await;
    resp.headers_mut()
        .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    resp
}

pub async fn rate_limit(State(app): State<AppState>, req: Request, next: Next) -> Response {
    let client = client_key(&req);
    match app.limiter().check(&client) {
        RateDecision::Admit => next.run(req).await,
        RateDecision::Reject { retry_after } => {
            let secs = retry_after.as_secs().max(1);
            tracing::warn!(
                client = %client,
                path = %req.uri().path(),
                retry_after_secs = secs,
                "rate limit exceeded"
            );
            app.metrics().rate_limited.inc(&[]);
            let mut resp = ApiError::from(MonigateError::RateLimited).into_response();
            resp.headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
            resp
        }
    }
}

pub async fn instrument(State(app): State<AppState>, req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_owned());

    let resp = {
        let _active = app.metrics().track_active();
        next.run(req).await
    };

    let elapsed = start.elapsed();
    let status = resp.status().as_u16();
    app.metrics().observe_request(&method, &route, status, elapsed);
    app.app_metrics().record(&RequestEvent {
        method,
        route,
        status_code: status,
        duration_ms: elapsed.as_secs_f64() * 1000.0,
        timestamp: Instant::now(),
    });
    resp
}

pub async fn audit(State(app): State<AppState>, req: Request, next: Next) -> Response {
    // owned: the request body is not Sync, so no borrow of `req` may cross an await
    let token = header_str(&req, TOKEN_HEADER).map(str::to_owned);
    let user = app
        .authenticator()
        .peek(token.as_deref())
        .await
        .map(|id| id.username)
        .unwrap_or_else(|| "anonymous".to_string());

    let entry = AuditEntry {
        timestamp: Utc::now(),
        user,
        method: req.method().to_string(),
        path: req.uri().path().to_string(),
        client_address: client_key(&req),
        user_agent: header_str(&req, header::USER_AGENT.as_str())
            .unwrap_or("")
            .to_string(),
    };
    app.audit().record(entry).await;

    next.run(req).await
}

pub async fn recover(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(resp) => resp,
        Err(panic) => {
            let msg = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            tracing::error!(
                %method,
                %path,
                panic = %msg,
                backtrace = %std::backtrace::Backtrace::capture(),
                "unhandled error in request handler"
            );
            unhandled_response()
        }
    }
}
