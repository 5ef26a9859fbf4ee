//! Per-route access gate: authenticate, then authorize against the route's
//! declared role set. The resolved identity is attached to the request.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::app_state::AppState;
use crate::auth::{authorize, RouteAccess, TOKEN_HEADER};
use crate::error::ApiError;

use super::stages::header_str;

#[derive(Clone)]
pub struct GateState {
    app: AppState,
    access: Arc<RouteAccess>,
}

impl GateState {
    pub fn new(app: AppState, access: RouteAccess) -> Self {
        Self {
            app,
            access: Arc::new(access),
        }
    }
}

pub async fn gate(State(g): State<GateState>, mut req: Request, next: Next) -> Response {
    if !g.access.requires_token() {
        return next.run(req).await;
    }

    let token = header_str(&req, TOKEN_HEADER).map(str::to_owned);
    let identity = match g.app.authenticator().authenticate(token.as_deref()).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(path = %req.uri().path(), reason = "unauthenticated", "access denied");
            g.app.metrics().auth_failures.inc(&[("reason", "unauthenticated")]);
            return ApiError::from(e).into_response();
        }
    };

    if let RouteAccess::Roles(roles) = g.access.as_ref() {
        if let Err(e) = authorize(&identity, roles) {
            tracing::warn!(
                path = %req.uri().path(),
                user = %identity.username,
                role = %identity.role,
                reason = "forbidden",
                "access denied"
            );
            g.app.metrics().auth_failures.inc(&[("reason", "forbidden")]);
            return ApiError::from(e).into_response();
        }
    }

    req.extensions_mut().insert(identity);
    next.run(req).await
}
