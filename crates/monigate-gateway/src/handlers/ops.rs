use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::router::endpoint_table;

pub async fn health(State(app): State<AppState>) -> Json<Value> {
    Json(json!({
        "instance": app.cfg().gateway.instance_name,
        "status": "OK",
        "time": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "uptime_seconds": app.uptime().as_secs(),
    }))
}

pub async fn info(State(app): State<AppState>) -> Json<Value> {
    let endpoints: Vec<Value> = endpoint_table()
        .into_iter()
        .map(|(path, access)| json!({ "method": "GET", "path": path, "access": access.describe() }))
        .collect();

    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "instance": app.cfg().gateway.instance_name,
        "auth_header": "X-API-Token",
        "endpoints": endpoints,
    }))
}

pub async fn prometheus(State(app): State<AppState>) -> Response {
    let extra = app.metrics_extra();
    let body = app.metrics().render(&extra);

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}
