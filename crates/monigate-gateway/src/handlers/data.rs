use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use monigate_core::error::MonigateError;

use crate::app_state::AppState;
use crate::artifacts::Artifact;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Default, Deserialize)]
pub struct TailQuery {
    pub limit: Option<usize>,
}

/// Requested limit, or `default`, clamped to `1..=max_limit`.
fn effective_limit(
    app: &AppState,
    q: Result<Query<TailQuery>, QueryRejection>,
    default: usize,
) -> ApiResult<usize> {
    let Query(q) = q.map_err(|e| MonigateError::BadRequest(format!("invalid query: {e}")))?;
    let max = app.cfg().artifacts.max_limit;
    Ok(q.limit.unwrap_or(default).clamp(1, max))
}

/// Log and count an artifact failure before it becomes a generic 500.
fn artifact_failure(app: &AppState, artifact: Artifact, e: MonigateError) -> ApiError {
    let kind = match e {
        MonigateError::MalformedArtifact { .. } => "malformed",
        _ => "io",
    };
    tracing::error!(
        artifact = artifact.file_name(),
        path = %app.artifacts().path_of(artifact).display(),
        error = %e,
        "artifact read failed"
    );
    app.metrics()
        .artifact_errors
        .inc(&[("artifact", artifact.file_name()), ("kind", kind)]);
    ApiError(e)
}

async fn tail_lines(app: &AppState, artifact: Artifact, n: usize) -> ApiResult<Vec<String>> {
    app.artifacts()
        .tail_lines(artifact, n)
        .await
        .map_err(|e| artifact_failure(app, artifact, e))
}

async fn tail_json(app: &AppState, artifact: Artifact, n: usize) -> ApiResult<Vec<Value>> {
    app.artifacts()
        .tail_json(artifact, n)
        .await
        .map_err(|e| artifact_failure(app, artifact, e))
}

/// `GET /metrics`: recent samples from the external metrics producer.
pub async fn metrics_records(
    State(app): State<AppState>,
    q: Result<Query<TailQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let n = effective_limit(&app, q, app.cfg().artifacts.limits.metrics)?;
    let records = tail_json(&app, Artifact::Metrics, n).await?;
    let count = records.len();
    Ok(Json(json!({ "metrics": records, "count": count })))
}

/// `GET /metrics/application`: this gateway's own request aggregate.
pub async fn application_metrics(State(app): State<AppState>) -> ApiResult<Json<Value>> {
    let snapshot = app.app_metrics().snapshot();
    Ok(Json(json!({
        "instance": app.cfg().gateway.instance_name,
        "uptime_seconds": app.uptime().as_secs(),
        "active_connections": app.metrics().active(),
        "application": snapshot,
    })))
}

/// `GET /health/processes`: the producer's process-health document.
pub async fn process_health(State(app): State<AppState>) -> ApiResult<Json<Value>> {
    let doc = app
        .artifacts()
        .read_json(Artifact::ProcessHealth)
        .await
        .map_err(|e| artifact_failure(&app, Artifact::ProcessHealth, e))?;
    Ok(Json(json!({ "processes": doc.unwrap_or_else(|| json!({})) })))
}

pub async fn alerts(
    State(app): State<AppState>,
    q: Result<Query<TailQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let n = effective_limit(&app, q, app.cfg().artifacts.limits.alerts)?;
    let alerts = tail_lines(&app, Artifact::Alerts, n).await?;
    let count = alerts.len();
    Ok(Json(json!({ "alerts": alerts, "count": count })))
}

pub async fn security(
    State(app): State<AppState>,
    q: Result<Query<TailQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let n = effective_limit(&app, q, app.cfg().artifacts.limits.security)?;
    let events = tail_lines(&app, Artifact::Security, n).await?;
    let count = events.len();
    Ok(Json(json!({ "events": events, "count": count })))
}

pub async fn system_logs(
    State(app): State<AppState>,
    q: Result<Query<TailQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let n = effective_limit(&app, q, app.cfg().artifacts.limits.system)?;
    let logs = tail_lines(&app, Artifact::SystemAnalysis, n).await?;
    let count = logs.len();
    Ok(Json(json!({ "logs": logs, "count": count })))
}

pub async fn audit_logs(
    State(app): State<AppState>,
    q: Result<Query<TailQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let n = effective_limit(&app, q, app.cfg().artifacts.limits.audit)?;
    let entries = tail_json(&app, Artifact::Audit, n).await?;
    let count = entries.len();
    Ok(Json(json!({ "entries": entries, "count": count })))
}
