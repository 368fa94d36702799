use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};
use tracing::warn;

use crate::routes::AppState;

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let endpoints: Vec<String> = state
        .orchestrator
        .endpoints()
        .into_iter()
        .map(|endpoint| endpoint.id)
        .collect();

    let (status, database) = match state.orchestrator.store_health().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            warn!("存储健康检查失败: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    let body = json!({
        "status": if status.is_success() { "ok" } else { "degraded" },
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": "relay",
        "version": env!("CARGO_PKG_VERSION"),
        "database": database,
        "endpoints": endpoints,
        "adminRecipients": state.orchestrator.admin_count(),
    });

    (status, Json(body))
}
