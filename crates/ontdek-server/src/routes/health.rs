use axum::extract::State;
use axum::Json;

use crate::state::AppState;

/// GET /api/health: liveness check.
pub async fn health(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "site": app.config.site.name,
    }))
}
