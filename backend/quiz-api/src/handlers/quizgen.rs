use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::services::AppState;

/// Re-reads the prompt template from disk.
pub async fn reload_template(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let path = state.templates.path().display().to_string();

    match state.templates.reload().await {
        Ok(template) => Ok(Json(json!({ "path": path, "length": template.len() }))),
        Err(e) => {
            tracing::error!(path = %path, error = %e, "Failed to reload prompt template");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
