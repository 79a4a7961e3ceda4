//! Theme queue CRUD.
//!
//! The queue is the only mutable state the server owns; every handler goes
//! through [`crate::store`] so concurrent edits keep the atomic-rename
//! guarantee.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use super::AppState;
use crate::store;
use crate::utils::safe_text;

fn internal(e: anyhow::Error) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "status": "ng", "message": e.to_string() })),
    )
}

/// `GET /api/genba/themes`
pub async fn list(State(st): State<Arc<AppState>>) -> Json<Value> {
    let items = store::load_queue(&st.config.queue_path());
    Json(json!({ "status": "ok", "items": items }))
}

#[derive(Debug, Deserialize)]
pub struct AddTheme {
    #[serde(default)]
    pub theme: String,
}

/// `POST /api/genba/themes`
pub async fn add(
    State(st): State<Arc<AppState>>,
    Json(req): Json<AddTheme>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let theme = safe_text(&req.theme);
    if theme.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": "ng", "message": "theme is required" })),
        ));
    }

    let (entry, size) = store::push_theme(&st.config.queue_path(), &theme).map_err(internal)?;
    info!(id = %entry.id, size, "theme queued");
    Ok(Json(json!({ "status": "ok", "queued": true, "size": size })))
}

/// `DELETE /api/genba/themes/{id}`
pub async fn remove(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let id = safe_text(&id);
    if id.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": "ng", "message": "id is required" })),
        ));
    }

    match store::remove_theme(&st.config.queue_path(), &id).map_err(internal)? {
        Some(size) => {
            info!(id = %id, size, "theme removed");
            Ok(Json(json!({ "status": "ok", "deleted": true, "size": size })))
        }
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "status": "ng", "message": "not found" })),
        )),
    }
}

/// `DELETE /api/genba/themes` — empties the whole queue.
pub async fn clear(
    State(st): State<Arc<AppState>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    store::clear_themes(&st.config.queue_path()).map_err(internal)?;
    info!("theme queue cleared");
    Ok(Json(json!({ "status": "ok", "cleared": true, "size": 0 })))
}
