//! Handlers for health, digest, live news and translation.
//!
//! Error bodies follow the shapes the frontend already understands:
//! `{ status: "error", message }` for digest/news, a bare `{ message }` for
//! the translator.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use super::AppState;
use crate::models::Digest;
use crate::news::{self, filter};
use crate::store;
use crate::translate;

/// `GET /api/health`
pub async fn health(State(st): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "hasNewsKey": st.config.news.api_key.is_some(),
        "hasOpenAIKey": st.config.openai.api_key.is_some(),
    }))
}

/// `GET /api/digest` — serves the cached digest file, never regenerates.
pub async fn digest(
    State(st): State<Arc<AppState>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let digest: Digest = store::read_json(&st.config.digest_path()).map_err(|_| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "error",
                "message": "digest not generated yet (run genba_press digest)",
            })),
        )
    })?;

    Ok(Json(json!({
        "status": "ok",
        "date": digest.date,
        "generatedAtJST": digest.generatedAtJST,
        "items": digest.items,
    })))
}

#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    /// Kept as a string so an unparsable value falls back to the default
    /// instead of rejecting the request.
    #[serde(rename = "pageSize")]
    page_size: Option<String>,
    debug: Option<String>,
}

/// `GET /api/news` — live two-pass selection against the aggregator.
pub async fn news(
    State(st): State<Arc<AppState>>,
    Query(query): Query<NewsQuery>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let Some(api_key) = st.config.news.api_key.as_deref() else {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "error", "message": "NEWSAPI_KEY is missing" })),
        ));
    };

    let requested = query
        .page_size
        .as_deref()
        .and_then(|v| v.parse::<i64>().ok());
    let limit = filter::clamp_limit(requested);
    let debug = query.debug.as_deref() == Some("1");

    let selection =
        news::select_articles(&st.http, &st.config.news.base_url, api_key, limit).await;

    let mut body = json!({
        "status": "ok",
        "totalResults": selection.articles.len(),
        "articles": selection.articles,
        "usedBuckets": selection.used_buckets,
    });
    if debug {
        let mut dbg = json!({ "pass1": selection.pass1 });
        if let Some(pass2) = &selection.pass2 {
            dbg["pass2"] = json!(pass2);
        }
        body["debug"] = dbg;
    }
    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    #[serde(default)]
    pub text: String,
    pub src_lang: Option<String>,
    pub target_lang: Option<String>,
}

/// `POST /api/translate` — ja↔en proxy; a same-language request echoes the
/// input without calling out.
pub async fn translate(
    State(st): State<Arc<AppState>>,
    Json(req): Json<TranslateRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let Some(api_key) = st.config.gemini.api_key.as_deref() else {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "GEMINI_API_KEY is missing" })),
        ));
    };

    let text = req.text.trim();
    if text.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "text is required" })),
        ));
    }

    let src = translate::normalize_src(req.src_lang.as_deref());
    let tgt = translate::normalize_target(req.target_lang.as_deref());
    if src == tgt {
        return Ok(Json(json!({ "translated": text })));
    }

    match translate::translate(&st.http, api_key, &st.config.gemini.model, src, tgt, text).await
    {
        Ok(translated) => Ok(Json(json!({ "translated": translated }))),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": e.to_string() })),
        )),
    }
}
