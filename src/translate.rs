//! Japanese/English translation through the Gemini `generateContent` API.
//!
//! Only the ja↔en pair is supported; unknown language codes settle on the
//! en→ja direction. The input is clipped before being sent so one oversized
//! request cannot run up latency or cost.

use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::prompts;
use crate::utils::{char_len, truncate_chars};

/// Characters of input kept per request.
const MAX_CHARS: usize = 8000;

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

/// Source language: `ja` when asked for, anything else reads as `en`.
pub fn normalize_src(lang: Option<&str>) -> &'static str {
    if lang == Some("ja") { "ja" } else { "en" }
}

/// Target language: `en` when asked for, anything else reads as `ja`.
pub fn normalize_target(lang: Option<&str>) -> &'static str {
    if lang == Some("en") { "en" } else { "ja" }
}

/// Translate `text` from `src` to `tgt`.
///
/// # Returns
///
/// The translation with surrounding whitespace trimmed; empty when the model
/// returned no candidates.
///
/// # Errors
///
/// A non-success HTTP status becomes an error carrying the status code and
/// the response body.
#[instrument(level = "info", skip_all, fields(model = %model, src = %src, tgt = %tgt, chars = char_len(text)))]
pub async fn translate(
    http: &Client,
    api_key: &str,
    model: &str,
    src: &str,
    tgt: &str,
    text: &str,
) -> Result<String> {
    let clipped = truncate_chars(text, MAX_CHARS);
    let prompt = prompts::translate(src, tgt, &clipped);
    let url = format!(
        "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
        urlencoding::encode(model)
    );

    let response = http
        .post(&url)
        .header("x-goog-api-key", api_key)
        .json(&serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        }))
        .send()
        .await
        .context("Gemini request failed")?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("Gemini API HTTP {}: {}", status.as_u16(), body);
    }

    let data: GenerateContentResponse = response
        .json()
        .await
        .context("parsing Gemini response")?;
    let translated = data
        .candidates
        .first()
        .map(|c| {
            c.content
                .parts
                .iter()
                .map(|p| p.text.as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
        .trim()
        .to_string();

    info!(chars = char_len(&translated), "translation received");
    Ok(translated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_src() {
        assert_eq!(normalize_src(Some("ja")), "ja");
        assert_eq!(normalize_src(Some("en")), "en");
        assert_eq!(normalize_src(Some("fr")), "en");
        assert_eq!(normalize_src(None), "en");
    }

    #[test]
    fn test_normalize_target() {
        assert_eq!(normalize_target(Some("en")), "en");
        assert_eq!(normalize_target(Some("ja")), "ja");
        assert_eq!(normalize_target(Some("de")), "ja");
        assert_eq!(normalize_target(None), "ja");
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [{ "text": "こんにちは" }, { "text": "世界" }],
                    "role": "model"
                },
                "finishReason": "STOP"
            }]
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(json).unwrap();
        let joined: String = parsed.candidates[0]
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        assert_eq!(joined, "こんにちは世界");
    }

    #[test]
    fn test_response_parsing_empty() {
        let parsed: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.candidates.is_empty());
    }
}
