//! Readable-body extraction for digest source articles.
//!
//! The aggregator only carries a title and a short description per article, so
//! the digest pipeline fetches each article page and runs it through the
//! Readability algorithm to recover the actual body text. When a page resists
//! extraction (paywalls, consent walls, script-only shells) the caller falls
//! back to the aggregator's own title/description pair.

use anyhow::{Context, Result};
use readability::extractor;
use reqwest::Client;
use std::io::Cursor;
use tracing::{debug, instrument};
use url::Url;

use crate::utils::{char_len, truncate_chars};

/// Browser-ish User-Agent; several news sites serve stripped pages to
/// unknown clients.
const USER_AGENT: &str = "Mozilla/5.0 (genba_press)";

/// Extracted body text is clipped to this many characters before it is sent
/// to the summarizer.
const MAX_BODY_CHARS: usize = 12_000;

/// Below this many characters the extraction is considered too thin and the
/// aggregator title/description stand in for the body.
const MIN_EXTRACTED_CHARS: usize = 200;

/// Bodies shorter than this are not worth summarizing at all.
const MIN_BODY_CHARS: usize = 80;

/// Title and body text recovered from an article page.
#[derive(Debug, Clone)]
pub struct ExtractedArticle {
    pub title: String,
    pub text: String,
}

/// Fetches an article page and extracts its readable title and body text.
///
/// # Arguments
///
/// * `http` - Shared HTTP client
/// * `url` - Article page URL
///
/// # Returns
///
/// The extracted title and body text, both trimmed. Either may be empty when
/// the page has no readable content; callers decide what to fall back to.
#[instrument(level = "info", skip_all, fields(url = %url))]
pub async fn fetch_and_extract(http: &Client, url: &str) -> Result<ExtractedArticle> {
    let response = http
        .get(url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .header(reqwest::header::ACCEPT, "text/html")
        .send()
        .await
        .context("fetching article page")?;
    let html = response.text().await.context("reading article page body")?;

    let base = Url::parse(url).context("parsing article URL")?;
    let product = extractor::extract(&mut Cursor::new(html), &base)
        .context("extracting readable content")?;

    let title = product.title.trim().to_string();
    let text = product.text.trim().to_string();
    debug!(
        title_chars = char_len(&title),
        text_chars = char_len(&text),
        "extracted article"
    );

    Ok(ExtractedArticle { title, text })
}

/// Chooses the body text handed to the summarizer.
///
/// The extracted text is clipped to 12 000 characters. When the clipped text
/// is under 200 characters the aggregator's `"{title}\n{description}"` stands
/// in. Returns `None` when even the fallback is under 80 characters, in which
/// case the article is skipped.
pub fn resolve_body(
    extracted_text: &str,
    fallback_title: &str,
    fallback_description: &str,
) -> Option<String> {
    let clipped = truncate_chars(extracted_text, MAX_BODY_CHARS);
    let body = if char_len(&clipped) >= MIN_EXTRACTED_CHARS {
        clipped
    } else {
        format!("{fallback_title}\n{fallback_description}")
            .trim()
            .to_string()
    };

    if char_len(&body) < MIN_BODY_CHARS {
        return None;
    }
    Some(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_body_uses_extracted_text_when_long_enough() {
        let text = "あ".repeat(300);
        let body = resolve_body(&text, "title", "description").unwrap();
        assert_eq!(body, text);
    }

    #[test]
    fn test_resolve_body_clips_to_max_chars() {
        let text = "x".repeat(13_000);
        let body = resolve_body(&text, "", "").unwrap();
        assert_eq!(body.chars().count(), 12_000);
    }

    #[test]
    fn test_resolve_body_falls_back_when_extraction_thin() {
        let description = "に".repeat(100);
        let body = resolve_body("too short", "見出し", &description).unwrap();
        assert_eq!(body, format!("見出し\n{description}"));
    }

    #[test]
    fn test_resolve_body_rejects_short_fallback() {
        assert!(resolve_body("", "title", "desc").is_none());
    }

    #[test]
    fn test_resolve_body_boundary_at_min_extracted() {
        // Exactly 200 extracted chars counts as a usable body.
        let text = "y".repeat(200);
        assert_eq!(resolve_body(&text, "", "").unwrap(), text);
        // 199 falls back, and the fallback here is too short to keep.
        let text = "y".repeat(199);
        assert!(resolve_body(&text, "t", "d").is_none());
    }
}
