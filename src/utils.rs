//! Utility functions for JST timestamps, string cleanup, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - JST (UTC+9) date and timestamp formatting for all published artifacts
//! - Whitespace normalization and character-based truncation for Japanese text
//! - Slug generation for article file names
//! - JSON error detection for handling LLM response truncation
//! - File system validation for output directories

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());

/// The fixed JST offset (UTC+9). Everything this tool publishes is stamped in JST.
pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).unwrap()
}

/// Current time in JST.
pub fn now_jst() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&jst())
}

/// Current JST timestamp as an ISO-8601 string with millisecond precision,
/// e.g. `2025-08-25T09:30:00.123+09:00`.
pub fn now_jst_iso() -> String {
    now_jst().format("%Y-%m-%dT%H:%M:%S%.3f+09:00").to_string()
}

/// Today's date in JST as `YYYY-MM-DD`.
pub fn jst_today() -> String {
    now_jst().format("%Y-%m-%d").to_string()
}

/// Milliseconds since the Unix epoch. Used for queue entry ids and slug fallbacks.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Collapse all whitespace runs to single spaces and trim.
///
/// This is the normalization applied to every piece of free text before it is
/// persisted or compared: queue themes, summaries, and model output lines.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(safe_text("  foo \n bar  "), "foo bar");
/// ```
pub fn safe_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clip a string to at most `max` characters.
///
/// Character-based rather than byte-based so Japanese text is never split
/// mid-codepoint.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Number of characters in a string. All length rules in this tool are
/// character counts, not byte counts.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and a
/// count of the characters dropped.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let total = char_len(s);
    if total <= max {
        s.to_string()
    } else {
        format!("{}…(+{} chars)", truncate_chars(s, max), total - max)
    }
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// When the LLM response is cut off (e.g., due to token limits), the
/// resulting JSON will fail to parse with an EOF error. This function
/// helps identify such cases for retry logic.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Convert a theme or title to a file-name-friendly slug.
///
/// Unicode-aware: runs of anything that is not a letter or digit become a
/// single hyphen, the result is lowercased, trimmed of hyphens, and capped
/// at 80 characters. Japanese characters pass through unchanged. An empty
/// result falls back to `genba-<millis>` so a file name always exists.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify("PowerShell 入門!"), "powershell-入門");
/// ```
pub fn slugify(s: &str) -> String {
    let lowered = s.trim().to_lowercase();
    let dashed = NON_SLUG.replace_all(&lowered, "-");
    let base: String = dashed.trim_matches('-').chars().take(80).collect();
    if base.is_empty() {
        format!("genba-{}", now_millis())
    } else {
        base
    }
}

/// Escape a string for inclusion in HTML text or attribute context.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable
/// (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .with_context(|| format!("creating directory {}", path.display()))?;
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)
        .with_context(|| format!("directory {} is not writable", path.display()))?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_jst_iso_shape() {
        let iso = now_jst_iso();
        assert!(iso.ends_with("+09:00"));
        assert_eq!(iso.len(), "2025-08-25T09:30:00.123+09:00".len());
    }

    #[test]
    fn test_jst_today_shape() {
        let d = jst_today();
        assert_eq!(d.len(), 10);
        assert_eq!(&d[4..5], "-");
        assert_eq!(&d[7..8], "-");
    }

    #[test]
    fn test_safe_text() {
        assert_eq!(safe_text("  foo \n\t bar  "), "foo bar");
        assert_eq!(safe_text(""), "");
        assert_eq!(safe_text("   "), "");
        assert_eq!(safe_text("現場の ノウハウ"), "現場の ノウハウ");
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("データセンター", 4), "データセ");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(char_len("データセンター"), 7);
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "あ".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"あ".repeat(100)));
        assert!(result.contains("…(+400 chars)"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("PowerShell 入門!"), "powershell-入門");
        assert_eq!(slugify("  --Windows/Excel--  "), "windows-excel");
        assert!(slugify("!!!").starts_with("genba-"));
    }

    #[test]
    fn test_slugify_caps_length() {
        let long = "a".repeat(120);
        assert_eq!(slugify(&long).chars().count(), 80);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">it's & more</a>"#),
            "&lt;a href=&quot;x&quot;&gt;it&#39;s &amp; more&lt;/a&gt;"
        );
        assert_eq!(escape_html("日本語"), "日本語");
    }

    #[test]
    fn test_looks_truncated() {
        let json_eof = r#"{"field": "value"#;
        let result: Result<serde_json::Value, _> = serde_json::from_str(json_eof);
        if let Err(e) = result {
            assert!(looks_truncated(&e));
        }
    }
}
