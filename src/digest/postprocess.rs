//! Cleanup pass over model-produced digest summaries.
//!
//! Models occasionally echo shell commands, scraped error pages or
//! near-duplicate bullet points into the summary fields. This pass scrubs
//! each item and re-derives the tags locally so the published digest never
//! depends on the model's own classification.

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{DigestSummary, GlossaryEntry, Tag};
use crate::tags;
use crate::utils::{char_len, safe_text, truncate_chars};

static COMMANDISH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(^|\s)(sudo|curl|ps\s+-p|systemctl|journalctl|ss\s+-ltnp|rm\s+|nano|vim)(\s|$)")
        .unwrap()
});
static CANNOT_GET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Cannot\s+GET").unwrap());

/// Minimum characters for a bullet line to survive cleanup.
const MIN_LINE_CHARS: usize = 6;
const MAX_KEY_POINTS: usize = 6;
const MAX_ACTIONS: usize = 3;
const MAX_TERM_CHARS: usize = 40;
const MAX_EXPLAIN_CHARS: usize = 180;

/// Collapses whitespace, straightens curly double quotes, trims.
pub fn clean_line(s: &str) -> String {
    safe_text(s).replace(['“', '”'], "\"")
}

/// True for lines that look like shell commands or scraped error pages.
pub fn looks_like_command(s: &str) -> bool {
    COMMANDISH.is_match(s) || CANNOT_GET.is_match(s)
}

fn uniq_case_insensitive(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .unique_by(|s| s.to_lowercase())
        .collect()
}

/// Fixed per-tag actions used when cleanup leaves `personal_actions` empty.
/// Deliberately hedged wording; these are generic prompts to go check, not
/// advice derived from the article.
fn fallback_actions(tags: &[Tag]) -> Vec<String> {
    if tags.contains(&Tag::Security) {
        vec![
            "関連しそうな製品/サービスの有無を棚卸しし、ベンダーアドバイザリ（更新有無）を確認する。".to_string(),
            "脆弱性/侵害に備え、ログ保全・検知ルール（EDR/SIEM/IDS）の状態を点検する。".to_string(),
        ]
    } else if tags.contains(&Tag::Dc) {
        vec![
            "電源・冷却・キャパシティの前提（N+1/冗長、余裕率）をメモして、関係しそうな指標（温度/PUE/負荷）を確認する。".to_string(),
            "冷却方式（空冷/液冷）や電力契約の動向が自社に影響しそうか、社内の担当領域と照らして整理する。".to_string(),
        ]
    } else {
        vec![
            "自分の担当範囲で影響しうる箇所（監視・ネットワーク・OS）を洗い出し、関連ダッシュボードを軽く確認する。".to_string(),
        ]
    }
}

/// Cleans one summary in place and overwrites its tags with the local
/// classification over `title + title_ja + summary_ja + key_points`.
///
/// # Arguments
///
/// * `title` - The article title the digest item carries (extracted or
///   aggregator-provided), included in the classification text
/// * `summary` - The model output to scrub
pub fn apply(title: &str, summary: &mut DigestSummary) {
    summary.title_ja = clean_line(&summary.title_ja);
    summary.summary_ja = clean_line(&summary.summary_ja);

    summary.key_points = uniq_case_insensitive(
        summary
            .key_points
            .iter()
            .map(|s| clean_line(s))
            .filter(|s| char_len(s) >= MIN_LINE_CHARS)
            .take(MAX_KEY_POINTS)
            .collect(),
    );

    summary.glossary = summary
        .glossary
        .iter()
        .map(|g| GlossaryEntry {
            term: truncate_chars(&clean_line(&g.term), MAX_TERM_CHARS),
            explain_ja: truncate_chars(&clean_line(&g.explain_ja), MAX_EXPLAIN_CHARS),
        })
        .filter(|g| !g.term.is_empty() && !g.explain_ja.is_empty())
        .collect();

    summary.personal_actions = uniq_case_insensitive(
        summary
            .personal_actions
            .iter()
            .map(|s| clean_line(s))
            .filter(|s| char_len(s) >= MIN_LINE_CHARS)
            .filter(|s| !looks_like_command(s))
            .take(MAX_ACTIONS)
            .collect(),
    );

    let tag_text = format!(
        "{} {} {} {}",
        title,
        summary.title_ja,
        summary.summary_ja,
        summary.key_points.join(" ")
    );
    summary.tags = tags::classify(&tag_text);

    if summary.personal_actions.is_empty() {
        summary.personal_actions = fallback_actions(&summary.tags);
    }
}
