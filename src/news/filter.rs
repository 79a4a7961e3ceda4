//! Result filtering and deduplication for aggregator searches.
//!
//! The aggregator's boolean queries are deliberately broad; this module does
//! the precise work. Articles must clear a ban list, hit the must-match rule
//! for their bucket, and not duplicate an already picked article by URL or
//! by normalized title (syndicated copies usually differ only in dashes and
//! punctuation).

use super::buckets::{Bucket, MatchRule};
use crate::models::{BucketStats, NewsArticle};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// Terms an article must mention to be kept from a core bucket.
static MUST_CORE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(data\s*center|datacenter|colocation|server\s*room|server\s*rack|ups|generator|cooling|hvac|power|outage|downtime|capacity|hyperscale|network|routing|firewall|bgp|dns|linux|systemd|kubernetes|docker|devops|ransomware|breach|cve|zero-?day|phishing|incident\s*response|malware)").unwrap()
});

/// AI articles are kept only when an AI term appears with an operations term.
static MUST_AI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(llm|large\s+language\s+model|machine\s+learning|\bai\b).*(security|ops|infrastructure|network|linux|kubernetes|devops|incident|vulnerability|cve|data\s*center|datacenter|reliability|monitoring)").unwrap()
});

/// Kill list applied to every article regardless of bucket.
static BAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(show\s*hn|hacker\s*news|producthunt|nsfw|headshot|image\s*generator|prompt|lineups|premier|football|soccer|match|vs|holiday|christmas)").unwrap()
});

static DASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[—–-]").unwrap());
static WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}\s-]").unwrap());

/// Default number of articles when the caller does not say.
pub const DEFAULT_LIMIT: usize = 3;

/// Clamp a requested article count into 1..=20, defaulting to
/// [`DEFAULT_LIMIT`] when absent or unparsable.
pub fn clamp_limit(requested: Option<i64>) -> usize {
    match requested {
        Some(n) => n.clamp(1, 20) as usize,
        None => DEFAULT_LIMIT,
    }
}

/// Normalize a title so syndicated duplicates collapse to the same key.
///
/// Lowercases, unifies em/en dashes to `-`, collapses whitespace, strips
/// everything that is not a letter, digit, whitespace, or hyphen, and trims.
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let dashed = DASHES.replace_all(&lowered, "-");
    let spaced = WS.replace_all(&dashed, " ");
    NON_WORD.replace_all(&spaced, "").trim().to_string()
}

/// Accumulator for one selection pass over the buckets.
///
/// Keeps the picked articles, the dedupe sets, which bucket queries
/// contributed at least one article, and per-bucket stats for the debug view.
#[derive(Debug)]
pub struct PassState {
    limit: usize,
    pub picked: Vec<NewsArticle>,
    seen_urls: HashSet<String>,
    seen_titles: HashSet<String>,
    pub used_buckets: Vec<String>,
    pub stats: Vec<BucketStats>,
}

impl PassState {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            picked: Vec::new(),
            seen_urls: HashSet::new(),
            seen_titles: HashSet::new(),
            used_buckets: Vec::new(),
            stats: Vec::new(),
        }
    }

    /// Whether the pass already holds `limit` articles.
    pub fn is_full(&self) -> bool {
        self.picked.len() >= self.limit
    }

    /// Record a bucket whose fetch itself failed.
    pub fn record_error(&mut self, bucket: &Bucket, err: &anyhow::Error) {
        self.stats.push(BucketStats {
            q: bucket.query.to_string(),
            fetched: 0,
            kept: 0,
            err: Some(err.to_string()),
        });
    }

    /// Run one bucket's fetched articles through the filters, keeping what
    /// passes until the pass is full.
    pub fn consider_bucket(&mut self, bucket: &Bucket, articles: &[NewsArticle]) {
        let mut kept = 0usize;

        for article in articles {
            if self.is_full() {
                break;
            }
            let Some(url) = article.url.as_deref() else {
                continue;
            };
            if self.seen_urls.contains(url) {
                continue;
            }

            let text = article.title_and_description();
            if text.is_empty() {
                continue;
            }
            if BAN.is_match(&text) {
                debug!(label = bucket.label, %url, "dropped by ban list");
                continue;
            }

            let keeps = match bucket.rule {
                MatchRule::Core => MUST_CORE.is_match(&text),
                MatchRule::AiContext => MUST_AI.is_match(&text),
            };
            if !keeps {
                continue;
            }

            let tnorm = normalize_title(article.title.as_deref().unwrap_or(""));
            if !tnorm.is_empty() && self.seen_titles.contains(&tnorm) {
                debug!(label = bucket.label, %url, "dropped as duplicate title");
                continue;
            }

            self.seen_urls.insert(url.to_string());
            if !tnorm.is_empty() {
                self.seen_titles.insert(tnorm);
            }
            self.picked.push(article.clone());
            kept += 1;
        }

        if kept > 0 {
            self.used_buckets.push(bucket.query.to_string());
        }
        self.stats.push(BucketStats {
            q: bucket.query.to_string(),
            fetched: articles.len(),
            kept,
            err: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::buckets::BUCKETS;

    fn article(title: &str, description: &str, url: &str) -> NewsArticle {
        NewsArticle {
            source: None,
            author: None,
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            url: Some(url.to_string()),
            urlToImage: None,
            publishedAt: None,
            content: None,
        }
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), 3);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-5)), 1);
        assert_eq!(clamp_limit(Some(7)), 7);
        assert_eq!(clamp_limit(Some(100)), 20);
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(
            normalize_title("Big Outage — Data Center Down!"),
            "big outage - data center down"
        );
        assert_eq!(normalize_title("  Spaced\t\nOut  "), "spaced out");
        assert_eq!(normalize_title("日本語のタイトル"), "日本語のタイトル");
        assert_eq!(normalize_title(""), "");
    }

    #[test]
    fn test_normalize_title_collapses_syndicated_copies() {
        let a = normalize_title("AWS outage – what happened?");
        let b = normalize_title("AWS Outage - What Happened");
        assert_eq!(a, b);
    }

    #[test]
    fn test_core_rule_keeps_matching_articles() {
        let mut state = PassState::new(3);
        let dc = &BUCKETS[0];
        state.consider_bucket(
            dc,
            &[
                article("Cooling failure hits datacenter", "outage report", "https://a.example/1"),
                article("New cake recipes", "delicious", "https://a.example/2"),
            ],
        );
        assert_eq!(state.picked.len(), 1);
        assert_eq!(state.stats[0].fetched, 2);
        assert_eq!(state.stats[0].kept, 1);
        assert_eq!(state.used_buckets, vec![dc.query.to_string()]);
    }

    #[test]
    fn test_ban_list_drops_articles() {
        let mut state = PassState::new(3);
        state.consider_bucket(
            &BUCKETS[0],
            &[article(
                "Premier league datacenter power deal",
                "cooling too",
                "https://a.example/1",
            )],
        );
        assert!(state.picked.is_empty());
        assert!(state.used_buckets.is_empty());
    }

    #[test]
    fn test_ai_rule_requires_ops_context() {
        let mut state = PassState::new(3);
        let ai = &BUCKETS[3];
        state.consider_bucket(
            ai,
            &[
                article("AI writes poetry now", "a fun story", "https://a.example/1"),
                article(
                    "AI helps with incident response",
                    "LLM triage for infrastructure teams",
                    "https://a.example/2",
                ),
            ],
        );
        assert_eq!(state.picked.len(), 1);
        assert_eq!(
            state.picked[0].url.as_deref(),
            Some("https://a.example/2")
        );
    }

    #[test]
    fn test_url_and_title_dedupe_across_buckets() {
        let mut state = PassState::new(5);
        state.consider_bucket(
            &BUCKETS[0],
            &[article("Datacenter outage in Tokyo", "power loss", "https://a.example/1")],
        );
        state.consider_bucket(
            &BUCKETS[1],
            &[
                // same URL
                article("Datacenter outage in Tokyo", "power loss", "https://a.example/1"),
                // same title modulo punctuation, different URL
                article("Datacenter Outage in Tokyo!", "network impact", "https://b.example/1"),
                article("BGP leak disrupts routing", "reliability hit", "https://c.example/1"),
            ],
        );
        assert_eq!(state.picked.len(), 2);
        assert_eq!(state.stats[1].kept, 1);
    }

    #[test]
    fn test_pass_stops_at_limit() {
        let mut state = PassState::new(1);
        state.consider_bucket(
            &BUCKETS[0],
            &[
                article("Datacenter cooling upgrade", "hvac", "https://a.example/1"),
                article("UPS generator test outage", "power", "https://a.example/2"),
            ],
        );
        assert_eq!(state.picked.len(), 1);
        assert!(state.is_full());
    }

    #[test]
    fn test_record_error_shows_up_in_stats() {
        let mut state = PassState::new(3);
        state.record_error(&BUCKETS[2], &anyhow::anyhow!("429"));
        assert_eq!(state.stats.len(), 1);
        assert_eq!(state.stats[0].err.as_deref(), Some("429"));
        assert_eq!(state.stats[0].fetched, 0);
    }
}
