//! Local topic classification for digest items.
//!
//! Models drift when asked to pick categories, so tags are never taken from
//! LLM output. Instead the relevant text (original title, Japanese title,
//! summary, key points) is matched against fixed regexes here and the result
//! overwrites whatever the model returned.

use crate::models::Tag;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_DC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(data\s*center|datacenter|colocation|server\s*room|server\s*rack|cooling|hvac|ups|generator|power\s*(grid)?|liquid\s*cooling|chiller|pue|capacity|megawatt|mw|hyperscale)").unwrap()
});

static RE_INFRA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(linux|systemd|kubernetes|docker|devops|network|routing|bgp|dns|firewall|load\s*balancer|observability|monitoring|latency|reliability|outage)").unwrap()
});

static RE_SEC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(cve|vulnerability|zero-?day|exploit|breach|ransomware|malware|phishing|incident\s*response|patch|mitigation)").unwrap()
});

static RE_AI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\bai\b|llm|large\s+language\s+model|machine\s+learning|inference|gpu|accelerator)").unwrap()
});

/// Classify text into at most two tags.
///
/// Matching runs in fixed priority order Dc, Infra, Security, Ai and keeps
/// the first two hits. Text matching none of the patterns gets the Other
/// tag so an item is never untagged.
pub fn classify(text: &str) -> Vec<Tag> {
    let mut hits = Vec::new();
    if RE_DC.is_match(text) {
        hits.push(Tag::Dc);
    }
    if RE_INFRA.is_match(text) {
        hits.push(Tag::Infra);
    }
    if RE_SEC.is_match(text) {
        hits.push(Tag::Security);
    }
    if RE_AI.is_match(text) {
        hits.push(Tag::Ai);
    }

    if hits.is_empty() {
        return vec![Tag::Other];
    }
    hits.truncate(2);
    hits
}
