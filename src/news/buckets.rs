//! Curated topic buckets for aggregator searches.
//!
//! Each bucket pairs a boolean search query with the filter rule applied to
//! the results. Buckets are tried in a fixed priority order that leans
//! toward field operations: data centers first, then general infrastructure,
//! then security, then AI.

/// Which must-match rule applies to a bucket's results.
///
/// AI queries surface too much consumer noise to accept on topic words
/// alone, so their articles must also mention an operations context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    /// Article text must hit one of the core infrastructure terms.
    Core,
    /// Article text must pair an AI term with an operations term.
    AiContext,
}

/// One search bucket: a short label for logs, the query sent to the
/// aggregator, and the rule used to keep or drop its results.
#[derive(Debug)]
pub struct Bucket {
    pub label: &'static str,
    pub query: &'static str,
    pub rule: MatchRule,
}

/// The buckets in priority order.
pub static BUCKETS: [Bucket; 4] = [
    Bucket {
        label: "DC",
        query: r#"("data center" OR datacenter OR colocation OR "server room" OR "server rack") AND (power OR cooling OR HVAC OR UPS OR generator OR expansion OR capacity OR MW OR hyperscale OR colo OR outage OR downtime OR incident)"#,
        rule: MatchRule::Core,
    },
    Bucket {
        label: "インフラ",
        query: r#"(infrastructure OR network OR routing OR firewall OR "load balancer" OR BGP OR DNS OR Linux OR systemd OR Kubernetes OR Docker OR DevOps) AND (outage OR incident OR disruption OR reliability OR latency OR performance)"#,
        rule: MatchRule::Core,
    },
    Bucket {
        label: "セキュリティ",
        query: r#"(cybersecurity OR ransomware OR breach OR CVE OR "zero-day" OR "incident response" OR phishing OR malware) AND (attack OR exploit OR vulnerability OR patch OR mitigation)"#,
        rule: MatchRule::Core,
    },
    Bucket {
        label: "AI",
        query: r#"(AI OR "artificial intelligence" OR LLM OR "large language model" OR "machine learning") AND (security OR ops OR infrastructure OR datacenter OR reliability OR monitoring OR incident OR vulnerability)"#,
        rule: MatchRule::AiContext,
    },
];

/// Negative terms appended to every query. Deliberately mild; the hard
/// filtering happens in the regex pass on results.
pub const NOISE_TERMS: &str = "-sports -football -soccer -premier -match -vs -lineups -travel -holiday -christmas -celebrity -fashion -movie -music";

/// Aggregation and press-release domains excluded at the API level.
pub const EXCLUDE_DOMAINS: &[&str] = &[
    "biztoc.com",
    "globenewswire.com",
    "prnewswire.com",
    "businesswire.com",
    "bringatrailer.com",
    "pypi.org",
    "picxstudio.com",
    "101greatgoals.com",
    "independent.co.uk",
];
