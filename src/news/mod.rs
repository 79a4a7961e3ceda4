//! Article selection from the news aggregator.
//!
//! Selection runs the curated buckets in priority order, filtering and
//! deduplicating as it goes, and stops as soon as the requested number of
//! articles is reached so later buckets cost no API calls.
//!
//! Two passes: the first restricted to English, and if that keeps nothing,
//! a second with no language restriction so Japanese and other coverage can
//! fill in. Per-bucket statistics from both passes are kept for the debug
//! view; a failing bucket is recorded there and never aborts the pass.

pub mod buckets;
pub mod client;
pub mod filter;

use crate::models::{BucketStats, NewsArticle};
use filter::PassState;
use reqwest::Client;
use tracing::{info, instrument, warn};

/// The outcome of a full (up to two-pass) selection.
#[derive(Debug)]
pub struct NewsSelection {
    /// The articles served, from whichever pass produced them.
    pub articles: Vec<NewsArticle>,
    /// Queries of the buckets that contributed at least one article.
    pub used_buckets: Vec<String>,
    /// Per-bucket stats for the English pass.
    pub pass1: Vec<BucketStats>,
    /// Per-bucket stats for the any-language pass, when it ran.
    pub pass2: Option<Vec<BucketStats>>,
}

/// Select up to `limit` articles.
#[instrument(level = "info", skip_all, fields(limit))]
pub async fn select_articles(
    http: &Client,
    base_url: &str,
    api_key: &str,
    limit: usize,
) -> NewsSelection {
    let pass1 = run_pass(http, base_url, api_key, limit, Some("en")).await;
    if !pass1.picked.is_empty() {
        info!(
            count = pass1.picked.len(),
            buckets = pass1.used_buckets.len(),
            "selected articles on the English pass"
        );
        return NewsSelection {
            articles: pass1.picked,
            used_buckets: pass1.used_buckets,
            pass1: pass1.stats,
            pass2: None,
        };
    }

    let pass2 = run_pass(http, base_url, api_key, limit, None).await;
    info!(
        count = pass2.picked.len(),
        buckets = pass2.used_buckets.len(),
        "English pass kept nothing; selected on the any-language pass"
    );
    NewsSelection {
        articles: pass2.picked,
        used_buckets: pass2.used_buckets,
        pass1: pass1.stats,
        pass2: Some(pass2.stats),
    }
}

async fn run_pass(
    http: &Client,
    base_url: &str,
    api_key: &str,
    limit: usize,
    language: Option<&str>,
) -> PassState {
    let mut state = PassState::new(limit);
    for bucket in &buckets::BUCKETS {
        if state.is_full() {
            break;
        }
        match client::fetch_bucket(http, base_url, api_key, bucket, language).await {
            Ok(articles) => state.consider_bucket(bucket, &articles),
            Err(e) => {
                warn!(label = bucket.label, error = %e, "bucket fetch failed");
                state.record_error(bucket, &e);
            }
        }
    }
    state
}
