//! HTTP client for the aggregator's everything-search endpoint.

use super::buckets::{self, Bucket};
use crate::models::{NewsApiResponse, NewsArticle};
use anyhow::{Context, Result, bail};
use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;

/// Fetch one bucket's worth of articles.
///
/// Sends the bucket query plus the shared noise terms, sorted by publication
/// time, searching titles and descriptions only, with the domain kill list
/// applied server-side. `language` restricts results when given.
///
/// # Errors
///
/// A non-200 response or an error envelope becomes an error whose message is
/// the HTTP status code, which is what the per-bucket stats record.
#[instrument(level = "info", skip_all, fields(label = %bucket.label, language = language.unwrap_or("any")))]
pub async fn fetch_bucket(
    http: &Client,
    base_url: &str,
    api_key: &str,
    bucket: &Bucket,
    language: Option<&str>,
) -> Result<Vec<NewsArticle>> {
    let mut url = Url::parse(&format!(
        "{}/v2/everything",
        base_url.trim_end_matches('/')
    ))
    .context("building aggregator URL")?;

    {
        let mut pairs = url.query_pairs_mut();
        pairs
            .append_pair("q", &format!("{} {}", bucket.query, buckets::NOISE_TERMS))
            .append_pair("sortBy", "publishedAt")
            .append_pair("pageSize", "20")
            .append_pair("searchIn", "title,description");
        if let Some(lang) = language {
            pairs.append_pair("language", lang);
        }
        pairs.append_pair("excludeDomains", &buckets::EXCLUDE_DOMAINS.join(","));
    }

    let response = http
        .get(url)
        .header("X-Api-Key", api_key)
        .send()
        .await
        .context("aggregator request failed")?;
    let status = response.status();
    let envelope: NewsApiResponse = response
        .json()
        .await
        .with_context(|| format!("aggregator returned non-JSON body (HTTP {})", status.as_u16()))?;

    if status != reqwest::StatusCode::OK || envelope.status != "ok" {
        warn!(
            status = status.as_u16(),
            api_status = %envelope.status,
            message = envelope.message.as_deref().unwrap_or(""),
            "aggregator rejected bucket query"
        );
        bail!("{}", status.as_u16());
    }

    debug!(count = envelope.articles.len(), "fetched bucket articles");
    Ok(envelope.articles)
}
