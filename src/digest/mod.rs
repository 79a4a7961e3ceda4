//! Daily digest pipeline: select articles, extract bodies, summarize each
//! into Japanese, clean the output, persist `digest.json`.
//!
//! Per-article failures (fetch, extraction, model, parse) are logged and the
//! article is skipped; the digest is written with whatever survived. The
//! whole run is skipped when today's digest already exists, unless forced.

pub mod postprocess;

use anyhow::Result;
use async_openai::config::OpenAIConfig;
use async_openai::Client as OpenAIClient;
use futures::stream::{self, StreamExt};
use reqwest::Client as HttpClient;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::api::{self, AskRequest};
use crate::config::Config;
use crate::extract;
use crate::models::{Digest, DigestItem, DigestSummary, NewsArticle};
use crate::news;
use crate::prompts;
use crate::store;
use crate::utils::{ensure_writable_dir, jst_today, now_jst_iso};

/// Articles summarized per digest.
const DIGEST_ARTICLES: usize = 3;

/// Output token cap for one summary. Oversized responses parse as truncated
/// JSON and get one re-ask.
const SUMMARY_TOKEN_CAP: u32 = 950;

/// Timeout for aggregator and article-page fetches.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs the daily digest pipeline.
///
/// # Arguments
///
/// * `config` - Effective configuration
/// * `force` - Regenerate even when today's digest already exists
#[instrument(level = "info", skip_all, fields(force))]
pub async fn run(config: &Config, force: bool) -> Result<()> {
    if !force {
        if let Some(existing) = load_today(config) {
            info!(
                date = %existing.date,
                items = existing.items.len(),
                "digest already generated for today"
            );
            return Ok(());
        }
    }

    let newsapi_key = config.require_newsapi_key()?;
    let openai_key = config.require_openai_key()?;
    ensure_writable_dir(&config.paths.data_dir).await?;

    let http = HttpClient::builder().timeout(FETCH_TIMEOUT).build()?;
    let llm = api::make_client(openai_key, config.openai.api_base.as_deref());
    let request =
        AskRequest::structured::<DigestSummary>(&config.models.digest, "genba_digest_item")
            .with_system(prompts::DIGEST_SYSTEM)
            .with_max_completion_tokens(SUMMARY_TOKEN_CAP);

    let selection =
        news::select_articles(&http, &config.news.base_url, newsapi_key, DIGEST_ARTICLES).await;
    info!(
        count = selection.articles.len(),
        "articles selected for today's digest"
    );

    // Summaries run concurrently; `buffered` keeps bucket priority order in
    // the output.
    let results: Vec<Option<DigestItem>> = stream::iter(selection.articles.iter())
        .map(|article| {
            let http = &http;
            let llm = &llm;
            let request = &request;
            async move {
                match summarize_article(http, llm, request, article).await {
                    Ok(item) => item,
                    Err(e) => {
                        warn!(
                            url = article.url.as_deref().unwrap_or(""),
                            error = %e,
                            "digest: skip (failed)"
                        );
                        None
                    }
                }
            }
        })
        .buffered(DIGEST_ARTICLES)
        .collect()
        .await;

    let items: Vec<DigestItem> = results.into_iter().flatten().collect();

    let digest = Digest {
        date: jst_today(),
        generatedAtJST: now_jst_iso(),
        items,
    };

    let path = config.digest_path();
    store::write_json_atomic(&path, &digest)?;
    info!(path = %path.display(), items = digest.items.len(), "digest saved");
    Ok(())
}

/// Summarizes one selected article into a digest item.
///
/// # Returns
///
/// `Ok(None)` when the article has no URL or its body is too short to be
/// worth summarizing; errors bubble up for the caller to log and skip.
async fn summarize_article(
    http: &HttpClient,
    llm: &OpenAIClient<OpenAIConfig>,
    request: &AskRequest,
    article: &NewsArticle,
) -> Result<Option<DigestItem>> {
    let Some(url) = article.url.as_deref() else {
        return Ok(None);
    };

    let extracted = extract::fetch_and_extract(http, url).await?;
    let Some(body) = extract::resolve_body(
        &extracted.text,
        article.title.as_deref().unwrap_or(""),
        article.description.as_deref().unwrap_or(""),
    ) else {
        info!(url = %url, "digest: skip (body too short)");
        return Ok(None);
    };

    let title = if extracted.title.is_empty() {
        article.title.clone().unwrap_or_default()
    } else {
        extracted.title
    };

    let mut summary: DigestSummary =
        api::ask_structured(llm, request, &prompts::digest_user(url, &title, &body)).await?;
    postprocess::apply(&title, &mut summary);

    Ok(Some(DigestItem {
        url: url.to_string(),
        source: article.source_name(),
        publishedAt: article.publishedAt.clone().unwrap_or_default(),
        title,
        summary,
    }))
}

/// Today's digest, when one is already on disk with today's JST date.
fn load_today(config: &Config) -> Option<Digest> {
    let digest: Digest = store::read_json(&config.digest_path()).ok()?;
    (digest.date == jst_today()).then_some(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.paths.data_dir = dir.to_path_buf();
        config
    }

    #[test]
    fn test_load_today_finds_fresh_digest() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());

        let digest = Digest {
            date: jst_today(),
            generatedAtJST: now_jst_iso(),
            items: vec![],
        };
        store::write_json_atomic(&config.digest_path(), &digest).unwrap();

        assert!(load_today(&config).is_some());
    }

    #[test]
    fn test_load_today_ignores_stale_digest() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());

        let digest = Digest {
            date: "2000-01-01".to_string(),
            generatedAtJST: "2000-01-01T09:00:00.000+09:00".to_string(),
            items: vec![],
        };
        store::write_json_atomic(&config.digest_path(), &digest).unwrap();

        assert!(load_today(&config).is_none());
    }

    #[test]
    fn test_load_today_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        assert!(load_today(&config).is_none());
    }
}
