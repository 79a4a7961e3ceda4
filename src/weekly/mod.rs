//! Weekly article pipeline: pop a theme, draft, proofread into HTML,
//! publish, update the manifest and the home page list.
//!
//! Generation is two-staged on purpose: the draft model writes the content
//! as plain prose, the final model fixes the Japanese, shapes the HTML
//! fragments and reports a duplication verdict that gates publication. A
//! flagged duplicate stops the run with the theme already consumed, so one
//! bad theme cannot wedge the queue.

pub mod render;
pub mod similar;

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

use crate::api::{self, AskRequest};
use crate::config::Config;
use crate::models::{DraftArticle, FinalArticle, ManifestEntry};
use crate::outputs::indexes;
use crate::prompts;
use crate::store;
use crate::utils::{ensure_writable_dir, jst_today, now_jst_iso, safe_text, truncate_chars};

/// Characters of the first draft section kept as the manifest summary.
const SUMMARY_CLIP: usize = 360;

/// Most recent auto articles listed on the home page.
const HOME_LIST_CAP: usize = 200;

/// Runs the weekly article pipeline, consuming one queued theme.
///
/// # Arguments
///
/// * `config` - Effective configuration; the draft/final model pair and the
///   OpenAI key are required
///
/// # Behavior
///
/// An empty queue is a clean no-op. A failed duplication check logs the
/// model's reason and publishes nothing. Everything else is an error.
#[instrument(level = "info", skip_all)]
pub async fn run(config: &Config) -> Result<()> {
    let (draft_model, final_model) = config.weekly_models()?;
    let openai_key = config.require_openai_key()?;
    ensure_writable_dir(&config.paths.data_dir).await?;
    ensure_writable_dir(&config.paths.posts_dir).await?;

    let manifest = sync_manifest(config)?;

    let Some(item) = store::pop_front_theme(&config.queue_path())? else {
        info!("theme queue empty; nothing to generate");
        return Ok(());
    };
    let theme = safe_text(&item.theme);
    info!(theme = %theme, queued_at = %item.createdAtJST, "theme popped from queue");

    let similar = similar::pick(&manifest, &theme, similar::SIMILAR_COUNT);
    info!(count = similar.len(), "similar articles picked for comparison");

    let llm = api::make_client(openai_key, config.openai.api_base.as_deref());

    let draft_request = AskRequest::structured::<DraftArticle>(draft_model, "genba_weekly_draft");
    let draft: DraftArticle = api::ask_structured(
        &llm,
        &draft_request,
        &prompts::weekly_draft(&theme, &similar),
    )
    .await?;
    info!(title = %draft.title, sections = draft.sections.len(), "draft generated");

    let draft_json = serde_json::to_string(&draft)?;
    let final_request = AskRequest::structured::<FinalArticle>(final_model, "genba_weekly_final");
    let article: FinalArticle = api::ask_structured(
        &llm,
        &final_request,
        &prompts::weekly_final(&draft_json, &similar, &jst_today()),
    )
    .await?;
    info!(title = %article.title, slug = %article.slug, "final article generated");

    if !article.qualityChecks.noDuplication {
        warn!(
            reason = article.qualityChecks.dupReason.as_deref().unwrap_or(""),
            "duplication flagged; article not published"
        );
        return Ok(());
    }

    let out_path = config
        .paths
        .posts_dir
        .join(format!("{}.html", article.slug));
    let html = render::page(&article);
    fs::write(&out_path, html)
        .await
        .with_context(|| format!("writing {}", out_path.display()))?;
    info!(path = %out_path.display(), "article page written");

    let mut manifest = manifest;
    manifest.push(ManifestEntry {
        source: "auto".to_string(),
        title: article.title.clone(),
        publishedAt: article.publishedDate.clone(),
        url: relative_url(&config.paths.web_root, &out_path),
        filePath: out_path.display().to_string(),
        toc: article.toc.iter().map(|t| t.label.clone()).collect(),
        summary: truncate_chars(
            &safe_text(draft.sections.first().map(|s| s.body.as_str()).unwrap_or("")),
            SUMMARY_CLIP,
        ),
        updatedAtJST: now_jst_iso(),
    });
    store::save_manifest(&config.manifest_path(), &manifest)?;

    let mut autos: Vec<ManifestEntry> = manifest
        .iter()
        .filter(|e| e.source == "auto")
        .cloned()
        .collect();
    autos.sort_by(|a, b| b.publishedAt.cmp(&a.publishedAt));
    autos.truncate(HOME_LIST_CAP);
    indexes::update_home_index(&config.paths.index_html, &autos).await?;

    Ok(())
}

/// Reconcile the manifest with the posts directory.
///
/// Article files on disk but not in the manifest get entries: title from the
/// page, date from the filename when it carries one. Files following the
/// generator's dated naming are recorded as `auto` (manifest-loss recovery),
/// anything else as `manual`. Entries whose file disappeared are dropped.
/// Runs before every generation so the duplication comparison sees what is
/// actually published.
#[instrument(level = "info", skip_all)]
fn sync_manifest(config: &Config) -> Result<Vec<ManifestEntry>> {
    let manifest_path = config.manifest_path();
    let mut manifest = store::load_manifest(&manifest_path);
    let before = manifest.len();

    manifest.retain(|entry| Path::new(&entry.filePath).exists());
    let dropped = before - manifest.len();

    let known: HashSet<String> = manifest.iter().map(|e| e.filePath.clone()).collect();
    let mut added = 0usize;

    if let Ok(entries) = std::fs::read_dir(&config.paths.posts_dir) {
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with(".html") || name == "index.html" {
                continue;
            }
            let path = entry.path();
            let file_path = path.display().to_string();
            if known.contains(&file_path) {
                continue;
            }
            let html = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let date = indexes::date_from_filename(&name);
            let source = if date.is_empty() { "manual" } else { "auto" };
            manifest.push(ManifestEntry {
                source: source.to_string(),
                title: indexes::extract_title(&html),
                publishedAt: date,
                url: relative_url(&config.paths.web_root, &path),
                filePath: file_path,
                toc: Vec::new(),
                summary: String::new(),
                updatedAtJST: now_jst_iso(),
            });
            added += 1;
        }
    }

    if added > 0 || dropped > 0 {
        store::save_manifest(&manifest_path, &manifest)?;
    }
    info!(
        added,
        dropped,
        total = manifest.len(),
        "manifest synced with posts directory"
    );
    Ok(manifest)
}

/// URL for a published file: its path relative to the web root with a
/// leading slash, or the absolute path when it lives outside the root.
fn relative_url(web_root: &Path, path: &Path) -> String {
    match path.strip_prefix(web_root) {
        Ok(rel) => format!("/{}", rel.display()),
        Err(_) => path.display().to_string(),
    }
}
