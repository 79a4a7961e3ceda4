//! Data models for aggregator articles, daily digests, and generated articles.
//!
//! This module defines the core data structures used throughout the application:
//! - [`NewsArticle`] / [`NewsApiResponse`]: aggregator wire types
//! - [`Digest`] / [`DigestItem`] / [`DigestSummary`]: the daily digest and its
//!   LLM-produced portion
//! - [`DraftArticle`] / [`FinalArticle`]: the two stages of weekly article
//!   generation
//! - [`ThemeEntry`] / [`ManifestEntry`]: queue and manifest records
//!
//! Persisted and wire-facing structs use camelCase field names to match the
//! JSON they read and write, hence the `#[allow(non_snake_case)]` attributes.
//! Types the LLM fills in derive [`JsonSchema`] so a response schema can be
//! generated from them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Envelope returned by the aggregator's `/v2/everything` endpoint.
///
/// On failure `status` is `"error"` and `code`/`message` describe the
/// problem; `articles` is then absent.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Deserialize)]
pub struct NewsApiResponse {
    pub status: String,
    #[serde(default)]
    pub totalResults: u64,
    #[serde(default)]
    pub articles: Vec<NewsArticle>,
    pub code: Option<String>,
    pub message: Option<String>,
}

/// One article as reported by the aggregator.
///
/// Every field may be null on the wire, so everything is optional. The
/// struct round-trips unchanged so the live news endpoint can serve the
/// aggregator's articles as-is.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewsArticle {
    pub source: Option<ArticleSource>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub urlToImage: Option<String>,
    pub publishedAt: Option<String>,
    pub content: Option<String>,
}

/// The `source` object attached to an aggregator article.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArticleSource {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl NewsArticle {
    /// The source name, or an empty string when the aggregator omitted it.
    pub fn source_name(&self) -> String {
        self.source
            .as_ref()
            .and_then(|s| s.name.clone())
            .unwrap_or_default()
    }

    /// Title and description joined for filtering and classification.
    pub fn title_and_description(&self) -> String {
        format!(
            "{} {}",
            self.title.as_deref().unwrap_or(""),
            self.description.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }
}

/// Topic categories for digest items.
///
/// Assignment is always done locally by regex (see the tags module), in
/// priority order Dc, Infra, Security, Ai, with Other as the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum Tag {
    #[serde(rename = "DC")]
    Dc,
    #[serde(rename = "インフラ")]
    Infra,
    #[serde(rename = "セキュリティ")]
    Security,
    #[serde(rename = "AI")]
    Ai,
    #[serde(rename = "その他")]
    Other,
}

/// A glossary entry inside a digest item: the original term and a short
/// Japanese explanation.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct GlossaryEntry {
    pub term: String,
    pub explain_ja: String,
}

/// The LLM-produced portion of a digest item.
///
/// This is the exact shape the summarizer model is asked to return: a
/// Japanese title, a 3-5 sentence summary, key points, a small glossary,
/// and actions an individual can take today. Tags are requested but later
/// overwritten by the local classifier.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct DigestSummary {
    pub title_ja: String,
    pub summary_ja: String,
    pub key_points: Vec<String>,
    pub glossary: Vec<GlossaryEntry>,
    pub personal_actions: Vec<String>,
    pub tags: Vec<Tag>,
}

/// One fully assembled digest item: article provenance plus the cleaned
/// summary fields, flattened so the persisted JSON stays a single object.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DigestItem {
    pub url: String,
    pub source: String,
    pub publishedAt: String,
    pub title: String,
    #[serde(flatten)]
    pub summary: DigestSummary,
}

/// The daily digest file: date stamp, generation time, and up to three items.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Digest {
    pub date: String,
    pub generatedAtJST: String,
    pub items: Vec<DigestItem>,
}

/// A queued article theme waiting for the weekly generator.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThemeEntry {
    pub id: String,
    pub theme: String,
    pub createdAtJST: String,
}

/// A published article as recorded in the manifest.
///
/// `source` is `"auto"` for generated articles. `toc` holds the section
/// labels only; `summary` is a clipped plain-text excerpt used for the
/// similar-article comparison.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ManifestEntry {
    pub source: String,
    pub title: String,
    pub publishedAt: String,
    pub url: String,
    pub filePath: String,
    #[serde(default)]
    pub toc: Vec<String>,
    #[serde(default)]
    pub summary: String,
    pub updatedAtJST: String,
}

/// A table-of-contents entry shared by both generation stages.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct TocEntry {
    pub id: String,
    pub label: String,
}

/// A code block inside an article section.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct CodeBlock {
    pub lang: String,
    pub code: String,
    pub caption: Option<String>,
}

/// A section of the first-stage draft. `body` is plain prose, Markdown-ish,
/// never HTML.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct DraftSection {
    pub id: String,
    pub heading: String,
    pub body: String,
    #[serde(default)]
    pub codeBlocks: Vec<CodeBlock>,
    #[serde(default)]
    pub cautions: Vec<String>,
}

/// The first-stage draft produced by the cheaper model.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct DraftArticle {
    pub title: String,
    pub shortTitle: String,
    pub keywords: Vec<String>,
    pub toc: Vec<TocEntry>,
    pub sections: Vec<DraftSection>,
    pub closing: String,
}

/// A section of the final article. `bodyHtml` is a trusted HTML fragment
/// that is rendered without escaping.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct FinalSection {
    pub id: String,
    pub heading: String,
    pub bodyHtml: String,
    #[serde(default)]
    pub codeBlocks: Vec<CodeBlock>,
    #[serde(default)]
    pub cautions: Vec<String>,
}

/// Self-reported checks from the final proofreading stage. `noDuplication`
/// is the gate: a false value stops the run before anything is published.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct QualityChecks {
    pub noDuplication: bool,
    pub dupReason: Option<String>,
    #[serde(default)]
    pub fixedPoints: Vec<String>,
}

/// The second-stage article: proofread, HTML-shaped, ready to render.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct FinalArticle {
    pub title: String,
    pub publishedDate: String,
    pub slug: String,
    pub keywords: Vec<String>,
    pub toc: Vec<TocEntry>,
    pub sections: Vec<FinalSection>,
    pub closingHtml: String,
    pub qualityChecks: QualityChecks,
}

/// Per-bucket fetch statistics surfaced by the live news endpoint's debug
/// view. `err` is only present when the bucket fetch itself failed.
#[derive(Debug, Clone, Serialize)]
pub struct BucketStats {
    pub q: String,
    pub fetched: usize,
    pub kept: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}
