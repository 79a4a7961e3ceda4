//! Lightweight similar-article lookup for the weekly generator.
//!
//! Before writing a new article the generator shows the models what already
//! exists on nearby topics, so they can change the angle instead of
//! repeating it. "Nearby" is judged by keyword overlap only: cheap, no
//! embeddings, good enough for a manifest of a few hundred entries.

use crate::models::ManifestEntry;
use crate::utils::safe_text;

/// How many prior articles are quoted into the prompts.
pub const SIMILAR_COUNT: usize = 3;

/// Pick up to `k` manifest entries whose text overlaps the theme.
///
/// The theme is lowercased and split on whitespace; each entry scores one
/// point per theme word contained (as a substring) in its lowercased
/// `title + summary + toc` haystack. Entries are ranked by score, ties keep
/// manifest order, and zero-score entries never make the cut.
pub fn pick(manifest: &[ManifestEntry], theme: &str, k: usize) -> Vec<ManifestEntry> {
    let needle = safe_text(theme).to_lowercase();

    let mut scored: Vec<(usize, &ManifestEntry)> = manifest
        .iter()
        .map(|entry| {
            let hay = safe_text(&format!(
                "{} {} {}",
                entry.title,
                entry.summary,
                entry.toc.join(" ")
            ))
            .to_lowercase();
            let score = needle
                .split_whitespace()
                .filter(|word| hay.contains(word))
                .count();
            (score, entry)
        })
        .collect();

    // sort_by is stable, so equal scores keep manifest order.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .filter(|(score, _)| *score > 0)
        .take(k)
        .map(|(_, entry)| entry.clone())
        .collect()
}
