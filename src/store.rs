//! Flat-file JSON persistence for the queue, manifest, and digest cache.
//!
//! Everything this tool remembers between runs lives in small JSON files
//! under the data directory:
//!
//! ```text
//! data/
//! ├── genba_queue.json     // pending article themes, FIFO
//! ├── genba_manifest.json  // published article records
//! └── digest.json          // latest daily digest
//! ```
//!
//! Writes go through a temp file followed by a rename, so a concurrent
//! reader never observes a half-written file. Last write wins; there is no
//! locking beyond that.

use crate::models::{ManifestEntry, ThemeEntry};
use crate::utils::{now_jst_iso, now_millis};
use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read and deserialize a JSON file, returning `fallback` if the file is
/// missing or unparsable.
pub fn read_json_or<T: DeserializeOwned>(path: &Path, fallback: T) -> T {
    match fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text).unwrap_or(fallback),
        Err(_) => fallback,
    }
}

/// Read and deserialize a JSON file, erroring if it is missing or invalid.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Serialize `value` as pretty JSON and write it atomically (temp file,
/// then rename). A trailing newline is appended so the files diff cleanly.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut json = serde_json::to_string_pretty(value).context("serializing JSON")?;
    json.push('\n');
    write_text_atomic(path, &json)
}

/// Write text atomically: write to `<path>.tmp` on the same filesystem,
/// then rename over the destination.
pub fn write_text_atomic(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
    }
    let tmp = tmp_path(path);
    fs::write(&tmp, text).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("renaming {} into place", tmp.display()))?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}

/// Load the theme queue. A missing or corrupt file reads as empty.
pub fn load_queue(path: &Path) -> Vec<ThemeEntry> {
    read_json_or(path, Vec::new())
}

/// Pop the first queued theme and persist the remainder.
///
/// Returns `None` without touching the file when the queue is empty.
pub fn pop_front_theme(path: &Path) -> Result<Option<ThemeEntry>> {
    let mut queue = load_queue(path);
    if queue.is_empty() {
        return Ok(None);
    }
    let head = queue.remove(0);
    write_json_atomic(path, &queue)?;
    Ok(Some(head))
}

/// Append a theme to the queue with a fresh id and JST timestamp.
///
/// Returns the stored entry and the new queue size.
pub fn push_theme(path: &Path, theme: &str) -> Result<(ThemeEntry, usize)> {
    let mut queue = load_queue(path);
    let entry = ThemeEntry {
        id: format!("t_{}", now_millis()),
        theme: theme.to_string(),
        createdAtJST: now_jst_iso(),
    };
    queue.push(entry.clone());
    write_json_atomic(path, &queue)?;
    let size = queue.len();
    Ok((entry, size))
}

/// Remove a queued theme by id.
///
/// Returns the new queue size when an entry was removed, `None` when no
/// entry had that id.
pub fn remove_theme(path: &Path, id: &str) -> Result<Option<usize>> {
    let queue = load_queue(path);
    let before = queue.len();
    let next: Vec<ThemeEntry> = queue.into_iter().filter(|t| t.id != id).collect();
    if next.len() == before {
        return Ok(None);
    }
    let size = next.len();
    write_json_atomic(path, &next)?;
    Ok(Some(size))
}

/// Empty the theme queue.
pub fn clear_themes(path: &Path) -> Result<()> {
    write_json_atomic(path, &Vec::<ThemeEntry>::new())
}

/// Load the published-article manifest. A missing or corrupt file reads as empty.
pub fn load_manifest(path: &Path) -> Vec<ManifestEntry> {
    read_json_or(path, Vec::new())
}

/// Persist the manifest.
pub fn save_manifest(path: &Path, entries: &[ManifestEntry]) -> Result<()> {
    write_json_atomic(path, &entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_json_or_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let v: Vec<String> = read_json_or(&path, vec!["fallback".to_string()]);
        assert_eq!(v, vec!["fallback"]);
    }

    #[test]
    fn test_read_json_or_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        let v: Vec<String> = read_json_or(&path, Vec::new());
        assert!(v.is_empty());
    }

    #[test]
    fn test_write_json_atomic_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json_atomic(&path, &vec![1, 2, 3]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.ends_with('\n'));
        let v: Vec<i32> = read_json(&path).unwrap();
        assert_eq!(v, vec![1, 2, 3]);
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a/b/out.json");
        write_json_atomic(&path, &42).unwrap();
        let v: i32 = read_json(&path).unwrap();
        assert_eq!(v, 42);
    }

    #[test]
    fn test_queue_push_pop_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("genba_queue.json");
        push_theme(&path, "Excelのピボットテーブル入門").unwrap();
        push_theme(&path, "systemctlの基本").unwrap();

        let first = pop_front_theme(&path).unwrap().unwrap();
        assert_eq!(first.theme, "Excelのピボットテーブル入門");
        assert!(first.id.starts_with("t_"));
        assert!(first.createdAtJST.ends_with("+09:00"));

        let second = pop_front_theme(&path).unwrap().unwrap();
        assert_eq!(second.theme, "systemctlの基本");
        assert!(pop_front_theme(&path).unwrap().is_none());
    }

    #[test]
    fn test_queue_remove_and_clear() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("genba_queue.json");
        let (entry, _) = push_theme(&path, "one").unwrap();
        push_theme(&path, "two").unwrap();

        assert_eq!(remove_theme(&path, &entry.id).unwrap(), Some(1));
        assert_eq!(remove_theme(&path, "t_missing").unwrap(), None);

        clear_themes(&path).unwrap();
        assert!(load_queue(&path).is_empty());
    }
}
