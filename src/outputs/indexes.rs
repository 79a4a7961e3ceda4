//! Index pages for published articles.
//!
//! Two pages are maintained here:
//!
//! - **Posts index** (`{posts_dir}/index.html`): rebuilt from whatever
//!   article files are on disk, merged with hand-written pages from the
//!   config. Carries the theme-queue management UI and a client-side sort.
//! - **Home page list**: the section of the site's `index.html` between the
//!   `GENBA_POSTS_START`/`GENBA_POSTS_END` markers, rewritten after each
//!   published article. Only the markers' contents change; the rest of the
//!   page is left untouched.
//!
//! # Ordering
//!
//! Index rows with a date sort newest first and come before undated rows;
//! undated rows fall back to file mtime. Dates are `YYYY-MM-DD`, so plain
//! string comparison is enough.

use crate::config::Config;
use crate::models::ManifestEntry;
use crate::store;
use crate::utils::{ensure_writable_dir, escape_html};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::cmp::Ordering;
use std::path::Path;
use std::time::UNIX_EPOCH;
use tokio::fs;
use tracing::{info, instrument};

/// Markers bounding the auto-generated article list on the home page.
pub const MARKER_START: &str = "<!-- GENBA_POSTS_START -->";
pub const MARKER_END: &str = "<!-- GENBA_POSTS_END -->";

static FILE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:genba_)?(\d{4}-\d{2}-\d{2})").unwrap());

/// One row on the posts index page.
#[derive(Debug, Clone)]
struct IndexItem {
    href: String,
    title: String,
    date: String,
    mtime: i64,
}

/// Display title of an article page.
///
/// The first `<h1>` wins (inner tags stripped); an empty or missing `<h1>`
/// falls back to `<title>`, then to a placeholder.
pub fn extract_title(html: &str) -> String {
    let document = Html::parse_document(html);

    let h1_selector = Selector::parse("h1").unwrap();
    if let Some(h1) = document.select(&h1_selector).next() {
        let text = h1.text().collect::<String>().trim().to_string();
        if !text.is_empty() {
            return text;
        }
    }

    let title_selector = Selector::parse("title").unwrap();
    if let Some(title) = document.select(&title_selector).next() {
        let text = title.text().collect::<String>().trim().to_string();
        if !text.is_empty() {
            return text;
        }
    }

    "(no title)".to_string()
}

/// Date carried in a post filename, or empty.
///
/// Accepts both the digest-style `genba_YYYY-MM-DD_N.html` and the weekly
/// slug convention of a leading `YYYY-MM-DD`.
pub fn date_from_filename(name: &str) -> String {
    FILE_DATE
        .captures(name)
        .map(|c| c[1].to_string())
        .unwrap_or_default()
}

/// Milliseconds since the epoch for a `YYYY-MM-DD` date, 0 when unparsable.
/// Gives hand-written pages a sortable mtime stand-in.
fn date_to_millis(date: &str) -> i64 {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or(0)
}

fn file_mtime_millis(path: &Path) -> i64 {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Dated rows newest first, dated before undated, then mtime descending.
fn sort_items(items: &mut [IndexItem]) {
    items.sort_by(|a, b| match (!a.date.is_empty(), !b.date.is_empty()) {
        (true, true) => b.date.cmp(&a.date),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => b.mtime.cmp(&a.mtime),
    });
}

/// Collect one row per article file in the posts directory.
///
/// `index.html` itself and non-HTML files are skipped. A missing directory
/// reads as empty.
fn scan_posts(posts_dir: &Path) -> Result<Vec<IndexItem>> {
    let mut items = Vec::new();
    let entries = match std::fs::read_dir(posts_dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(items),
    };

    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(".html") || name == "index.html" {
            continue;
        }
        let path = entry.path();
        let html = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        items.push(IndexItem {
            title: extract_title(&html),
            date: date_from_filename(&name),
            mtime: file_mtime_millis(&path),
            href: name,
        });
    }
    Ok(items)
}

/// Theme-queue management section. Talks to `/api/genba/themes`; the head of
/// the queue is what the next weekly run will consume.
const QUEUE_UI: &str = r#"<section class="card" style="margin-top:16px;">
  <div style="display:flex; gap:8px; flex-wrap:wrap; align-items:center;">
    <span class="badge" id="queueCurrent">設定中のテーマ：読み込み中...</span>
  </div>

  <div style="display:flex; gap:8px; flex-wrap:wrap; align-items:center; margin-top:10px;">
    <input id="themeInput" class="input" style="min-width:260px; flex:1;" placeholder="例：PCの便利機能(Windows)" />
    <button class="btn primary" id="btnAdd">追加</button>
    <button class="btn" id="btnClear">全削除</button>
    <button class="btn" id="btnReload">更新</button>
  </div>

  <div id="queueList" style="margin-top:10px;"></div>

  <p style="margin-top:10px; opacity:.8; font-size:.9em;">
    ※追加したテーマは、次回の自動生成で先頭から1件消費されます。
  </p>
</section>

<script>
(async () => {
  const $ = (id) => document.getElementById(id);

  async function fetchJson(url, opts) {
    const res = await fetch(url, opts);
    const ct = res.headers.get("content-type") || "";
    const data = ct.includes("application/json") ? await res.json().catch(() => null) : await res.text().catch(() => "");
    if (!res.ok) {
      const msg = (data && data.message) ? data.message : (typeof data === "string" ? data : ("HTTP " + res.status));
      throw new Error(msg);
    }
    return data;
  }

  function renderQueue(items) {
    const current = items && items.length ? items[0].theme : "";
    $("queueCurrent").textContent = "設定中のテーマ：" + (current || "(なし)");

    const box = $("queueList");
    box.innerHTML = "";

    if (!items || items.length === 0) {
      const p = document.createElement("p");
      p.textContent = "キューは空です。";
      box.appendChild(p);
      return;
    }

    const ol = document.createElement("ol");
    ol.style.margin = "0";
    ol.style.paddingLeft = "1.2em";

    items.forEach((it, idx) => {
      const li = document.createElement("li");
      li.style.margin = "6px 0";

      const row = document.createElement("div");
      row.style.display = "flex";
      row.style.gap = "8px";
      row.style.flexWrap = "wrap";
      row.style.alignItems = "center";

      const text = document.createElement("span");
      text.textContent = it.theme;

      const meta = document.createElement("span");
      meta.style.opacity = ".7";
      meta.style.fontSize = ".85em";
      meta.textContent = it.createdAtJST ? ("(" + it.createdAtJST + ")") : "";

      const btn = document.createElement("button");
      btn.className = "btn";
      btn.textContent = "削除";
      btn.addEventListener("click", async () => {
        btn.disabled = true;
        try {
          await fetchJson("/api/genba/themes/" + encodeURIComponent(it.id), { method: "DELETE" });
          await loadQueue();
        } catch (e) {
          alert("削除失敗: " + (e && e.message ? e.message : e));
        } finally {
          btn.disabled = false;
        }
      });

      if (idx === 0) {
        const badge = document.createElement("span");
        badge.className = "badge";
        badge.textContent = "次に生成";
        row.appendChild(badge);
      }

      row.appendChild(text);
      if (meta.textContent) row.appendChild(meta);
      row.appendChild(btn);

      li.appendChild(row);
      ol.appendChild(li);
    });

    box.appendChild(ol);
  }

  async function loadQueue() {
    const data = await fetchJson("/api/genba/themes", { method: "GET" });
    renderQueue(data.items || []);
  }

  $("btnReload").addEventListener("click", () => loadQueue().catch(e => alert(e.message || e)));

  $("btnAdd").addEventListener("click", async () => {
    const v = $("themeInput").value.trim();
    if (!v) return alert("テーマを入力してください。");

    $("btnAdd").disabled = true;
    try {
      await fetchJson("/api/genba/themes", {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify({ theme: v }),
      });
      $("themeInput").value = "";
      await loadQueue();
    } catch (e) {
      alert("追加失敗: " + (e && e.message ? e.message : e));
    } finally {
      $("btnAdd").disabled = false;
    }
  });

  $("btnClear").addEventListener("click", async () => {
    if (!confirm("キューを全削除します。よろしいですか？")) return;
    $("btnClear").disabled = true;
    try {
      await fetchJson("/api/genba/themes", { method: "DELETE" });
      await loadQueue();
    } catch (e) {
      alert("全削除失敗: " + (e && e.message ? e.message : e));
    } finally {
      $("btnClear").disabled = false;
    }
  });

  try {
    await loadQueue();
  } catch (e) {
    $("queueCurrent").textContent = "設定中のテーマ：取得失敗";
    $("queueList").textContent = "APIに繋がりませんでした: " + (e.message || e);
  }
})();
</script>"#;

const SORT_CONTROLS: &str = r#"<div style="display:flex; gap:8px; flex-wrap:wrap; align-items:center; margin:12px 0;">
  <span class="badge">並び替え</span>
  <select id="sortArticles" class="input" style="width:auto;">
    <option value="dateDesc">新しい順</option>
    <option value="dateAsc">古い順</option>
    <option value="titleAsc">タイトル A→Z</option>
    <option value="titleDesc">タイトル Z→A</option>
  </select>
</div>"#;

/// Client-side reordering of the `data-date`/`data-title`/`data-mtime`
/// attributes the list rows carry.
const SORT_SCRIPT: &str = r#"<script>
(() => {
  const sel = document.getElementById("sortArticles");
  const list = document.getElementById("articleList");

  const getDate = (li) => li.dataset.date || "";
  const getTitle = (li) => li.dataset.title || li.textContent || "";
  const getMtime = (li) => Number(li.dataset.mtime || 0);

  function cmpDate(a, b, dir) {
    const da = getDate(a), db = getDate(b);
    if (da && db) return dir * da.localeCompare(db);
    if (da && !db) return -1;
    if (!da && db) return  1;
    return dir * (getMtime(a) - getMtime(b));
  }

  function sortAndRender(mode) {
    const items = Array.from(list.querySelectorAll("li"));

    items.sort((a, b) => {
      switch (mode) {
        case "dateAsc":  return cmpDate(a, b, +1);
        case "dateDesc": return cmpDate(a, b, -1);
        case "titleAsc": return getTitle(a).localeCompare(getTitle(b), "ja");
        case "titleDesc": return getTitle(b).localeCompare(getTitle(a), "ja");
        default: return 0;
      }
    });

    const frag = document.createDocumentFragment();
    items.forEach((li) => frag.appendChild(li));
    list.appendChild(frag);
  }

  sel.addEventListener("change", () => sortAndRender(sel.value));
  sortAndRender(sel.value);
})();
</script>"#;

fn render_list(items: &[IndexItem]) -> String {
    if items.is_empty() {
        return "<p>まだ記事がありません。</p>".to_string();
    }

    let lis = items
        .iter()
        .map(|it| {
            let date_suffix = if it.date.is_empty() {
                String::new()
            } else {
                format!(" ({})", escape_html(&it.date))
            };
            format!(
                "  <li data-date=\"{}\" data-title=\"{}\" data-mtime=\"{}\">\n    <a href=\"{}\">{}</a>{}\n  </li>",
                escape_html(&it.date),
                escape_html(&it.title),
                it.mtime,
                escape_html(&it.href),
                escape_html(&it.title),
                date_suffix,
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("{SORT_CONTROLS}\n\n<ul id=\"articleList\">\n{lis}\n</ul>\n\n{SORT_SCRIPT}")
}

fn render_index_page(items: &[IndexItem]) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="ja">
<head>
  <meta charset="UTF-8">
  <title>現場で使える(土曜日に自動生成)</title>
  <link rel="stylesheet" href="/assets/styles.css">
</head>
<body>
  <header>
    <h1>現場で使える(土曜日に自動生成)</h1>
    <nav>
      <a href="/index.html">Home</a>
    </nav>
  </header>

  <main>
    {queue}
    {list}
  </main>

  <footer>
    <p>c 2025 genba_press</p>
  </footer>
</body>
</html>
"#,
        queue = QUEUE_UI,
        list = render_list(items),
    )
}

/// Rebuild `{posts_dir}/index.html` from the article files on disk plus the
/// configured hand-written pages.
#[instrument(level = "info", skip_all, fields(posts_dir = %config.paths.posts_dir.display()))]
pub async fn build_posts_index(config: &Config) -> Result<()> {
    ensure_writable_dir(&config.paths.posts_dir).await?;

    let mut items = scan_posts(&config.paths.posts_dir)?;
    for manual in &config.manual_posts {
        items.push(IndexItem {
            href: manual.href.clone(),
            title: manual.title.clone(),
            date: manual.date.clone(),
            mtime: date_to_millis(&manual.date),
        });
    }
    sort_items(&mut items);

    let html = render_index_page(&items);
    let out_path = config.paths.posts_dir.join("index.html");
    fs::write(&out_path, html)
        .await
        .with_context(|| format!("writing {}", out_path.display()))?;
    info!(path = %out_path.display(), count = items.len(), "posts index written");
    Ok(())
}

/// Replace the text between the home page markers, keeping the markers.
///
/// # Errors
///
/// Fails when either marker is missing or they appear in the wrong order.
pub fn replace_between_markers(text: &str, replacement: &str) -> Result<String> {
    let (Some(start), Some(end)) = (text.find(MARKER_START), text.find(MARKER_END)) else {
        anyhow::bail!("GENBA markers not found in index.html");
    };
    if end < start {
        anyhow::bail!("GENBA markers not found in index.html");
    }
    let before = &text[..start + MARKER_START.len()];
    let after = &text[end..];
    Ok(format!("{before}\n{replacement}\n    {after}"))
}

fn home_list_item(entry: &ManifestEntry) -> String {
    let href = entry.url.strip_prefix('/').unwrap_or(&entry.url);
    format!(
        "    <li><a href=\"{}\">{}</a> ({})</li>",
        href,
        escape_html(&entry.title),
        entry.publishedAt
    )
}

/// Rewrite the auto-generated article list on the home page.
#[instrument(level = "info", skip_all, fields(index_html = %index_html.display()))]
pub async fn update_home_index(index_html: &Path, entries: &[ManifestEntry]) -> Result<()> {
    let text = fs::read_to_string(index_html)
        .await
        .with_context(|| format!("reading {}", index_html.display()))?;

    let list = entries
        .iter()
        .map(home_list_item)
        .collect::<Vec<_>>()
        .join("\n");

    let merged = replace_between_markers(&text, &list)?;
    store::write_text_atomic(index_html, &merged)?;
    info!(count = entries.len(), "home page article list updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extract_title_prefers_h1() {
        let html = "<html><head><title>Page Title</title></head><body><h1>見出し <small>サブ</small></h1></body></html>";
        assert_eq!(extract_title(html), "見出し サブ");
    }

    #[test]
    fn test_extract_title_falls_back_to_title_tag() {
        let html = "<html><head><title> Page Title </title></head><body><p>no h1</p></body></html>";
        assert_eq!(extract_title(html), "Page Title");
    }

    #[test]
    fn test_extract_title_placeholder() {
        assert_eq!(extract_title("<html><body></body></html>"), "(no title)");
    }

    #[test]
    fn test_date_from_filename() {
        assert_eq!(date_from_filename("genba_2025-08-02_1.html"), "2025-08-02");
        assert_eq!(
            date_from_filename("2025-08-02_excel-tips.html"),
            "2025-08-02"
        );
        assert_eq!(date_from_filename("win_command.html"), "");
    }

    #[test]
    fn test_sort_items_dated_first_then_mtime() {
        let mut items = vec![
            IndexItem {
                href: "old-undated.html".into(),
                title: "old".into(),
                date: String::new(),
                mtime: 100,
            },
            IndexItem {
                href: "a.html".into(),
                title: "a".into(),
                date: "2025-08-01".into(),
                mtime: 0,
            },
            IndexItem {
                href: "new-undated.html".into(),
                title: "new".into(),
                date: String::new(),
                mtime: 200,
            },
            IndexItem {
                href: "b.html".into(),
                title: "b".into(),
                date: "2025-08-02".into(),
                mtime: 0,
            },
        ];
        sort_items(&mut items);
        let hrefs: Vec<&str> = items.iter().map(|i| i.href.as_str()).collect();
        assert_eq!(
            hrefs,
            vec!["b.html", "a.html", "new-undated.html", "old-undated.html"]
        );
    }

    #[test]
    fn test_date_to_millis() {
        assert_eq!(date_to_millis("1970-01-01"), 0);
        assert_eq!(date_to_millis("1970-01-02"), 86_400_000);
        assert_eq!(date_to_millis("not a date"), 0);
        assert_eq!(date_to_millis(""), 0);
    }

    #[test]
    fn test_render_list_empty() {
        assert_eq!(render_list(&[]), "<p>まだ記事がありません。</p>");
    }

    #[test]
    fn test_render_list_row_shape() {
        let items = vec![IndexItem {
            href: "genba_2025-08-02_1.html".into(),
            title: "Excel & 便利技".into(),
            date: "2025-08-02".into(),
            mtime: 1234,
        }];
        let html = render_list(&items);
        assert!(html.contains(
            "<li data-date=\"2025-08-02\" data-title=\"Excel &amp; 便利技\" data-mtime=\"1234\">"
        ));
        assert!(html.contains(
            "<a href=\"genba_2025-08-02_1.html\">Excel &amp; 便利技</a> (2025-08-02)"
        ));
        assert!(html.contains("id=\"sortArticles\""));
        assert!(html.contains("id=\"articleList\""));
    }

    #[test]
    fn test_replace_between_markers_keeps_markers() {
        let text = format!("<ul>\n    {}\n    old\n    {}\n</ul>", MARKER_START, MARKER_END);
        let merged = replace_between_markers(&text, "    <li>new</li>").unwrap();
        assert!(merged.contains(MARKER_START));
        assert!(merged.contains(MARKER_END));
        assert!(merged.contains("    <li>new</li>"));
        assert!(!merged.contains("old"));
    }

    #[test]
    fn test_replace_between_markers_missing() {
        assert!(replace_between_markers("<ul></ul>", "x").is_err());
        assert!(replace_between_markers(&format!("a {MARKER_START} b"), "x").is_err());
        let reversed = format!("{MARKER_END} mid {MARKER_START}");
        assert!(replace_between_markers(&reversed, "x").is_err());
    }

    #[test]
    fn test_home_list_item_strips_one_slash() {
        let entry = ManifestEntry {
            source: "auto".into(),
            title: "A & B".into(),
            publishedAt: "2025-08-02".into(),
            url: "/posts/genba/2025-08-02_a.html".into(),
            filePath: "/var/www/html/posts/genba/2025-08-02_a.html".into(),
            toc: vec![],
            summary: String::new(),
            updatedAtJST: "2025-08-02T10:00:00.000+09:00".into(),
        };
        assert_eq!(
            home_list_item(&entry),
            "    <li><a href=\"posts/genba/2025-08-02_a.html\">A &amp; B</a> (2025-08-02)</li>"
        );
    }

    #[tokio::test]
    async fn test_build_posts_index_writes_page() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.posts_dir = dir.path().to_path_buf();

        std::fs::write(
            dir.path().join("2025-08-02_excel.html"),
            "<html><head><title>t</title></head><body><h1>Excel入門</h1></body></html>",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("notes.txt"),
            "not html",
        )
        .unwrap();

        build_posts_index(&config).await.unwrap();

        let index = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert!(index.contains("<title>現場で使える(土曜日に自動生成)</title>"));
        assert!(index.contains("<a href=\"2025-08-02_excel.html\">Excel入門</a> (2025-08-02)"));
        assert!(index.contains("queueCurrent"));
        assert!(!index.contains("notes.txt"));
    }

    #[tokio::test]
    async fn test_build_posts_index_empty_dir() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.posts_dir = dir.path().to_path_buf();

        build_posts_index(&config).await.unwrap();

        let index = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert!(index.contains("<p>まだ記事がありません。</p>"));
    }

    #[tokio::test]
    async fn test_update_home_index_roundtrip() {
        let dir = TempDir::new().unwrap();
        let index_path = dir.path().join("index.html");
        std::fs::write(
            &index_path,
            format!(
                "<body><ul>\n    {}\n    <li>stale</li>\n    {}\n</ul></body>",
                MARKER_START, MARKER_END
            ),
        )
        .unwrap();

        let entry = ManifestEntry {
            source: "auto".into(),
            title: "新記事".into(),
            publishedAt: "2025-08-02".into(),
            url: "/posts/genba/2025-08-02_a.html".into(),
            filePath: dir.path().join("2025-08-02_a.html").display().to_string(),
            toc: vec![],
            summary: String::new(),
            updatedAtJST: "2025-08-02T10:00:00.000+09:00".into(),
        };
        update_home_index(&index_path, &[entry]).await.unwrap();

        let text = std::fs::read_to_string(&index_path).unwrap();
        assert!(text.contains(MARKER_START));
        assert!(text.contains(MARKER_END));
        assert!(text.contains("<li><a href=\"posts/genba/2025-08-02_a.html\">新記事</a> (2025-08-02)</li>"));
        assert!(!text.contains("stale"));
    }

    #[tokio::test]
    async fn test_update_home_index_requires_markers() {
        let dir = TempDir::new().unwrap();
        let index_path = dir.path().join("index.html");
        std::fs::write(&index_path, "<body>no markers</body>").unwrap();

        let err = update_home_index(&index_path, &[]).await.unwrap_err();
        assert!(err.to_string().contains("markers"));
    }
}
