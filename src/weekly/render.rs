//! HTML page rendering for weekly articles.
//!
//! The page skeleton is fixed: header with site navigation, 投稿日 line,
//! a linked 目次, one `<h3>` block per section, a closing paragraph, and
//! the site footer. Only two fields arrive as trusted HTML fragments
//! (`bodyHtml` and `closingHtml`, produced by the proofreading stage);
//! everything else is escaped on the way in.

use crate::models::{FinalArticle, FinalSection};
use crate::utils::escape_html;
use std::fmt::Write;

/// Render one section: heading, optional cautions box, body, code blocks.
fn section_html(sec: &FinalSection) -> String {
    let mut out = String::new();

    writeln!(
        out,
        "      <h3 id=\"{}\">{}</h3>",
        escape_html(&sec.id),
        escape_html(&sec.heading)
    )
    .unwrap();

    if !sec.cautions.is_empty() {
        out.push_str(
            "      <div style=\"border:1px solid #f2c; border-radius:10px; padding:10px; margin:10px 0;\">\n",
        );
        out.push_str("        <b>注意</b>\n        <ul>\n");
        for c in &sec.cautions {
            writeln!(out, "          <li>{}</li>", escape_html(c)).unwrap();
        }
        out.push_str("        </ul>\n      </div>\n");
    }

    // bodyHtml is a trusted fragment from the proofreading stage.
    writeln!(out, "      <p>{}</p>", sec.bodyHtml).unwrap();

    for cb in &sec.codeBlocks {
        if let Some(caption) = &cb.caption {
            writeln!(
                out,
                "      <div style=\"font-size:0.9em;opacity:.8;margin:6px 0;\">{}</div>",
                escape_html(caption)
            )
            .unwrap();
        }
        writeln!(out, "      <pre><code>{}</code></pre>", escape_html(&cb.code)).unwrap();
    }

    out
}

/// Render a complete article page.
///
/// # Arguments
///
/// * `article` - The proofread final article
///
/// # Returns
///
/// A standalone HTML document (`lang="ja"`, UTF-8) linking the shared
/// site stylesheet.
pub fn page(article: &FinalArticle) -> String {
    let toc_html = article
        .toc
        .iter()
        .map(|x| {
            format!(
                "<li><a href=\"#{}\">{}</a></li>",
                escape_html(&x.id),
                escape_html(&x.label)
            )
        })
        .collect::<Vec<_>>()
        .join("\n        ");

    let sections_html = article
        .sections
        .iter()
        .map(section_html)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<!DOCTYPE html>
<html lang="ja">
<head>
  <meta charset="UTF-8">
  <title>{title}</title>
  <link rel="stylesheet" href="/assets/styles.css">
</head>
<body>
  <header>
    <h1>{title}</h1>
    <nav><a href="/index.html">Home</a></nav>
  </header>

  <main>
    <article>
      <p><small>投稿日：{date}</small></p>

      <h3>目次</h3>
      <ul>
        {toc}
      </ul>
      <br>

{sections}
      <hr>
      <div>{closing}</div>
    </article>
  </main>

  <footer><p>c 2025 genba_press</p></footer>
</body>
</html>
"#,
        title = escape_html(&article.title),
        date = escape_html(&article.publishedDate),
        toc = toc_html,
        sections = sections_html,
        closing = article.closingHtml,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CodeBlock, QualityChecks, TocEntry};

    fn article() -> FinalArticle {
        FinalArticle {
            title: "Excel & PowerShell".to_string(),
            publishedDate: "2025-08-02".to_string(),
            slug: "excel-powershell".to_string(),
            keywords: vec!["excel".to_string()],
            toc: vec![TocEntry {
                id: "sec1".to_string(),
                label: "準備 <必須>".to_string(),
            }],
            sections: vec![FinalSection {
                id: "sec1".to_string(),
                heading: "準備".to_string(),
                bodyHtml: "手順は<b>3つ</b>あります。".to_string(),
                codeBlocks: vec![CodeBlock {
                    lang: "powershell".to_string(),
                    code: "Get-Content log.txt | Select-String \"<error>\"".to_string(),
                    caption: Some("一覧の取得".to_string()),
                }],
                cautions: vec!["管理者権限が必要".to_string()],
            }],
            closingHtml: "<p>お疲れさまでした。</p>".to_string(),
            qualityChecks: QualityChecks {
                noDuplication: true,
                dupReason: None,
                fixedPoints: vec![],
            },
        }
    }

    #[test]
    fn test_page_skeleton() {
        let html = page(&article());
        assert!(html.starts_with("<!DOCTYPE html>\n<html lang=\"ja\">"));
        assert!(html.contains("<meta charset=\"UTF-8\">"));
        assert!(html.contains("<link rel=\"stylesheet\" href=\"/assets/styles.css\">"));
        assert!(html.contains("<nav><a href=\"/index.html\">Home</a></nav>"));
        assert!(html.contains("<p><small>投稿日：2025-08-02</small></p>"));
        assert!(html.contains("<h3>目次</h3>"));
        assert!(html.contains("<footer><p>c 2025 genba_press</p></footer>"));
    }

    #[test]
    fn test_page_escapes_title_and_toc() {
        let html = page(&article());
        assert!(html.contains("<title>Excel &amp; PowerShell</title>"));
        assert!(html.contains("<li><a href=\"#sec1\">準備 &lt;必須&gt;</a></li>"));
    }

    #[test]
    fn test_page_keeps_trusted_fragments_raw() {
        let html = page(&article());
        assert!(html.contains("<p>手順は<b>3つ</b>あります。</p>"));
        assert!(html.contains("<div><p>お疲れさまでした。</p></div>"));
    }

    #[test]
    fn test_section_cautions_and_code_escaped() {
        let html = page(&article());
        assert!(html.contains("<b>注意</b>"));
        assert!(html.contains("<li>管理者権限が必要</li>"));
        assert!(html.contains("<div style=\"font-size:0.9em;opacity:.8;margin:6px 0;\">一覧の取得</div>"));
        assert!(html.contains(
            "<pre><code>Get-Content log.txt | Select-String &quot;&lt;error&gt;&quot;</code></pre>"
        ));
    }

    #[test]
    fn test_section_without_extras() {
        let mut a = article();
        a.sections[0].cautions.clear();
        a.sections[0].codeBlocks.clear();
        let html = page(&a);
        assert!(!html.contains("注意"));
        assert!(!html.contains("<pre><code>"));
        assert!(html.contains("<h3 id=\"sec1\">準備</h3>"));
    }
}
