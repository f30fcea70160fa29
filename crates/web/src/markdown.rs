//! Markdown to HTML for post bodies and the editor preview.
//!
//! GitHub Flavored Markdown via `comrak`, raw HTML allowed (the only author
//! is the admin). Two passes run over comrak's output:
//!
//! - every `<h2>` gets an `id` so table-of-contents links resolve
//! - every `<pre>` is wrapped with a copy button

use std::sync::LazyLock;

use comrak::{Options, markdown_to_html};
use regex::{Captures, Regex};

use techblog_core::slug::heading_id;
use techblog_core::toc::{TocItem, extract_headings, strip_inline_markers};

static H2_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<h2>(.*?)</h2>").expect("valid regex"));
static PRE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<pre(?:\s[^>]*)?>.*?</pre>").expect("valid regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

const COPY_BUTTON: &str =
    r#"<button type="button" class="copy-button" aria-label="코드 복사">복사</button>"#;

/// A rendered post body and its table of contents.
#[derive(Debug, Clone)]
pub struct RenderedPost {
    pub html: String,
    pub toc: Vec<TocItem>,
}

/// Render a post body together with its table of contents.
#[must_use]
pub fn render_post(source: &str) -> RenderedPost {
    let toc = extract_headings(source);
    let html = render_with_toc(source, &toc);
    RenderedPost { html, toc }
}

/// Render markdown to HTML (used by the editor preview).
#[must_use]
pub fn render_markdown(source: &str) -> String {
    render_with_toc(source, &extract_headings(source))
}

fn render_with_toc(source: &str, toc: &[TocItem]) -> String {
    let html = markdown_to_html(source, &options());
    let html = add_heading_ids(&html, toc);
    wrap_code_blocks(&html)
}

fn options() -> Options<'static> {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.superscript = true;
    options.extension.footnotes = true;

    options.render.r#unsafe = true;

    options
}

/// Give each `<h2>` an `id`.
///
/// When the rendered headings line up one-to-one with the table of contents
/// the TOC ids are used, so both sides always agree. Otherwise (e.g. setext
/// headings, which the TOC does not list) ids come from the heading text.
fn add_heading_ids(html: &str, toc: &[TocItem]) -> String {
    let use_toc = H2_RE.find_iter(html).count() == toc.len();
    let mut index = 0;

    H2_RE
        .replace_all(html, |caps: &Captures| {
            let inner = caps.get(1).map_or("", |m| m.as_str());
            let id = match toc.get(index) {
                Some(item) if use_toc => item.id.clone(),
                _ => {
                    let text = TAG_RE.replace_all(inner, "");
                    heading_id(&strip_inline_markers(&text))
                }
            };
            index += 1;
            format!(r#"<h2 id="{id}">{inner}</h2>"#)
        })
        .into_owned()
}

fn wrap_code_blocks(html: &str) -> String {
    PRE_RE
        .replace_all(html, |caps: &Captures| {
            format!(r#"<div class="code-block-wrapper">{COPY_BUTTON}{}</div>"#, &caps[0])
        })
        .into_owned()
}
