//! Table of contents extraction from markdown source.
//!
//! Only second-level ATX headings (`## Title`) are listed. Lines inside
//! fenced code blocks are skipped so that shell comments such as `## build`
//! inside a ```` ``` ```` block do not show up.

use std::sync::LazyLock;

use regex::Regex;

use crate::slug::heading_id;

static H2_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##\s+(.+)$").expect("valid regex"));

/// Inline markdown markers removed from heading text.
const INLINE_MARKERS: &[char] = &['`', '*', '_', '~', '[', ']'];

/// One entry in the table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocItem {
    /// Anchor id, as produced by [`heading_id`].
    pub id: String,
    /// Heading text with inline markdown markers removed.
    pub text: String,
}

/// Collect the `##` headings of a markdown document in order.
#[must_use]
pub fn extract_headings(markdown: &str) -> Vec<TocItem> {
    let mut items = Vec::new();
    let mut in_code_block = false;

    for line in markdown.lines() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            continue;
        }
        if in_code_block {
            continue;
        }

        if let Some(caps) = H2_LINE.captures(line)
            && let Some(raw) = caps.get(1)
        {
            let text = strip_inline_markers(raw.as_str());
            items.push(TocItem {
                id: heading_id(&text),
                text,
            });
        }
    }

    items
}

/// Remove the characters markdown uses for emphasis, code and links.
#[must_use]
pub fn strip_inline_markers(text: &str) -> String {
    text.chars().filter(|c| !INLINE_MARKERS.contains(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_only_h2() {
        let md = "# Title\n\n## First\ntext\n### Sub\n## Second Part\n";
        let items = extract_headings(md);
        assert_eq!(
            items,
            vec![
                TocItem {
                    id: "first".into(),
                    text: "First".into()
                },
                TocItem {
                    id: "second-part".into(),
                    text: "Second Part".into()
                },
            ]
        );
    }

    #[test]
    fn test_skips_fenced_code() {
        let md = "## Before\n```bash\n## not a heading\n```\n## After\n";
        let ids: Vec<_> = extract_headings(md).into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["before", "after"]);
    }

    #[test]
    fn test_indented_fence_still_toggles() {
        let md = "  ```\n## hidden\n  ```\n## shown\n";
        let ids: Vec<_> = extract_headings(md).into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["shown"]);
    }

    #[test]
    fn test_strips_inline_markdown() {
        let items = extract_headings("## Using `tokio::spawn` with **care**\n");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "Using tokio::spawn with care");
        assert_eq!(items[0].id, "using-tokiospawn-with-care");
    }

    #[test]
    fn test_korean_heading() {
        let items = extract_headings("## 설치 및 설정\n");
        assert_eq!(items[0].id, "설치-및-설정");
    }

    #[test]
    fn test_requires_space_after_hashes() {
        assert!(extract_headings("##NoSpace\n").is_empty());
        assert!(extract_headings("## \n").is_empty());
    }

    #[test]
    fn test_handles_crlf() {
        let items = extract_headings("## Windows\r\nbody\r\n## Two Words\r\n");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text, "Windows");
        assert_eq!(items[1].id, heading_id("Two Words"));
        assert!(!items[1].text.ends_with('\r'));
    }
}
