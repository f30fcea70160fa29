//! URL slugs and heading anchors.
//!
//! Two related transforms live here:
//!
//! - [`slugify`] produces the `slug` column for posts and categories. It keeps
//!   letters and digits from any script, so Korean titles stay readable in URLs.
//! - [`heading_id`] produces `id` attributes for `##` headings so the table of
//!   contents can link to them. It only keeps ASCII word characters and Hangul
//!   syllables, and does not strip edge hyphens.

use std::sync::LazyLock;

use regex::Regex;

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}\s-]").expect("valid regex"));
static SLUG_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s-]+").expect("valid regex"));

static NON_ANCHOR_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\s가-힣-]").expect("valid regex"));
static WHITESPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static HYPHEN_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("valid regex"));

/// Turn free text into a URL slug.
///
/// Steps: trim, lowercase, drop everything that is not a letter, number,
/// whitespace or hyphen, collapse whitespace/hyphen runs into a single `-`,
/// then strip leading and trailing hyphens.
///
/// The result may be empty (e.g. for `"!!!"`); callers decide on a fallback.
///
/// ```
/// use techblog_core::slug::slugify;
///
/// assert_eq!(slugify("  Hello, 세계!  Rust--2024 "), "hello-세계-rust-2024");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let kept = NON_SLUG_CHARS.replace_all(&lowered, "");
    let joined = SLUG_SEPARATORS.replace_all(&kept, "-");
    joined.trim_matches('-').to_owned()
}

/// Anchor id for a heading.
///
/// Lowercase, keep ASCII word characters, Hangul syllables, whitespace and
/// hyphens, turn whitespace runs into `-` and collapse repeated hyphens.
#[must_use]
pub fn heading_id(text: &str) -> String {
    let lowered = text.to_lowercase();
    let kept = NON_ANCHOR_CHARS.replace_all(&lowered, "");
    let dashed = WHITESPACE_RUNS.replace_all(&kept, "-");
    HYPHEN_RUNS.replace_all(&dashed, "-").trim().to_owned()
}
