//! View models shared by the listing templates.
//!
//! Handlers turn domain [`Post`]s into [`PostCardView`]s and wrap a page of
//! them in a [`PostListView`]. All link building lives here so that templates
//! only print strings.

use techblog_core::format::{format_date, iso8601};
use techblog_core::pagination::PageWindow;
use url::form_urlencoded;

use crate::models::{CategoryWithCount, Post};

/// Tags shown on a card before the `+N` badge takes over.
pub const VISIBLE_TAGS: usize = 3;

/// Listing path the tag links and search form point at.
pub const POSTS_PATH: &str = "/posts";

/// Filter parameters carried from one listing page to the next.
///
/// Serialised in a fixed `q`, `category`, `tags`, `page` order, with `page`
/// left out for the first page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

impl ListParams {
    /// Query string for `page`, without the leading `?`.
    #[must_use]
    pub fn query_string(&self, page: u32) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if let Some(q) = &self.q {
            serializer.append_pair("q", q);
        }
        if let Some(category) = &self.category {
            serializer.append_pair("category", category);
        }
        if !self.tags.is_empty() {
            serializer.append_pair("tags", &self.tags.join(","));
        }
        if page > 1 {
            serializer.append_pair("page", &page.to_string());
        }
        serializer.finish()
    }

    /// `base` with this filter and `page` appended.
    #[must_use]
    pub fn href(&self, base: &str, page: u32) -> String {
        let query = self.query_string(page);
        if query.is_empty() {
            base.to_owned()
        } else {
            format!("{base}?{query}")
        }
    }

    /// Same filter plus `tag`, unless it is already active.
    #[must_use]
    pub fn with_tag(&self, tag: &str) -> Self {
        let mut next = self.clone();
        if !next.tags.iter().any(|t| t == tag) {
            next.tags.push(tag.to_owned());
        }
        next
    }

    #[must_use]
    pub fn without_tag(&self, tag: &str) -> Self {
        let mut next = self.clone();
        next.tags.retain(|t| t != tag);
        next
    }

    #[must_use]
    pub fn with_category(&self, category: Option<&str>) -> Self {
        Self {
            category: category.map(str::to_owned),
            ..self.clone()
        }
    }

    /// Link that narrows the post list to `tag` on top of this filter.
    #[must_use]
    pub fn tag_href(&self, tag: &str) -> String {
        self.with_tag(tag).href(POSTS_PATH, 1)
    }

    #[must_use]
    pub fn is_searching(&self) -> bool {
        self.q.is_some() || !self.tags.is_empty()
    }
}

/// A tag rendered as a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagLinkView {
    pub name: String,
    pub href: String,
}

/// One card in a post list.
#[derive(Debug, Clone)]
pub struct PostCardView {
    pub href: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub category_name: Option<String>,
    pub date_iso: String,
    pub date_display: String,
    pub tags: Vec<TagLinkView>,
    pub hidden_tag_count: usize,
    /// Tooltip of the `+N` badge, e.g. `#rust #axum`.
    pub hidden_tags_title: String,
}

impl PostCardView {
    /// Build a card; tag links stack onto `params`.
    #[must_use]
    pub fn new(post: &Post, params: &ListParams) -> Self {
        let names: Vec<&str> = post.tag_names().collect();
        let (visible, hidden) = names.split_at(names.len().min(VISIBLE_TAGS));

        Self {
            href: post_href(&post.slug),
            title: post.title.clone(),
            excerpt: post.excerpt.clone().filter(|e| !e.trim().is_empty()),
            category_name: post.category.as_ref().map(|c| c.name.clone()),
            date_iso: iso8601(post.created_at),
            date_display: format_date(post.created_at),
            tags: visible
                .iter()
                .map(|name| TagLinkView {
                    name: (*name).to_owned(),
                    href: params.tag_href(name),
                })
                .collect(),
            hidden_tag_count: hidden.len(),
            hidden_tags_title: hidden
                .iter()
                .map(|name| format!("#{name}"))
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// Public URL of a post.
#[must_use]
pub fn post_href(slug: &str) -> String {
    format!("{POSTS_PATH}/{}", urlencoding::encode(slug))
}

/// Public URL of a category page.
#[must_use]
pub fn category_href(slug: &str) -> String {
    format!("/categories/{}", urlencoding::encode(slug))
}

/// A navigation control (`«`, `‹`, `›`, `»`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub href: String,
    pub label: &'static str,
    pub aria_label: &'static str,
    pub disabled: bool,
}

/// One of the five numbered slots. `page` is `None` for an empty slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSlot {
    pub page: Option<u32>,
    pub href: String,
    pub current: bool,
}

/// The pagination bar under a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationView {
    pub first: PageLink,
    pub back: PageLink,
    pub slots: Vec<PageSlot>,
    pub forward: PageLink,
    pub last: PageLink,
}

impl PaginationView {
    /// `None` when everything fits on one page.
    #[must_use]
    pub fn build(current: u32, total_pages: u32, base: &str, params: &ListParams) -> Option<Self> {
        let window = PageWindow::new(current, total_pages)?;
        let link = |page: u32, label, aria_label, disabled| PageLink {
            href: params.href(base, page),
            label,
            aria_label,
            disabled,
        };

        Some(Self {
            first: link(1, "«", "처음 페이지", window.at_start()),
            back: link(window.back, "‹", "5페이지 전", window.at_start()),
            slots: window
                .slots
                .iter()
                .map(|slot| PageSlot {
                    page: *slot,
                    href: slot.map(|p| params.href(base, p)).unwrap_or_default(),
                    current: *slot == Some(window.current),
                })
                .collect(),
            forward: link(window.forward, "›", "5페이지 후", window.at_end()),
            last: link(window.total, "»", "마지막 페이지", window.at_end()),
        })
    }

    /// `«` and `‹`, in display order.
    #[must_use]
    pub fn leading(&self) -> [&PageLink; 2] {
        [&self.first, &self.back]
    }

    /// `›` and `»`, in display order.
    #[must_use]
    pub fn trailing(&self) -> [&PageLink; 2] {
        [&self.forward, &self.last]
    }
}

/// A page of cards plus its pagination bar.
#[derive(Debug, Clone)]
pub struct PostListView {
    pub cards: Vec<PostCardView>,
    pub pagination: Option<PaginationView>,
}

impl PostListView {
    #[must_use]
    pub fn new(
        posts: &[Post],
        current: u32,
        total_pages: u32,
        base: &str,
        params: &ListParams,
    ) -> Self {
        Self {
            cards: posts.iter().map(|p| PostCardView::new(p, params)).collect(),
            pagination: PaginationView::build(current, total_pages, base, params),
        }
    }

    /// Cards only, no pagination (home page).
    #[must_use]
    pub fn unpaged(posts: &[Post]) -> Self {
        Self::new(posts, 1, 1, POSTS_PATH, &ListParams::default())
    }
}

/// A category filter chip on the posts page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterChip {
    pub label: String,
    pub href: String,
    pub active: bool,
}

/// An active tag filter with its remove link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTagView {
    pub name: String,
    pub remove_href: String,
}

/// Search form, category chips and active tag filters above the post list.
#[derive(Debug, Clone)]
pub struct SearchBarView {
    pub q: String,
    pub category: String,
    pub tags: String,
    pub category_chips: Vec<FilterChip>,
    pub active_tags: Vec<ActiveTagView>,
    pub result_line: Option<String>,
}

impl SearchBarView {
    #[must_use]
    pub fn new(params: &ListParams, categories: &[CategoryWithCount], total_count: u64) -> Self {
        let active = params.category.as_deref();

        let mut category_chips = vec![FilterChip {
            label: "전체".to_owned(),
            href: params.with_category(None).href(POSTS_PATH, 1),
            active: active.is_none(),
        }];
        category_chips.extend(categories.iter().map(|c| {
            let is_active = active == Some(c.category.slug.as_str());
            let target = if is_active {
                None
            } else {
                Some(c.category.slug.as_str())
            };
            FilterChip {
                label: c.category.name.clone(),
                href: params.with_category(target).href(POSTS_PATH, 1),
                active: is_active,
            }
        }));

        let active_tags = params
            .tags
            .iter()
            .map(|tag| ActiveTagView {
                name: tag.clone(),
                remove_href: params.without_tag(tag).href(POSTS_PATH, 1),
            })
            .collect();

        Self {
            q: params.q.clone().unwrap_or_default(),
            category: params.category.clone().unwrap_or_default(),
            tags: params.tags.join(","),
            category_chips,
            active_tags,
            result_line: params
                .is_searching()
                .then(|| result_line(params, total_count)),
        }
    }
}

/// `“rust” #async, #tokio 검색 결과: 3건`
fn result_line(params: &ListParams, total_count: u64) -> String {
    let mut line = String::new();
    if let Some(q) = &params.q {
        line.push_str(&format!("\u{201c}{q}\u{201d} "));
    }
    if !params.tags.is_empty() {
        let tags: Vec<String> = params.tags.iter().map(|t| format!("#{t}")).collect();
        line.push_str(&tags.join(", "));
        line.push(' ');
    }
    line.push_str(&format!("검색 결과: {total_count}건"));
    line
}
