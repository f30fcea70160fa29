//! Offset pagination arithmetic and the page-link window.
//!
//! Listing pages show [`POSTS_PER_PAGE`] posts per page. The navigation bar
//! under a list is a fixed five-slot window centred on the current page,
//! flanked by "first", "back five", "forward five" and "last" links.

/// Posts per page on the public listing pages.
pub const POSTS_PER_PAGE: u32 = 5;

/// Number of numbered slots in the page-link window.
pub const WINDOW_SLOTS: usize = 5;

/// How far the `‹`/`›` links jump.
const JUMP: u32 = 5;

/// Parse a `?page=` value. Missing, malformed, zero or negative values mean page 1.
#[must_use]
pub fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|&page| page >= 1)
        .unwrap_or(1)
}

/// Number of pages needed for `total` items, `ceil(total / per_page)`.
///
/// Zero items means zero pages. A zero `per_page` also yields zero.
#[must_use]
pub fn total_pages(total: u64, per_page: u32) -> u32 {
    if per_page == 0 {
        return 0;
    }
    u32::try_from(total.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX)
}

/// A page of a listing: which page, and how many items per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    /// Page numbers below 1 are clamped to 1.
    #[must_use]
    pub const fn new(page: u32, per_page: u32) -> Self {
        let page = if page == 0 { 1 } else { page };
        Self { page, per_page }
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn per_page(&self) -> u32 {
        self.per_page
    }

    /// SQL `OFFSET`: `(page - 1) * per_page`.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    /// SQL `LIMIT`.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

/// The link layout for a pagination bar.
///
/// Only built when there is more than one page; a single page gets no bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow {
    pub current: u32,
    pub total: u32,
    /// Pages `current-2 ..= current+2`; `None` where that page does not exist.
    pub slots: [Option<u32>; WINDOW_SLOTS],
    /// Target of the `‹` link: five pages back, never below 1.
    pub back: u32,
    /// Target of the `›` link: five pages forward, never past the last page.
    pub forward: u32,
}

impl PageWindow {
    /// Build the window for `current` out of `total` pages.
    ///
    /// Returns `None` when `total <= 1`.
    #[must_use]
    pub fn new(current: u32, total: u32) -> Option<Self> {
        if total <= 1 {
            return None;
        }

        let current = current.max(1);
        let mut slots = [None; WINDOW_SLOTS];
        for (slot, offset) in slots.iter_mut().zip(-2_i64..=2) {
            let page = i64::from(current) + offset;
            if page >= 1 && page <= i64::from(total) {
                *slot = u32::try_from(page).ok();
            }
        }

        Some(Self {
            current,
            total,
            slots,
            back: current.saturating_sub(JUMP).max(1),
            forward: current.saturating_add(JUMP).min(total),
        })
    }

    /// `«` and `‹` are disabled on the first page.
    #[must_use]
    pub const fn at_start(&self) -> bool {
        self.current == 1
    }

    /// `›` and `»` are disabled on the last page.
    #[must_use]
    pub const fn at_end(&self) -> bool {
        self.current == self.total
    }
}
