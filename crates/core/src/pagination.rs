//! Paginator arithmetic: which page links to show around the current page.

use crate::model::PageNumber;

/// Number of pages shown on each side of the current page.
pub const WINDOW_RADIUS: u32 = 3;

/// One entry in the paginator strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page(PageNumber),
    Current(PageNumber),
    /// Elided run of pages.
    Gap,
}

/// Page links for `current` out of `max_page` known pages.
///
/// Shows `current ± WINDOW_RADIUS`, always keeps the first and last page, and
/// inserts a [`PageLink::Gap`] where more than one page is skipped.
#[must_use]
pub fn visible_pages(current: PageNumber, max_page: u32) -> Vec<PageLink> {
    if max_page == 0 {
        return Vec::new();
    }
    let current_raw = current.get().min(max_page);
    let start = current_raw.saturating_sub(WINDOW_RADIUS).max(1);
    let end = current_raw.saturating_add(WINDOW_RADIUS).min(max_page);

    let mut links = Vec::new();
    if start > 1 {
        links.push(link(1, current_raw));
        if start > 2 {
            links.push(PageLink::Gap);
        }
    }
    for page in start..=end {
        links.push(link(page, current_raw));
    }
    if end < max_page {
        if end + 1 < max_page {
            links.push(PageLink::Gap);
        }
        links.push(link(max_page, current_raw));
    }
    links
}

fn link(page: u32, current: u32) -> PageLink {
    // Callers only pass pages >= 1.
    let number = PageNumber::new(page).unwrap_or_default();
    if page == current {
        PageLink::Current(number)
    } else {
        PageLink::Page(number)
    }
}

#[must_use]
pub fn can_go_previous(current: PageNumber) -> bool {
    current.previous().is_some()
}

#[must_use]
pub fn can_go_next(current: PageNumber, max_page: u32) -> bool {
    current.get() < max_page
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: u32) -> PageNumber {
        PageNumber::new(n).unwrap()
    }

    fn render(links: &[PageLink]) -> String {
        links
            .iter()
            .map(|l| match l {
                PageLink::Page(p) => p.to_string(),
                PageLink::Current(p) => format!("[{p}]"),
                PageLink::Gap => "…".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn small_catalog_shows_every_page() {
        assert_eq!(render(&visible_pages(page(2), 4)), "1 [2] 3 4");
    }

    #[test]
    fn large_catalog_elides_both_ends() {
        assert_eq!(
            render(&visible_pages(page(10), 20)),
            "1 … 7 8 9 [10] 11 12 13 … 20"
        );
    }

    #[test]
    fn no_gap_when_only_one_page_is_skipped() {
        assert_eq!(render(&visible_pages(page(5), 9)), "1 2 3 4 [5] 6 7 8 9");
        assert_eq!(render(&visible_pages(page(1), 5)), "[1] 2 3 4 5");
    }

    #[test]
    fn empty_when_nothing_known() {
        assert!(visible_pages(page(1), 0).is_empty());
    }

    #[test]
    fn navigation_bounds() {
        assert!(!can_go_previous(page(1)));
        assert!(can_go_previous(page(2)));
        assert!(can_go_next(page(2), 3));
        assert!(!can_go_next(page(3), 3));
    }
}
