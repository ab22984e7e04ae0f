//! Page controls derived from the current page and the page count.

use std::collections::BTreeSet;

use serde::Serialize;

/// Pages shown around the current one.
pub const PAGE_WINDOW: u32 = 5;

/// Pages always shown at each end.
pub const MARGIN_PAGES: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PageItem {
    Previous { enabled: bool },
    Page { number: u32, current: bool },
    /// Hidden pages.
    Break,
    Next { enabled: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageControls {
    pub current: u32,
    pub total: u32,
    pub items: Vec<PageItem>,
}

/// Controls for a listing, or `None` when it fits on one page.
///
/// `page` is clamped into `1..=total`.
pub fn page_controls(page: u32, total: u32) -> Option<PageControls> {
    if total <= 1 {
        return None;
    }
    let current = page.clamp(1, total);

    let mut shown = BTreeSet::new();
    shown.extend(1..=MARGIN_PAGES.min(total));
    shown.extend(total.saturating_sub(MARGIN_PAGES) + 1..=total);

    let mut start = current.saturating_sub(PAGE_WINDOW / 2).max(1);
    let end = start.saturating_add(PAGE_WINDOW - 1).min(total);
    if end - start + 1 < PAGE_WINDOW {
        start = end.saturating_sub(PAGE_WINDOW - 1).max(1);
    }
    shown.extend(start..=end);

    let mut items = vec![PageItem::Previous {
        enabled: current > 1,
    }];
    let mut last = 0;
    for number in shown {
        let gap = number - last;
        if gap > 2 {
            items.push(PageItem::Break);
        } else if gap == 2 {
            // A single hidden page is shown instead of a break.
            items.push(PageItem::Page {
                number: last + 1,
                current: last + 1 == current,
            });
        }
        items.push(PageItem::Page {
            number,
            current: number == current,
        });
        last = number;
    }
    items.push(PageItem::Next {
        enabled: current < total,
    });

    Some(PageControls {
        current,
        total,
        items,
    })
}

impl PageControls {
    /// The page a control leads to, if it leads anywhere else.
    pub fn select(&self, item: &PageItem) -> Option<u32> {
        match *item {
            PageItem::Previous { .. } => self.prev(),
            PageItem::Next { .. } => self.next(),
            PageItem::Page { number, .. } if number != self.current => Some(number),
            _ => None,
        }
    }

    pub fn next(&self) -> Option<u32> {
        (self.current < self.total).then(|| self.current + 1)
    }

    pub fn prev(&self) -> Option<u32> {
        (self.current > 1).then(|| self.current - 1)
    }

    /// Page numbers in display order.
    pub fn pages(&self) -> Vec<u32> {
        self.items
            .iter()
            .filter_map(|item| match item {
                PageItem::Page { number, .. } => Some(*number),
                _ => None,
            })
            .collect()
    }
}
