//! Page navigator: current page, last page and the viewport shift.

use crate::layout::Geometry;
use crate::platform::{EventBus, LayoutHost, ReaderEvent};

/// Navigation state, `0 <= current_page <= last_page` between moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageNavigator {
    current_page: usize,
    last_page: usize,
}

impl PageNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn last_page(&self) -> usize {
        self.last_page
    }

    pub fn page_count(&self) -> usize {
        self.last_page + 1
    }

    /// Target of a backward turn: one spread of `columns` pages, never below 0
    pub fn prev_target(&self, columns: u32) -> usize {
        self.current_page.saturating_sub(columns as usize)
    }

    /// Target of a forward turn: one spread of `columns` pages, never past the last page
    pub fn next_target(&self, columns: u32) -> usize {
        self.current_page
            .saturating_add(columns as usize)
            .min(self.last_page)
    }

    /// Record a newly discovered last page. Returns the page to move to when
    /// the current page now lies past the end.
    pub fn set_last_page(&mut self, last_page: usize) -> Option<usize> {
        self.last_page = last_page;
        (self.current_page > last_page).then_some(last_page)
    }

    /// Move to page `n`. Callers clamp; this shifts the viewport to
    /// `-n * page_width`, records the page and emits `PageChanged`.
    pub fn go_to_page<H: LayoutHost + ?Sized>(
        &mut self,
        page: usize,
        geometry: &Geometry,
        host: &mut H,
        events: &EventBus,
        animated: bool,
    ) {
        host.shift_viewport(geometry.offset_of_page(page), animated);
        self.current_page = page;
        log::debug!("moved to page {}", page);
        events.emit(&ReaderEvent::PageChanged { page });
    }

    /// Re-apply the current page's shift after the page width changed
    pub fn realign<H: LayoutHost + ?Sized>(&self, geometry: &Geometry, host: &mut H) {
        host.shift_viewport(geometry.offset_of_page(self.current_page), false);
    }
}
