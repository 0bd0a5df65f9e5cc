//! Incremental reveal over a sorted result set.

use tracing::debug;

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationState {
    Idle,
    /// A "more" request is in flight; further requests are ignored.
    Revealing,
    /// Everything is visible and a further request was refused.
    Exhausted,
}

/// Grows a visible prefix of `total` results one page at a time.
///
/// Requests are two-phase (`begin_request` then `complete_request`) so that
/// duplicate triggers arriving while a reveal is in flight are dropped.
/// `request_more` runs both phases at once.
#[derive(Debug, Clone)]
pub struct PaginationController {
    page_size: usize,
    total: usize,
    visible_count: usize,
    state: PaginationState,
}

impl PaginationController {
    pub fn new(total: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let mut controller = Self {
            page_size,
            total,
            visible_count: 0,
            state: PaginationState::Idle,
        };
        controller.reset(total);
        controller
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    pub fn has_more(&self) -> bool {
        self.visible_count < self.total
    }

    /// Start a reveal. Returns false if one is already in flight or there is
    /// nothing left to show.
    pub fn begin_request(&mut self) -> bool {
        match self.state {
            PaginationState::Revealing => {
                debug!("Reveal already in flight, ignoring request");
                false
            }
            PaginationState::Exhausted => false,
            PaginationState::Idle => {
                if self.has_more() {
                    self.state = PaginationState::Revealing;
                    true
                } else {
                    self.state = PaginationState::Exhausted;
                    false
                }
            }
        }
    }

    /// Finish an in-flight reveal and return the new visible count. A no-op
    /// outside `Revealing`.
    pub fn complete_request(&mut self) -> usize {
        if self.state != PaginationState::Revealing {
            return self.visible_count;
        }
        self.visible_count = self
            .visible_count
            .saturating_add(self.page_size)
            .min(self.total);
        self.state = PaginationState::Idle;
        debug!(
            visible = self.visible_count,
            total = self.total,
            "Revealed next page"
        );
        self.visible_count
    }

    /// Reveal one more page. Returns true if the visible count grew.
    pub fn request_more(&mut self) -> bool {
        if !self.begin_request() {
            return false;
        }
        let before = self.visible_count;
        self.complete_request() > before
    }

    /// Back to the first page for a new result total.
    pub fn reset(&mut self, total: usize) {
        self.total = total;
        self.visible_count = self.page_size.min(total);
        self.state = if self.has_more() {
            PaginationState::Idle
        } else {
            PaginationState::Exhausted
        };
    }

    /// The currently visible prefix of `items`.
    pub fn visible<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[..self.visible_count.min(items.len())]
    }
}
