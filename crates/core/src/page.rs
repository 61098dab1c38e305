//! Page-indexed fetch controller
//!
//! [`PageFetchController`] owns the state of one article listing screen and
//! decides when a fetch has to happen. It performs no I/O itself: every
//! state change that needs data returns a [`PageRequest`] for the caller to
//! execute, and the caller hands the outcome back through
//! [`PageFetchController::on_fetch_settled`].
//!
//! Every request carries a generation number. Only a completion for the
//! most recently issued generation is applied, so a slow response for a
//! page the user already navigated away from can never overwrite the page
//! that is currently requested.

use serde::Serialize;

use crate::article::{Article, ArticlePage};

/// Number of articles shown per page when nothing else is configured
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Errors raised by pagination input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("Page {page} is out of range. Only {page_count} pages available.")]
    OutOfRange { page: usize, page_count: usize },

    #[error("Page size must be greater than zero")]
    InvalidPageSize,
}

/// A fetch the caller has to perform: `GET /articles?page={page}&size={size}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
    pub generation: u64,
}

/// Outcome of handing a completed fetch back to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The response belonged to the latest request and is now displayed
    Applied,
    /// A newer request was issued after this one; the response was dropped
    Stale,
}

/// Listing state for the current screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageState {
    pub page: usize,
    pub page_size: usize,
    /// Most recent first
    pub items: Vec<Article>,
    pub total_count: usize,
}

impl PageState {
    pub fn page_count(&self) -> usize {
        page_count(self.total_count, self.page_size)
    }
}

/// Pagination control state derived from the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationView {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub limit: usize,
    pub has_prev: bool,
    pub has_next: bool,
    pub next_page_command: Option<String>,
    pub prev_page_command: Option<String>,
}

/// A page of articles together with its pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct ListOutput {
    pub items: Vec<Article>,
    pub pagination: PaginationView,
}

/// Number of pages needed to show `total_count` items, `page_size` at a time.
///
/// Zero items means zero pages. A zero page size also yields zero pages.
pub fn page_count(total_count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total_count.div_ceil(page_size)
}

/// Owns `page`, `page_size`, `items` and `total_count` for one listing screen
#[derive(Debug, Clone)]
pub struct PageFetchController {
    state: PageState,
    generation: u64,
    in_flight: Option<PageRequest>,
}

impl Default for PageFetchController {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PageFetchController {
    /// Create a controller on page 1. A zero `page_size` falls back to
    /// [`DEFAULT_PAGE_SIZE`].
    pub fn new(page_size: usize) -> Self {
        let page_size = if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        };

        Self {
            state: PageState {
                page: 1,
                page_size,
                items: Vec::new(),
                total_count: 0,
            },
            generation: 0,
            in_flight: None,
        }
    }

    /// Create a controller that opens directly on `page`.
    ///
    /// Used by one-shot listings where the page is known up front. Whether
    /// the page exists can only be checked once the first response has
    /// settled, see [`PageFetchController::ensure_in_range`].
    pub fn starting_at(page: usize, page_size: usize) -> Result<Self, PageError> {
        if page_size == 0 {
            return Err(PageError::InvalidPageSize);
        }
        if page == 0 {
            return Err(PageError::OutOfRange {
                page,
                page_count: 0,
            });
        }

        let mut controller = Self::new(page_size);
        controller.state.page = page;
        Ok(controller)
    }

    /// Check the current page against the settled total. Page 1 is always
    /// valid so an empty collection still renders its empty state.
    pub fn ensure_in_range(&self) -> Result<(), PageError> {
        let page_count = self.page_count();
        let page = self.state.page;
        if page > 1 && page > page_count {
            return Err(PageError::OutOfRange { page, page_count });
        }
        Ok(())
    }

    /// Issue the request for the initial page
    pub fn mount(&mut self) -> PageRequest {
        self.issue()
    }

    /// Re-issue the request for the current `(page, page_size)`
    pub fn refresh(&mut self) -> PageRequest {
        self.issue()
    }

    /// Move to page `page`.
    ///
    /// Requires `1 <= page <= page_count`. Returns `Ok(None)` when `page` is
    /// already the current page. `items` keep showing the previous page until
    /// the returned request settles.
    pub fn set_page(&mut self, page: usize) -> Result<Option<PageRequest>, PageError> {
        let page_count = self.page_count();
        if page == 0 || page > page_count {
            return Err(PageError::OutOfRange { page, page_count });
        }

        if page == self.state.page {
            return Ok(None);
        }

        self.state.page = page;
        Ok(Some(self.issue()))
    }

    pub fn next_page(&mut self) -> Result<Option<PageRequest>, PageError> {
        self.set_page(self.state.page + 1)
    }

    /// Move back one page. When the collection shrank below the current
    /// page, this goes to the last page that still exists.
    pub fn prev_page(&mut self) -> Result<Option<PageRequest>, PageError> {
        let target = self
            .prev_target()
            .unwrap_or(self.state.page.saturating_sub(1));
        self.set_page(target)
    }

    /// Change the page size. Resets to page 1.
    pub fn set_page_size(&mut self, size: usize) -> Result<Option<PageRequest>, PageError> {
        if size == 0 {
            return Err(PageError::InvalidPageSize);
        }

        if size == self.state.page_size {
            return Ok(None);
        }

        self.state.page_size = size;
        self.state.page = 1;
        Ok(Some(self.issue()))
    }

    /// Apply a completed fetch.
    ///
    /// Responses for anything but the latest issued request are dropped.
    /// Items are stored in reverse arrival order.
    pub fn on_fetch_settled(&mut self, request: PageRequest, response: ArticlePage) -> Settlement {
        if request.generation != self.generation {
            return Settlement::Stale;
        }

        let mut items = response.data;
        items.reverse();

        self.state.items = items;
        self.state.total_count = response.total_articles;
        self.in_flight = None;

        Settlement::Applied
    }

    /// Record that a request failed. State is left as last rendered.
    pub fn on_fetch_failed(&mut self, request: PageRequest) -> Settlement {
        if request.generation != self.generation {
            return Settlement::Stale;
        }

        self.in_flight = None;
        Settlement::Applied
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn page(&self) -> usize {
        self.state.page
    }

    pub fn page_size(&self) -> usize {
        self.state.page_size
    }

    pub fn items(&self) -> &[Article] {
        &self.state.items
    }

    pub fn total_count(&self) -> usize {
        self.state.total_count
    }

    pub fn page_count(&self) -> usize {
        self.state.page_count()
    }

    /// The request whose response is still awaited, if any
    pub fn in_flight(&self) -> Option<PageRequest> {
        self.in_flight
    }

    pub fn pagination(&self) -> PaginationView {
        let current_page = self.state.page;
        let total_pages = self.page_count();
        let limit = self.state.page_size;

        let has_next = current_page < total_pages;
        let prev = self.prev_target();
        let has_prev = prev.is_some();

        PaginationView {
            current_page,
            total_pages,
            total_items: self.state.total_count,
            limit,
            has_prev,
            has_next,
            next_page_command: has_next.then(|| {
                format!(
                    "dashstar articles list --page {} --size {limit}",
                    current_page + 1
                )
            }),
            prev_page_command: prev
                .map(|page| format!("dashstar articles list --page {page} --size {limit}")),
        }
    }

    pub fn output(&self) -> ListOutput {
        ListOutput {
            items: self.state.items.clone(),
            pagination: self.pagination(),
        }
    }

    /// Page that "previous" leads to: one back, clamped to the last page
    fn prev_target(&self) -> Option<usize> {
        let target = self.state.page.saturating_sub(1).min(self.page_count());
        (target >= 1).then_some(target)
    }

    fn issue(&mut self) -> PageRequest {
        self.generation += 1;
        let request = PageRequest {
            page: self.state.page,
            size: self.state.page_size,
            generation: self.generation,
        };
        self.in_flight = Some(request);
        request
    }
}
