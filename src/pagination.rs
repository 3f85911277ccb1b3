//! Page-request state machine: `Idle -> Loading -> Idle`.
//!
//! `Loading` is the only guard against duplicate page fetches. Requests made
//! while loading, or after the last page, are ignored rather than queued.
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum PageState {
    Idle,
    Loading { page: u32 },
}

impl PageState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageState::Idle => "idle",
            PageState::Loading { .. } => "loading",
        }
    }
}

/// Result of finishing a successful page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCompletion {
    Advanced { page: u32 },
    /// Empty page: no further requests this session.
    Exhausted,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Paginator {
    current_page: u32,
    has_next_page: bool,
    state: PageState,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new()
    }
}

impl Paginator {
    pub fn new() -> Self {
        Self {
            current_page: 1,
            has_next_page: true,
            state: PageState::Idle,
        }
    }

    /// Last page merged into the store. The initial load counts as page 1.
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn has_next_page(&self) -> bool {
        self.has_next_page
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, PageState::Loading { .. })
    }

    pub fn can_load(&self) -> bool {
        self.state == PageState::Idle && self.has_next_page
    }

    /// Enter `Loading` and return the page to request, or `None` if a request
    /// is in flight or there is nothing left to load.
    pub fn begin(&mut self) -> Option<u32> {
        if !self.can_load() {
            return None;
        }
        let page = self.current_page + 1;
        self.state = PageState::Loading { page };
        Some(page)
    }

    /// Finish the in-flight request with `fetched` categories. An empty page is
    /// terminal whatever `has_next_page` claims.
    pub fn complete(&mut self, fetched: usize, has_next_page: bool) -> Option<PageCompletion> {
        let PageState::Loading { page } = self.state else {
            return None;
        };
        self.state = PageState::Idle;
        if fetched == 0 {
            self.has_next_page = false;
            return Some(PageCompletion::Exhausted);
        }
        self.current_page = page;
        self.has_next_page = has_next_page;
        Some(PageCompletion::Advanced { page })
    }

    /// Leave `Loading` without touching the page cursor (failed or superseded request).
    pub fn abandon(&mut self) {
        self.state = PageState::Idle;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
