//! Caller-facing coordinator: fetch, merge into the store, flatten, diff.
//!
//! State sits behind a mutex that is never held across a provider call, so
//! triggers may overlap. Each fetch takes a ticket from a monotonic counter; a
//! response whose ticket is older than the last applied one is dropped.
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::config::Feed;
use crate::diff::{diff, SnapshotDiff};
use crate::model::Category;
use crate::pagination::{PageCompletion, Paginator};
use crate::provider::{CatalogData, DataProvider, FetchError};
use crate::section::SectionDescriptor;
use crate::snapshot::{IndexPath, Snapshot};
use crate::store::CatalogStore;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("{operation} failed: {source}")]
    FetchFailed {
        operation: &'static str,
        source: FetchError,
    },
}

/// Outcome of a full load or refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    Applied(SnapshotDiff),
    /// A newer response was applied first; this one was discarded.
    Stale,
}

impl Update {
    pub fn diff(&self) -> Option<&SnapshotDiff> {
        match self {
            Update::Applied(d) => Some(d),
            Update::Stale => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Appended {
        page: u32,
        /// Categories that survived name dedup.
        appended: usize,
        diff: SnapshotDiff,
    },
    /// No more pages this session. Further requests are no-ops.
    Exhausted,
    /// A page request is already in flight.
    Busy,
    Stale,
}

type Ticket = u64;

#[derive(Debug, Default)]
struct FeedState {
    store: CatalogStore,
    paginator: Paginator,
    rendered: Snapshot,
    last_issued: Ticket,
    last_applied: Ticket,
    page_ticket: Option<Ticket>,
}

impl FeedState {
    fn issue(&mut self) -> Ticket {
        self.last_issued += 1;
        self.last_issued
    }

    fn is_stale(&self, ticket: Ticket) -> bool {
        ticket < self.last_applied
    }

    /// Flatten the store and diff it against what was last handed out.
    fn render(&mut self) -> SnapshotDiff {
        let next = self.store.snapshot();
        let d = diff(&self.rendered, &next);
        self.rendered = next;
        let counts = d.change_counts();
        info!(
            sections = self.rendered.number_of_sections(),
            rows = self.rendered.total_rows(),
            sections_inserted = counts.sections_inserted,
            sections_deleted = counts.sections_deleted,
            rows_inserted = counts.rows_inserted,
            rows_deleted = counts.rows_deleted,
            "rendered snapshot"
        );
        d
    }

    fn replace_all(&mut self, data: CatalogData, recommendation_index: Option<usize>) {
        let CatalogData {
            banners,
            categories,
            recommended_items,
        } = data;
        self.store.reconcile_descriptors(&categories, recommendation_index);
        self.store.set_all(banners, categories, recommended_items);
        self.paginator.reset();
        self.page_ticket = None;
    }

    fn relayout(&mut self) {
        let categories = self.store.categories().to_vec();
        self.store.reconcile_descriptors(&categories, None);
    }
}

pub struct CatalogFeed {
    provider: Arc<dyn DataProvider>,
    settings: Feed,
    state: Mutex<FeedState>,
}

impl CatalogFeed {
    pub fn new(provider: Arc<dyn DataProvider>, settings: Feed) -> Self {
        Self {
            provider,
            settings,
            state: Mutex::new(FeedState::default()),
        }
    }

    /// Initial load. Starts a new pagination session.
    #[instrument(skip_all)]
    pub async fn load_initial(&self) -> Result<Update, FeedError> {
        let ticket = self.state.lock().await.issue();
        let result = self.provider.fetch_all().await;
        self.apply_catalog("load_initial", ticket, result).await
    }

    /// Pull to refresh. Replaces the catalog and restarts pagination, since the
    /// refreshed payload only carries the first page of categories.
    #[instrument(skip_all)]
    pub async fn reload(&self) -> Result<Update, FeedError> {
        let ticket = self.state.lock().await.issue();
        let result = self.provider.fetch_updated().await;
        self.apply_catalog("reload", ticket, result).await
    }

    async fn apply_catalog(
        &self,
        operation: &'static str,
        ticket: Ticket,
        result: Result<CatalogData, FetchError>,
    ) -> Result<Update, FeedError> {
        let mut state = self.state.lock().await;
        // superseded requests are dropped whether they succeeded or not
        if state.is_stale(ticket) {
            debug!(ticket, last_applied = state.last_applied, operation, ok = result.is_ok(), "discarding stale response");
            return Ok(Update::Stale);
        }
        let data = result.map_err(|source| {
            warn!(?source, operation, "fetch failed; keeping current catalog");
            FeedError::FetchFailed { operation, source }
        })?;
        state.replace_all(data, self.settings.recommendation_index);
        state.last_applied = ticket;
        Ok(Update::Applied(state.render()))
    }

    /// Request the next page of categories.
    #[instrument(skip_all)]
    pub async fn load_next_page(&self) -> Result<PageOutcome, FeedError> {
        let (ticket, page) = {
            let mut state = self.state.lock().await;
            if !state.paginator.has_next_page() {
                return Ok(PageOutcome::Exhausted);
            }
            let Some(page) = state.paginator.begin() else {
                debug!("page request already in flight; ignoring");
                return Ok(PageOutcome::Busy);
            };
            let ticket = state.issue();
            state.page_ticket = Some(ticket);
            (ticket, page)
        };

        let result = self.provider.fetch_page(page, self.settings.page_size).await;

        let mut state = self.state.lock().await;
        if state.page_ticket != Some(ticket) {
            debug!(page, "pagination restarted while loading; discarding page");
            return Ok(PageOutcome::Stale);
        }
        state.page_ticket = None;
        if state.is_stale(ticket) {
            state.paginator.abandon();
            debug!(page, ticket, "discarding stale page");
            return Ok(PageOutcome::Stale);
        }

        let response = match result {
            Ok(response) => response,
            Err(source) => {
                state.paginator.abandon();
                warn!(?source, page, "page fetch failed");
                return Err(FeedError::FetchFailed {
                    operation: "load_next_page",
                    source,
                });
            }
        };

        let completion = state
            .paginator
            .complete(response.categories.len(), response.has_next_page);
        match completion {
            Some(PageCompletion::Advanced { page }) => {
                let appended = state.store.append_categories(response.categories).len();
                state.relayout();
                state.last_applied = ticket;
                info!(page, appended, has_next_page = state.paginator.has_next_page(), "merged page");
                Ok(PageOutcome::Appended {
                    page,
                    appended,
                    diff: state.render(),
                })
            }
            Some(PageCompletion::Exhausted) | None => {
                info!(page, "empty page; pagination finished");
                Ok(PageOutcome::Exhausted)
            }
        }
    }

    pub async fn replace_categories(&self, categories: Vec<Category>) -> SnapshotDiff {
        let mut state = self.state.lock().await;
        state.store.replace_categories(categories);
        state.render()
    }

    /// Append categories whose names are new and lay them out after the existing ones.
    pub async fn append_categories(&self, categories: Vec<Category>) -> SnapshotDiff {
        let mut state = self.state.lock().await;
        let appended = state.store.append_categories(categories);
        debug!(appended = appended.len(), "appended categories");
        state.relayout();
        state.render()
    }

    pub async fn set_section_descriptors(&self, descriptors: Vec<SectionDescriptor>) -> SnapshotDiff {
        let mut state = self.state.lock().await;
        state.store.set_section_descriptors(descriptors);
        state.render()
    }

    pub async fn move_recommendations(&self, index: usize) -> SnapshotDiff {
        let mut state = self.state.lock().await;
        state.store.move_recommendations(index);
        state.render()
    }

    /// Whether scrolling to `last_visible` should trigger the next page.
    /// Paths outside the rendered snapshot never do.
    pub async fn should_load_more(&self, last_visible: IndexPath) -> bool {
        let state = self.state.lock().await;
        if !state.paginator.can_load() {
            return false;
        }
        state
            .rendered
            .rows_after(last_visible)
            .is_some_and(|remaining| remaining <= self.settings.prefetch_threshold)
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.state.lock().await.rendered.clone()
    }

    pub async fn paginator(&self) -> Paginator {
        self.state.lock().await.paginator.clone()
    }

    pub async fn categories(&self) -> Vec<Category> {
        self.state.lock().await.store.categories().to_vec()
    }

    pub async fn section_descriptors(&self) -> Vec<SectionDescriptor> {
        self.state.lock().await.store.section_descriptors().to_vec()
    }
}
