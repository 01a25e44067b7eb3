//! Paginated post listing.
//!
//! [`PostListing`] owns the page state of one listing view. Every accepted
//! [`PostListing::load_page`] call takes a ticket from a monotonically
//! increasing sequence; a response is applied only if its ticket is still the
//! latest one issued, so a slow response for an abandoned page never
//! overwrites the page the user is looking at.
//!
//! [`PageSync`] is the re-fetch rule of the view: it depends on the requested
//! page only, and loads that page whenever a [`PageNavigator`] requests one.

use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::{PostPage, PostSummary};
use crate::error::ListingError;
use crate::ports::{PostQuery, QueryError};

/// Posts per page.
pub const DEFAULT_PAGE_SIZE: NonZeroU32 = match NonZeroU32::new(10) {
    Some(size) => size,
    None => unreachable!(),
};

/// `ceil(total_count / items_per_page)`, saturating at `u32::MAX`.
pub fn total_pages(total_count: u64, items_per_page: NonZeroU32) -> u32 {
    let pages = total_count.div_ceil(u64::from(items_per_page.get()));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub items_per_page: NonZeroU32,
}

impl Pagination {
    pub fn new(items_per_page: NonZeroU32) -> Self {
        Self {
            current_page: 1,
            total_pages: 0,
            items_per_page,
        }
    }

    /// Whether `page` may be requested. With no pages known only the current
    /// page is valid.
    pub fn accepts(&self, page: u32) -> bool {
        if page == 0 {
            return false;
        }
        if self.total_pages == 0 {
            page == self.current_page
        } else {
            page <= self.total_pages
        }
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// What happened to an accepted load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Failed,
    /// A newer request was issued before this one finished; its result was dropped.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct ListingSnapshot {
    pub pagination: Pagination,
    pub posts: Vec<PostSummary>,
    pub status: LoadStatus,
}

impl ListingSnapshot {
    /// Loaded, and the backend has no posts at all.
    pub fn is_empty(&self) -> bool {
        self.status == LoadStatus::Loaded && self.pagination.total_pages == 0
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            LoadStatus::Failed(message) => Some(message),
            _ => None,
        }
    }
}

struct ListingState {
    pagination: Pagination,
    posts: Vec<PostSummary>,
    status: LoadStatus,
    latest_ticket: u64,
}

pub struct PostListing {
    query: Arc<dyn PostQuery>,
    state: Mutex<ListingState>,
}

impl PostListing {
    pub fn new(query: Arc<dyn PostQuery>) -> Self {
        Self::with_page_size(query, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(query: Arc<dyn PostQuery>, items_per_page: NonZeroU32) -> Self {
        Self {
            query,
            state: Mutex::new(ListingState {
                pagination: Pagination::new(items_per_page),
                posts: Vec::new(),
                status: LoadStatus::Idle,
                latest_ticket: 0,
            }),
        }
    }

    pub fn snapshot(&self) -> ListingSnapshot {
        let state = self.lock();
        ListingSnapshot {
            pagination: state.pagination,
            posts: state.posts.clone(),
            status: state.status.clone(),
        }
    }

    pub fn pagination(&self) -> Pagination {
        self.lock().pagination
    }

    /// Make `page` current and fetch it.
    ///
    /// Pages outside `[1, total_pages]` are rejected without a fetch and
    /// without touching the current state.
    ///
    /// Dropping the returned future before it completes puts the previous
    /// page and status back, unless a newer request has been accepted since.
    pub async fn load_page(&self, page: u32) -> Result<LoadOutcome, ListingError> {
        let (ticket, page_size, previous) = self.begin(page)?;
        let mut in_flight = InFlight {
            listing: self,
            ticket,
            previous: Some(previous),
        };

        tracing::debug!(page, ticket, "Fetching posts");
        let result = self.query.fetch_posts(page, page_size.get()).await;

        in_flight.previous = None;
        Ok(self.finish(ticket, page, result))
    }

    /// Fetch the current page again.
    pub async fn reload(&self) -> Result<LoadOutcome, ListingError> {
        let page = self.pagination().current_page;
        self.load_page(page).await
    }

    fn begin(&self, page: u32) -> Result<(u64, NonZeroU32, (u32, LoadStatus)), ListingError> {
        let mut state = self.lock();

        if !state.pagination.accepts(page) {
            tracing::debug!(
                page,
                total_pages = state.pagination.total_pages,
                "Rejected out-of-range page"
            );
            return Err(ListingError::PageOutOfRange {
                page,
                total_pages: state.pagination.total_pages,
            });
        }

        state.latest_ticket += 1;
        let previous_page = std::mem::replace(&mut state.pagination.current_page, page);
        let previous_status = std::mem::replace(&mut state.status, LoadStatus::Loading);

        Ok((
            state.latest_ticket,
            state.pagination.items_per_page,
            (previous_page, previous_status),
        ))
    }

    fn abandon(&self, ticket: u64, page: u32, status: LoadStatus) {
        let mut state = self.lock();
        if ticket != state.latest_ticket {
            return;
        }

        tracing::debug!(ticket, page, "Load abandoned; restoring previous page");
        state.pagination.current_page = page;
        state.status = status;
    }

    fn finish(&self, ticket: u64, page: u32, result: Result<PostPage, QueryError>) -> LoadOutcome {
        let mut state = self.lock();

        if ticket != state.latest_ticket {
            tracing::debug!(
                page,
                ticket,
                latest = state.latest_ticket,
                "Discarding stale page response"
            );
            return LoadOutcome::Superseded;
        }

        match result {
            Ok(fetched) => {
                state.pagination.total_pages =
                    total_pages(fetched.total_count, state.pagination.items_per_page);
                state.posts = fetched.posts;
                state.status = LoadStatus::Loaded;
                tracing::debug!(
                    page,
                    total_count = fetched.total_count,
                    total_pages = state.pagination.total_pages,
                    "Posts loaded"
                );
                LoadOutcome::Loaded
            }
            Err(e) => {
                tracing::warn!(page, error = %e, "Failed to load posts");
                state.status = LoadStatus::Failed(e.to_string());
                LoadOutcome::Failed
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, ListingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Rolls an accepted load back when its future is dropped mid-fetch.
struct InFlight<'a> {
    listing: &'a PostListing,
    ticket: u64,
    previous: Option<(u32, LoadStatus)>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some((page, status)) = self.previous.take() {
            self.listing.abandon(self.ticket, page, status);
        }
    }
}

/// Requests pages for a [`PageSync`] to load.
#[derive(Debug)]
pub struct PageNavigator {
    requests: watch::Sender<u32>,
}

impl PageNavigator {
    /// Request `page`. Requesting the same page again fetches it again.
    pub fn go_to(&self, page: u32) {
        self.requests.send_replace(page);
    }

    pub fn requested_page(&self) -> u32 {
        *self.requests.borrow()
    }
}

/// Loads the requested page whenever the request changes, starting with the
/// initial request on mount. An in-flight load is dropped as soon as a newer
/// page is requested.
pub struct PageSync {
    listing: Arc<PostListing>,
    requests: watch::Receiver<u32>,
}

impl PageSync {
    /// Bind a navigator to `listing`, starting at its current page.
    pub fn new(listing: Arc<PostListing>) -> (PageNavigator, PageSync) {
        let initial = listing.pagination().current_page;
        let (tx, rx) = watch::channel(initial);
        (
            PageNavigator { requests: tx },
            PageSync {
                listing,
                requests: rx,
            },
        )
    }

    /// Run until the navigator is dropped.
    pub async fn run(mut self) {
        loop {
            let page = *self.requests.borrow_and_update();

            let superseded = tokio::select! {
                result = self.listing.load_page(page) => {
                    if let Err(e) = result {
                        tracing::debug!(page, error = %e, "Page request ignored");
                    }
                    false
                }
                changed = self.requests.changed() => changed.is_ok(),
            };

            if superseded {
                tracing::debug!(page, "Page request superseded");
                continue;
            }

            if self.requests.changed().await.is_err() {
                break;
            }
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
