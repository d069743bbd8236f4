//! Paginated feed state shared by every list controller.

use std::future::Future;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{
    error::StoreResult,
    models::page::{has_more, Page},
    services::{cancel::CancelToken, metrics},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedPhase {
    #[default]
    Idle,
    Loading,
    LoadingMore,
    Loaded,
    /// Loaded and `page * limit >= total`.
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct FeedState<T> {
    pub items: Vec<T>,
    /// Last accepted page; 0 before the first one lands.
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub has_more: bool,
    pub loading: bool,
    pub loading_more: bool,
    pub phase: FeedPhase,
    /// Consecutive responses dropped for reporting another page.
    stale_drops: u32,
}

/// Mismatched pages tolerated in a row before paging stops.
const MAX_STALE_DROPS: u32 = 2;

impl<T> FeedState<T> {
    pub fn new(limit: u32) -> Self {
        Self {
            items: Vec::new(),
            page: 0,
            limit: limit.max(1),
            total: 0,
            has_more: true,
            loading: false,
            loading_more: false,
            phase: FeedPhase::Idle,
            stale_drops: 0,
        }
    }

    pub fn can_load_more(&self) -> bool {
        !self.loading_more && self.has_more && !self.loading
    }

    /// Enter the reset state; returns the page to request.
    pub fn begin_reset(&mut self, clear_list: bool) -> u32 {
        if clear_list {
            self.items.clear();
            self.total = 0;
            self.page = 0;
        }
        self.loading = true;
        self.stale_drops = 0;
        // A reset supersedes any load-more in flight.
        self.loading_more = false;
        self.phase = FeedPhase::Loading;
        1
    }

    /// Enter the load-more state, or `None` when the guard refuses.
    pub fn begin_more(&mut self) -> Option<u32> {
        if !self.can_load_more() {
            return None;
        }
        self.loading_more = true;
        self.phase = FeedPhase::LoadingMore;
        Some(self.page + 1)
    }

    /// Apply a response to the request for `requested`.
    ///
    /// A response reporting a different page is dropped; only the loading
    /// flags settle, and paging stops after repeated mismatches. Returns
    /// whether the items were applied.
    pub fn accept(&mut self, requested: u32, reset: bool, page: Page<T>) -> bool {
        let returned = page.page.unwrap_or(requested);
        if returned != requested {
            self.stale_drops += 1;
            if self.stale_drops >= MAX_STALE_DROPS {
                self.fail();
            } else {
                self.settle();
            }
            return false;
        }
        self.stale_drops = 0;
        if reset {
            self.items = page.items;
        } else {
            self.items.extend(page.items);
        }
        self.page = returned;
        self.total = page.total;
        self.has_more = has_more(returned, self.limit, self.total);
        self.settle();
        true
    }

    /// Failed fetch: keep the list, stop paging.
    pub fn fail(&mut self) {
        self.has_more = false;
        self.settle();
    }

    fn settle(&mut self) {
        self.loading = false;
        self.loading_more = false;
        self.phase = if self.page == 0 && self.items.is_empty() && self.has_more {
            FeedPhase::Idle
        } else if self.has_more {
            FeedPhase::Loaded
        } else {
            FeedPhase::Exhausted
        };
    }
}

/// Controller state that owns one feed.
pub trait HasFeed<T> {
    fn feed_mut(&mut self) -> &mut FeedState<T>;
}

/// Await `request` and settle the feed, unless `token` was cancelled meanwhile.
///
/// The token is checked under the state lock so a concurrent reset cannot
/// slip between the check and the write. Errors are logged and swallowed.
/// Returns a copy of the accepted items.
pub async fn load_page<S, T, Fut>(
    controller: &'static str,
    state: &Mutex<S>,
    token: &CancelToken,
    requested: u32,
    reset: bool,
    request: Fut,
) -> Option<Vec<T>>
where
    S: HasFeed<T>,
    T: Clone,
    Fut: Future<Output = StoreResult<Page<T>>>,
{
    let result = request.await;

    let mut guard = state.lock();
    if token.is_cancelled() {
        metrics::record_dropped(controller, "cancelled");
        debug!("{} page {} superseded, dropping response", controller, requested);
        return None;
    }
    let feed = guard.feed_mut();
    match result {
        Ok(page) => {
            let items = page.items.clone();
            if feed.accept(requested, reset, page) {
                debug!(
                    "{} accepted page {} ({} items, total {})",
                    controller,
                    requested,
                    items.len(),
                    feed.total
                );
                Some(items)
            } else {
                metrics::record_dropped(controller, "stale_page");
                warn!("{} got a response for another page than {}", controller, requested);
                None
            }
        }
        Err(e) if e.is_cancelled() => {
            metrics::record_dropped(controller, "cancelled");
            None
        }
        Err(e) => {
            warn!("{} fetch failed: {}", controller, e);
            feed.fail();
            None
        }
    }
}
