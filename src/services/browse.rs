use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::{
    error::StoreResult,
    gateway::AnnouncementGateway,
    models::{
        announcement::{map_by_id, Announcement, AnnouncementCategory},
        filter::FilterSpec,
        page::ListQuery,
    },
    services::{
        cancel::RequestSlot,
        detail_cache::DetailCache,
        feed::{load_page, FeedPhase, FeedState, HasFeed},
    },
};

const CONTROLLER: &str = "browse";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowseTab {
    #[default]
    All,
    Goods,
    Service,
    Rent,
}

impl BrowseTab {
    pub fn category(&self) -> Option<AnnouncementCategory> {
        match self {
            BrowseTab::All => None,
            BrowseTab::Goods => Some(AnnouncementCategory::Goods),
            BrowseTab::Service => Some(AnnouncementCategory::Service),
            BrowseTab::Rent => Some(AnnouncementCategory::Rent),
        }
    }
}

struct BrowseState {
    tab: BrowseTab,
    filters: FilterSpec,
    feed: FeedState<Announcement>,
    slot: RequestSlot,
}

impl HasFeed<Announcement> for BrowseState {
    fn feed_mut(&mut self) -> &mut FeedState<Announcement> {
        &mut self.feed
    }
}

/// Read-only view handed to screens.
#[derive(Debug, Clone)]
pub struct BrowseSnapshot {
    pub tab: BrowseTab,
    pub filters: FilterSpec,
    pub items: Vec<Announcement>,
    pub page: u32,
    pub total: u64,
    pub has_more: bool,
    pub loading: bool,
    pub loading_more: bool,
    pub phase: FeedPhase,
}

/// Tab- and filter-scoped announcement feed.
///
/// Only the most recent reset may land: every reset cancels the previous
/// token before issuing its request. There is no sequence fencing beyond that.
pub struct BrowseListController {
    gateway: Arc<dyn AnnouncementGateway>,
    cache: Arc<DetailCache>,
    state: Mutex<BrowseState>,
}

impl BrowseListController {
    pub fn new(gateway: Arc<dyn AnnouncementGateway>, cache: Arc<DetailCache>, page_size: u32) -> Self {
        Self {
            gateway,
            cache,
            state: Mutex::new(BrowseState {
                tab: BrowseTab::default(),
                filters: FilterSpec::default(),
                feed: FeedState::new(page_size),
                slot: RequestSlot::default(),
            }),
        }
    }

    pub fn snapshot(&self) -> BrowseSnapshot {
        let st = self.state.lock();
        BrowseSnapshot {
            tab: st.tab,
            filters: st.filters.clone(),
            items: st.feed.items.clone(),
            page: st.feed.page,
            total: st.feed.total,
            has_more: st.feed.has_more,
            loading: st.feed.loading,
            loading_more: st.feed.loading_more,
            phase: st.feed.phase,
        }
    }

    /// Switch tab: clears filters and the visible list, then refetches page 1.
    pub async fn set_active_tab(&self, tab: BrowseTab) {
        {
            let mut st = self.state.lock();
            if st.tab == tab {
                return;
            }
            st.tab = tab;
            st.filters = FilterSpec::default();
        }
        info!("Browse tab switched to {:?}", tab);
        self.fetch_list(true, true).await;
    }

    /// Replace the filter. Refetches unless both old and new filters are empty.
    pub async fn set_filters(&self, filters: FilterSpec) -> StoreResult<()> {
        filters.validate()?;
        let changed = {
            let mut st = self.state.lock();
            let both_empty = st.filters.is_empty() && filters.is_empty();
            st.filters = filters;
            !both_empty
        };
        if changed {
            self.fetch_list(true, false).await;
        }
        Ok(())
    }

    /// Pull-to-refresh.
    pub async fn refresh(&self) {
        self.fetch_list(true, false).await;
    }

    pub async fn load_more(&self) {
        self.fetch_list(false, false).await;
    }

    /// Fetch page 1 (`reset`) or the next page. Errors are swallowed into `has_more = false`.
    pub async fn fetch_list(&self, reset: bool, clear_list: bool) {
        let (token, query) = {
            let mut st = self.state.lock();
            let (token, requested) = if reset {
                let token = st.slot.begin_reset();
                (token, st.feed.begin_reset(clear_list))
            } else {
                match st.feed.begin_more() {
                    Some(next) => (st.slot.current(), next),
                    None => return,
                }
            };
            let query = ListQuery {
                page: requested,
                limit: st.feed.limit,
                category: st.tab.category(),
                filter: st.filters.clone(),
            };
            (token, query)
        };

        let request = self.gateway.list_announcements(&query, &token);
        if let Some(items) = load_page(CONTROLLER, &self.state, &token, query.page, reset, request).await {
            self.cache.put_many(items);
        }
    }

    /// Map `f` over the listed entry with `id`. Returns false when it is not listed.
    pub fn patch_entry(&self, id: &str, f: impl Fn(&Announcement) -> Announcement) -> bool {
        let mut st = self.state.lock();
        match map_by_id(&st.feed.items, id, f) {
            Some(next) => {
                st.feed.items = next;
                true
            }
            None => false,
        }
    }
}
