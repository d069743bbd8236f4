use std::{collections::HashSet, sync::Arc};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::{
    error::StoreResult,
    gateway::AnnouncementGateway,
    models::announcement::Announcement,
    services::{
        cancel::RequestSlot,
        feed::{load_page, FeedState, HasFeed},
    },
};

const CONTROLLER: &str = "favorites";

struct FavoritesState {
    ids: HashSet<String>,
    feed: FeedState<Announcement>,
    slot: RequestSlot,
}

impl HasFeed<Announcement> for FavoritesState {
    fn feed_mut(&mut self) -> &mut FeedState<Announcement> {
        &mut self.feed
    }
}

#[derive(Debug, Clone)]
pub struct FavoritesSnapshot {
    pub ids: HashSet<String>,
    pub items: Vec<Announcement>,
    pub total: u64,
    pub has_more: bool,
    pub loading: bool,
}

/// Favorite membership set plus the Favorites screen feed.
///
/// Mutations touch local state only after the backend confirms them. Two
/// rapid toggles each apply their own result, so the last response wins.
pub struct FavoritesController {
    gateway: Arc<dyn AnnouncementGateway>,
    state: Mutex<FavoritesState>,
}

impl FavoritesController {
    pub fn new(gateway: Arc<dyn AnnouncementGateway>, page_size: u32) -> Self {
        Self {
            gateway,
            state: Mutex::new(FavoritesState {
                ids: HashSet::new(),
                feed: FeedState::new(page_size),
                slot: RequestSlot::default(),
            }),
        }
    }

    pub fn snapshot(&self) -> FavoritesSnapshot {
        let st = self.state.lock();
        FavoritesSnapshot {
            ids: st.ids.clone(),
            items: st.feed.items.clone(),
            total: st.feed.total,
            has_more: st.feed.has_more,
            loading: st.feed.loading,
        }
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.state.lock().ids.contains(id)
    }

    pub async fn fetch_favorite_ids(&self) {
        match self.gateway.favorite_ids().await {
            Ok(ids) => self.state.lock().ids = ids.into_iter().collect(),
            Err(e) => warn!("Failed to load favorite ids: {}", e),
        }
    }

    pub async fn fetch_list(&self, reset: bool) {
        let (token, page, limit) = {
            let mut st = self.state.lock();
            let limit = st.feed.limit;
            if reset {
                let token = st.slot.begin_reset();
                (token, st.feed.begin_reset(false), limit)
            } else {
                match st.feed.begin_more() {
                    Some(next) => (st.slot.current(), next, limit),
                    None => return,
                }
            }
        };
        let request = self.gateway.list_favorites(page, limit, &token);
        load_page(CONTROLLER, &self.state, &token, page, reset, request).await;
    }

    pub async fn refresh(&self) {
        self.fetch_list(true).await;
    }

    pub async fn load_more(&self) {
        self.fetch_list(false).await;
    }

    pub async fn add_favorite(&self, id: &str) -> StoreResult<()> {
        self.gateway.add_favorite(id).await?;
        self.state.lock().ids.insert(id.to_string());
        info!("Added favorite {}", id);
        Ok(())
    }

    /// Remove from the set and the loaded list; `total` drops by one, floored at zero.
    pub async fn remove_favorite(&self, id: &str) -> StoreResult<()> {
        self.gateway.remove_favorite(id).await?;
        let mut st = self.state.lock();
        st.ids.remove(id);
        let remaining: Vec<Announcement> = st
            .feed
            .items
            .iter()
            .filter(|a| a.id != id)
            .cloned()
            .collect();
        st.feed.items = remaining;
        st.feed.total = st.feed.total.saturating_sub(1);
        info!("Removed favorite {}", id);
        Ok(())
    }

    /// Flip membership; returns whether `id` is now a favorite.
    pub async fn toggle(&self, id: &str) -> StoreResult<bool> {
        if self.is_favorite(id) {
            self.remove_favorite(id).await?;
            Ok(false)
        } else {
            self.add_favorite(id).await?;
            Ok(true)
        }
    }
}
