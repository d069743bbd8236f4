use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::{
    error::StoreResult,
    gateway::AnnouncementGateway,
    models::announcement::{map_by_id, Announcement, AnnouncementStatus},
    services::{
        cancel::RequestSlot,
        feed::{load_page, FeedState, HasFeed},
        sync::CounterSync,
    },
};

const CONTROLLER: &str = "my_announcements";

struct MyAnnouncementsState {
    feed: FeedState<Announcement>,
    slot: RequestSlot,
}

impl HasFeed<Announcement> for MyAnnouncementsState {
    fn feed_mut(&mut self) -> &mut FeedState<Announcement> {
        &mut self.feed
    }
}

/// The owner's own listings (`GET /announcements/me`).
pub struct MyAnnouncementsController {
    gateway: Arc<dyn AnnouncementGateway>,
    sync: Arc<CounterSync>,
    state: Mutex<MyAnnouncementsState>,
}

impl MyAnnouncementsController {
    pub fn new(gateway: Arc<dyn AnnouncementGateway>, sync: Arc<CounterSync>, page_size: u32) -> Self {
        Self {
            gateway,
            sync,
            state: Mutex::new(MyAnnouncementsState {
                feed: FeedState::new(page_size),
                slot: RequestSlot::default(),
            }),
        }
    }

    pub fn items(&self) -> Vec<Announcement> {
        self.state.lock().feed.items.clone()
    }

    pub fn has_more(&self) -> bool {
        self.state.lock().feed.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().feed.loading
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
        let request = self.gateway.my_announcements(page, limit, &token);
        if let Some(items) = load_page(CONTROLLER, &self.state, &token, page, reset, request).await {
            self.sync.cache().put_many(items);
        }
    }

    pub async fn refresh(&self) {
        self.fetch_list(true).await;
    }

    pub async fn load_more(&self) {
        self.fetch_list(false).await;
    }

    /// Cancel a listing, then mark it cancelled here, in the detail cache and in the browse list.
    pub async fn cancel_announcement(&self, id: &str) -> StoreResult<()> {
        self.gateway.cancel_announcement(id).await?;
        {
            let mut st = self.state.lock();
            if let Some(next) = map_by_id(&st.feed.items, id, |a| {
                a.with_status(AnnouncementStatus::Cancelled)
            }) {
                st.feed.items = next;
            }
        }
        self.sync.apply_status(id, AnnouncementStatus::Cancelled);
        info!("Cancelled announcement {}", id);
        Ok(())
    }
}
