use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    error::StoreResult,
    gateway::AnnouncementGateway,
    models::notification::Notification,
    services::{
        cancel::RequestSlot,
        feed::{load_page, FeedState, HasFeed},
    },
};

const CONTROLLER: &str = "notifications";

struct NotificationsState {
    feed: FeedState<Notification>,
    slot: RequestSlot,
}

impl HasFeed<Notification> for NotificationsState {
    fn feed_mut(&mut self) -> &mut FeedState<Notification> {
        &mut self.feed
    }
}

pub struct NotificationsController {
    gateway: Arc<dyn AnnouncementGateway>,
    state: Mutex<NotificationsState>,
}

impl NotificationsController {
    pub fn new(gateway: Arc<dyn AnnouncementGateway>, page_size: u32) -> Self {
        Self {
            gateway,
            state: Mutex::new(NotificationsState {
                feed: FeedState::new(page_size),
                slot: RequestSlot::default(),
            }),
        }
    }

    pub fn items(&self) -> Vec<Notification> {
        self.state.lock().feed.items.clone()
    }

    /// Unread among the loaded notifications.
    pub fn unread_count(&self) -> usize {
        self.state
            .lock()
            .feed
            .items
            .iter()
            .filter(|n| !n.is_read)
            .count()
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
        let request = self.gateway.list_notifications(page, limit, &token);
        load_page(CONTROLLER, &self.state, &token, page, reset, request).await;
    }

    pub async fn refresh(&self) {
        self.fetch_list(true).await;
    }

    pub async fn load_more(&self) {
        self.fetch_list(false).await;
    }

    pub async fn mark_read(&self, id: &str) -> StoreResult<()> {
        self.gateway.mark_notification_read(id).await?;
        let mut st = self.state.lock();
        let next: Vec<Notification> = st
            .feed
            .items
            .iter()
            .map(|n| {
                if n.id == id {
                    Notification {
                        is_read: true,
                        ..n.clone()
                    }
                } else {
                    n.clone()
                }
            })
            .collect();
        st.feed.items = next;
        Ok(())
    }
}
