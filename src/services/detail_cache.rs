use std::{collections::HashMap, sync::Arc};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

use crate::{
    error::StoreResult,
    gateway::AnnouncementGateway,
    models::announcement::{Announcement, AnnouncementPatch},
};

type SharedFetch = Shared<BoxFuture<'static, StoreResult<Announcement>>>;

/// Last-known full record per announcement id. Last write wins, no TTL.
pub struct DetailCache {
    gateway: Arc<dyn AnnouncementGateway>,
    entries: Arc<Mutex<HashMap<String, Announcement>>>,
    inflight: Arc<Mutex<HashMap<String, SharedFetch>>>,
}

impl DetailCache {
    pub fn new(gateway: Arc<dyn AnnouncementGateway>) -> Self {
        Self {
            gateway,
            entries: Arc::new(Mutex::new(HashMap::new())),
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn get(&self, id: &str) -> Option<Announcement> {
        self.entries.lock().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn put(&self, announcement: Announcement) {
        self.entries
            .lock()
            .insert(announcement.id.clone(), announcement);
    }

    pub fn put_many(&self, announcements: impl IntoIterator<Item = Announcement>) {
        let mut entries = self.entries.lock();
        for a in announcements {
            entries.insert(a.id.clone(), a);
        }
    }

    /// Merge `patch` into the entry, if cached. Returns the merged record.
    pub fn patch(&self, id: &str, patch: &AnnouncementPatch) -> Option<Announcement> {
        let mut entries = self.entries.lock();
        let current = entries.get(id)?;
        let next = patch.apply_to(current);
        entries.insert(id.to_string(), next.clone());
        Some(next)
    }

    /// Replace the entry with `f(entry)`. Missing entries are skipped, not fetched.
    pub fn update(&self, id: &str, f: impl Fn(&Announcement) -> Announcement) -> bool {
        let mut entries = self.entries.lock();
        match entries.get(id) {
            Some(current) => {
                let next = f(current);
                entries.insert(id.to_string(), next);
                true
            }
            None => false,
        }
    }

    /// Cached record, or a gateway fetch stored before returning.
    pub async fn fetch_by_id(&self, id: &str) -> StoreResult<Announcement> {
        if let Some(hit) = self.get(id) {
            return Ok(hit);
        }
        self.fetch_shared(id).await
    }

    /// Always go to the gateway (pull-to-refresh on a detail screen).
    pub async fn refresh_by_id(&self, id: &str) -> StoreResult<Announcement> {
        self.fetch_shared(id).await
    }

    /// Best-effort view counter; failures are only logged.
    pub async fn record_view(&self, id: &str) {
        if let Err(e) = self.gateway.record_view(id).await {
            tracing::warn!("Failed to record view for announcement {}: {}", id, e);
        }
    }

    /// Concurrent fetches for one id share a single gateway call.
    fn fetch_shared(&self, id: &str) -> SharedFetch {
        let mut inflight = self.inflight.lock();
        if let Some(existing) = inflight.get(id) {
            return existing.clone();
        }

        let gateway = self.gateway.clone();
        let entries = self.entries.clone();
        let pending = self.inflight.clone();
        let key = id.to_string();
        let fetch = async move {
            let result = gateway.get_announcement(&key).await;
            if let Ok(announcement) = &result {
                entries.lock().insert(key.clone(), announcement.clone());
            }
            pending.lock().remove(&key);
            result
        }
        .boxed()
        .shared();

        inflight.insert(id.to_string(), fetch.clone());
        fetch
    }
}
