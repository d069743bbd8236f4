#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use agromarket_client::{
    gateway::AnnouncementGateway,
    models::{
        announcement::Announcement,
        application::{Application, ApplicationStatus, SubmitApplication},
        notification::Notification,
        page::{ListQuery, Page},
    },
    services::{cancel::CancelToken, session::Session},
    Config, Marketplace, StoreError, StoreResult,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

/// A list response held until its gate is released.
pub struct HeldList {
    gate: oneshot::Receiver<()>,
    page: Page<Announcement>,
    honor_cancel: bool,
}

/// In-memory backend that records every call.
#[derive(Default)]
pub struct ScriptedGateway {
    pub catalog: Mutex<Vec<Announcement>>,
    held_lists: Mutex<VecDeque<HeldList>>,
    pub list_queries: Mutex<Vec<ListQuery>>,
    pub details: Mutex<HashMap<String, Announcement>>,
    pub mine: Mutex<Vec<Announcement>>,
    pub applied: Mutex<Vec<Announcement>>,
    pub applications: Mutex<HashMap<String, Vec<Application>>>,
    pub favorites: Mutex<Vec<Announcement>>,
    pub notifications: Mutex<Vec<Notification>>,
    failures: Mutex<HashMap<&'static str, StoreError>>,
    gates: Mutex<HashMap<&'static str, VecDeque<oneshot::Receiver<()>>>>,
    calls: Mutex<Vec<&'static str>>,
    next_application: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_catalog(n: usize) -> Arc<Self> {
        let gateway = Self::default();
        *gateway.catalog.lock() = (0..n).map(|i| announcement(&format!("ann-{i}"), 0)).collect();
        Arc::new(gateway)
    }

    /// Queue a list response released by the returned sender.
    pub fn hold_list(&self, page: Page<Announcement>, honor_cancel: bool) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.held_lists.lock().push_back(HeldList {
            gate: rx,
            page,
            honor_cancel,
        });
        tx
    }

    /// Hold the next call of `op` until the returned sender fires.
    pub fn hold(&self, op: &'static str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().entry(op).or_default().push_back(rx);
        tx
    }

    async fn pass_gate(&self, op: &'static str) {
        let gate = self.gates.lock().get_mut(op).and_then(VecDeque::pop_front);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
    }

    /// Make every later call of `op` fail with `err`.
    pub fn fail(&self, op: &'static str, err: StoreError) {
        self.failures.lock().insert(op, err);
    }

    pub fn heal(&self, op: &'static str) {
        self.failures.lock().remove(op);
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls.lock().iter().filter(|c| **c == op).count()
    }

    fn enter(&self, op: &'static str) -> StoreResult<()> {
        self.calls.lock().push(op);
        match self.failures.lock().get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn slice<T: Clone>(all: &[T], page: u32, limit: u32) -> Page<T> {
    let start = ((page.max(1) - 1) * limit) as usize;
    let end = (start + limit as usize).min(all.len());
    let items = if start < all.len() {
        all[start..end].to_vec()
    } else {
        Vec::new()
    };
    Page::new(items, all.len() as u64, Some(page))
}

#[async_trait]
impl AnnouncementGateway for ScriptedGateway {
    async fn list_announcements(
        &self,
        query: &ListQuery,
        cancel: &CancelToken,
    ) -> StoreResult<Page<Announcement>> {
        self.enter("list")?;
        self.list_queries.lock().push(query.clone());
        let held = self.held_lists.lock().pop_front();
        match held {
            Some(HeldList {
                gate,
                page,
                honor_cancel: true,
            }) => tokio::select! {
                _ = cancel.cancelled() => Err(StoreError::Cancelled),
                _ = gate => Ok(page),
            },
            Some(HeldList { gate, page, .. }) => {
                let _ = gate.await;
                Ok(page)
            }
            None => Ok(slice(&self.catalog.lock(), query.page, query.limit)),
        }
    }

    async fn get_announcement(&self, id: &str) -> StoreResult<Announcement> {
        self.enter("get")?;
        self.details
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn my_announcements(
        &self,
        page: u32,
        limit: u32,
        _cancel: &CancelToken,
    ) -> StoreResult<Page<Announcement>> {
        self.enter("mine")?;
        Ok(slice(&self.mine.lock(), page, limit))
    }

    async fn applied_announcements(&self) -> StoreResult<Vec<Announcement>> {
        self.enter("applied")?;
        Ok(self.applied.lock().clone())
    }

    async fn record_view(&self, _id: &str) -> StoreResult<()> {
        self.enter("view")
    }

    async fn cancel_announcement(&self, _id: &str) -> StoreResult<()> {
        self.enter("cancel_announcement")
    }

    async fn submit_application(&self, req: &SubmitApplication) -> StoreResult<Application> {
        self.enter("submit")?;
        let n = self.next_application.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Application {
            id: format!("app-new-{n}"),
            announcement_id: req.announcement_id.clone(),
            status: ApplicationStatus::Pending,
            count: req.count,
            unit: req.unit.clone(),
            ..Default::default()
        })
    }

    async fn set_application_status(&self, id: &str, status: ApplicationStatus) -> StoreResult<()> {
        self.enter("status")?;
        self.pass_gate("status").await;
        for list in self.applications.lock().values_mut() {
            for app in list.iter_mut().filter(|a| a.id == id) {
                app.status = status;
            }
        }
        Ok(())
    }

    async fn applications_for(&self, announcement_id: &str) -> StoreResult<Vec<Application>> {
        self.enter("applications")?;
        self.pass_gate("applications").await;
        Ok(self
            .applications
            .lock()
            .get(announcement_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn favorite_ids(&self) -> StoreResult<Vec<String>> {
        self.enter("favorite_ids")?;
        Ok(self.favorites.lock().iter().map(|a| a.id.clone()).collect())
    }

    async fn list_favorites(
        &self,
        page: u32,
        limit: u32,
        _cancel: &CancelToken,
    ) -> StoreResult<Page<Announcement>> {
        self.enter("favorites")?;
        Ok(slice(&self.favorites.lock(), page, limit))
    }

    async fn add_favorite(&self, id: &str) -> StoreResult<()> {
        self.enter("add_favorite")?;
        self.favorites.lock().push(announcement(id, 0));
        Ok(())
    }

    async fn remove_favorite(&self, id: &str) -> StoreResult<()> {
        self.enter("remove_favorite")?;
        self.favorites.lock().retain(|a| a.id != id);
        Ok(())
    }

    async fn list_notifications(
        &self,
        page: u32,
        limit: u32,
        _cancel: &CancelToken,
    ) -> StoreResult<Page<Notification>> {
        self.enter("notifications")?;
        Ok(slice(&self.notifications.lock(), page, limit))
    }

    async fn mark_notification_read(&self, _id: &str) -> StoreResult<()> {
        self.enter("mark_read")
    }
}

pub fn announcement(id: &str, applications_count: u32) -> Announcement {
    Announcement {
        id: id.to_string(),
        applications_count,
        ..Default::default()
    }
}

pub fn application(id: &str, announcement_id: &str, user_id: &str, status: ApplicationStatus) -> Application {
    Application {
        id: id.to_string(),
        announcement_id: announcement_id.to_string(),
        user_id: user_id.to_string(),
        status,
        count: 1.0,
        ..Default::default()
    }
}

/// Stores wired against `gateway`, signed in as `user`, browse page size 8.
pub fn marketplace(gateway: Arc<ScriptedGateway>, user: &str) -> Marketplace {
    let config = Config::for_base_url("http://backend.test");
    Marketplace::new(gateway, Arc::new(Session::with_user(user)), &config)
}

/// Yield until `op` has been called `n` times.
pub async fn wait_for_calls(gateway: &ScriptedGateway, op: &str, n: usize) {
    for _ in 0..1000 {
        if gateway.count(op) >= n {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("gateway never saw {n} {op} call(s)");
}
