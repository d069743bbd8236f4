use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::{
    error::{StoreError, StoreResult},
    gateway::AnnouncementGateway,
    models::{
        announcement::Announcement,
        application::{
            has_pending_application, with_application_status, Application, ApplicationStatus,
            SubmitApplication,
        },
    },
    services::{session::Session, sync::CounterSync},
};

#[derive(Debug, Clone, Default)]
pub struct ApplicationsState {
    pub by_announcement_id: HashMap<String, Vec<Application>>,
    /// Announcements the current user has applied to.
    pub applied_ids: HashSet<String>,
    /// Announcements where the current user's application is still pending.
    pub pending_ids: HashSet<String>,
    /// The current user's own open application per announcement.
    pub my_applications: HashMap<String, Application>,
    /// Application with a status change in flight, so only its row is disabled.
    pub action_loading_id: Option<String>,
    pub loading_announcement_id: Option<String>,
    /// Every application with a status change in flight.
    in_flight: HashSet<String>,
}

impl ApplicationsState {
    fn find(&self, announcement_id: &str, id: &str) -> Option<&Application> {
        self.by_announcement_id
            .get(announcement_id)
            .and_then(|list| list.iter().find(|a| a.id == id))
            .or_else(|| {
                self.my_applications
                    .get(announcement_id)
                    .filter(|a| a.id == id)
            })
    }
}

/// Per-announcement application lists and the current user's applied/pending badges.
pub struct ApplicationsController {
    gateway: Arc<dyn AnnouncementGateway>,
    session: Arc<Session>,
    sync: Arc<CounterSync>,
    state: Mutex<ApplicationsState>,
}

impl ApplicationsController {
    pub fn new(
        gateway: Arc<dyn AnnouncementGateway>,
        session: Arc<Session>,
        sync: Arc<CounterSync>,
    ) -> Self {
        Self {
            gateway,
            session,
            sync,
            state: Mutex::new(ApplicationsState::default()),
        }
    }

    pub fn snapshot(&self) -> ApplicationsState {
        self.state.lock().clone()
    }

    pub fn applications_for(&self, announcement_id: &str) -> Vec<Application> {
        self.state
            .lock()
            .by_announcement_id
            .get(announcement_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_applied(&self, announcement_id: &str) -> bool {
        self.state.lock().applied_ids.contains(announcement_id)
    }

    /// Pending badge for `announcement`.
    ///
    /// An embedded application list, when the record carries one, decides on
    /// its own; otherwise the locally tracked `pending_ids` set does.
    pub fn is_pending(&self, announcement: &Announcement) -> bool {
        match &announcement.applications {
            Some(embedded) => {
                let user = self.session.user_id().unwrap_or_default();
                has_pending_application(embedded, &user)
            }
            None => self.state.lock().pending_ids.contains(&announcement.id),
        }
    }

    /// Whether the Apply action should be offered.
    pub fn can_apply(&self, announcement: &Announcement) -> bool {
        !self.session.is_current(&announcement.user_id) && !self.is_pending(announcement)
    }

    /// Load `GET /applications/announcement/{id}`. Failures leave the cached list as-is.
    pub async fn fetch_for_announcement(&self, announcement_id: &str) {
        self.state.lock().loading_announcement_id = Some(announcement_id.to_string());
        let result = self.gateway.applications_for(announcement_id).await;

        let mut st = self.state.lock();
        if st.loading_announcement_id.as_deref() == Some(announcement_id) {
            st.loading_announcement_id = None;
        }
        match result {
            Ok(list) => {
                let mine = list
                    .iter()
                    .find(|a| self.session.is_current(&a.user_id) && !a.status.is_terminal())
                    .cloned();
                if let Some(mine) = mine {
                    st.my_applications.insert(announcement_id.to_string(), mine);
                }
                st.by_announcement_id.insert(announcement_id.to_string(), list);
            }
            Err(e) => warn!("Failed to load applications for {}: {}", announcement_id, e),
        }
    }

    /// Rebuild `applied_ids` / `pending_ids` from `GET /announcements/applied`.
    pub async fn fetch_applied(&self) {
        let announcements = match self.gateway.applied_announcements().await {
            Ok(list) => list,
            Err(e) => {
                warn!("Failed to load applied announcements: {}", e);
                return;
            }
        };
        let user = self.session.user_id().unwrap_or_default();
        {
            let mut st = self.state.lock();
            let previous_pending = std::mem::take(&mut st.pending_ids);
            st.applied_ids = announcements.iter().map(|a| a.id.clone()).collect();
            st.pending_ids = announcements
                .iter()
                .filter(|a| match &a.applications {
                    Some(embedded) => has_pending_application(embedded, &user),
                    None => previous_pending.contains(&a.id),
                })
                .map(|a| a.id.clone())
                .collect();
            for a in &announcements {
                let mine = a.applications.as_ref().and_then(|embedded| {
                    embedded
                        .iter()
                        .find(|app| !user.is_empty() && app.user_id == user && !app.status.is_terminal())
                });
                if let Some(mine) = mine {
                    st.my_applications.insert(a.id.clone(), mine.clone());
                }
            }
        }
        self.sync.cache().put_many(announcements);
    }

    pub async fn approve(&self, id: &str, announcement_id: &str) -> StoreResult<()> {
        self.transition(id, announcement_id, ApplicationStatus::Approved).await
    }

    pub async fn reject(&self, id: &str, announcement_id: &str) -> StoreResult<()> {
        self.transition(id, announcement_id, ApplicationStatus::Rejected).await
    }

    /// Close an application (owner or applicant).
    ///
    /// Badges are cleared only when the application belongs to the current
    /// user; the announcement's `applications_count` drops by one either way.
    pub async fn close(&self, id: &str, announcement_id: &str) -> StoreResult<()> {
        self.transition(id, announcement_id, ApplicationStatus::Closed).await
    }

    /// Close the current user's open application on `announcement_id`.
    pub async fn close_my_application(&self, announcement_id: &str) -> StoreResult<()> {
        let id = {
            let st = self.state.lock();
            let user = self.session.user_id().unwrap_or_default();
            st.my_applications
                .get(announcement_id)
                .filter(|a| !a.status.is_terminal())
                .map(|a| a.id.clone())
                .or_else(|| {
                    st.by_announcement_id.get(announcement_id).and_then(|list| {
                        list.iter()
                            .find(|a| !user.is_empty() && a.user_id == user && !a.status.is_terminal())
                            .map(|a| a.id.clone())
                    })
                })
                .filter(|id| !id.is_empty())
        };
        let id = id.ok_or_else(|| {
            StoreError::validation(format!(
                "no open application of yours on announcement {announcement_id}"
            ))
        })?;
        self.close(&id, announcement_id).await
    }

    /// Submit, then mark the announcement applied and pending and bump its count.
    pub async fn submit_application(&self, req: SubmitApplication) -> StoreResult<Application> {
        req.validate()?;
        let user = self
            .session
            .user_id()
            .ok_or_else(|| StoreError::validation("sign in to apply"))?;

        let mut created = self.gateway.submit_application(&req).await?;
        if created.user_id.is_empty() {
            created.user_id = user;
        }
        if created.announcement_id.is_empty() {
            created.announcement_id = req.announcement_id.clone();
        }
        let announcement_id = req.announcement_id;

        {
            let mut st = self.state.lock();
            st.applied_ids.insert(announcement_id.clone());
            st.pending_ids.insert(announcement_id.clone());
            st.my_applications
                .insert(announcement_id.clone(), created.clone());
            let appended = st.by_announcement_id.get(&announcement_id).map(|list| {
                let mut next = list.clone();
                next.push(created.clone());
                next
            });
            if let Some(next) = appended {
                st.by_announcement_id.insert(announcement_id.clone(), next);
            }
        }
        info!("Submitted application {} for {}", created.id, announcement_id);
        self.sync.adjust_applications_count(&announcement_id, 1);
        Ok(created)
    }

    async fn transition(&self, id: &str, announcement_id: &str, to: ApplicationStatus) -> StoreResult<()> {
        {
            let mut st = self.state.lock();
            if st.in_flight.contains(id) {
                return Err(StoreError::validation(format!(
                    "application {id} already has a status change in flight"
                )));
            }
            // Uncached applications cannot be checked here; the backend decides.
            if let Some(current) = st.find(announcement_id, id) {
                current.status.validate_transition(to)?;
            }
            st.in_flight.insert(id.to_string());
            st.action_loading_id = Some(id.to_string());
        }

        let result = match to {
            ApplicationStatus::Approved => self.gateway.approve_application(id).await,
            ApplicationStatus::Rejected => self.gateway.reject_application(id).await,
            ApplicationStatus::Closed => self.gateway.close_application(id).await,
            other => self.gateway.set_application_status(id, other).await,
        };

        let owned = {
            let mut st = self.state.lock();
            st.in_flight.remove(id);
            if st.action_loading_id.as_deref() == Some(id) {
                st.action_loading_id = None;
            }
            result?;

            // The list may have been reloaded while the call was out.
            if let Some(current) = st.find(announcement_id, id) {
                if let Err(e) = current.status.validate_transition(to) {
                    warn!(
                        "Application {} changed to {} while moving to {}, keeping local state",
                        id, current.status, to
                    );
                    return Err(e);
                }
            }

            let owned = st
                .find(announcement_id, id)
                .map(|a| self.session.is_current(&a.user_id))
                .unwrap_or(false);

            let patched = st
                .by_announcement_id
                .get(announcement_id)
                .map(|list| with_application_status(list, id, to));
            if let Some(next) = patched {
                st.by_announcement_id
                    .insert(announcement_id.to_string(), next);
            }
            let mine = st
                .my_applications
                .get(announcement_id)
                .filter(|a| a.id == id)
                .map(|a| a.with_status(to));
            if let Some(mine) = mine {
                st.my_applications
                    .insert(announcement_id.to_string(), mine);
            }

            if owned && to == ApplicationStatus::Closed {
                st.applied_ids.remove(announcement_id);
                st.pending_ids.remove(announcement_id);
                st.my_applications.remove(announcement_id);
            }
            owned
        };

        info!(
            "Application {} on {} is now {} (own: {})",
            id, announcement_id, to, owned
        );
        if to == ApplicationStatus::Closed {
            self.sync.adjust_applications_count(announcement_id, -1);
        }
        Ok(())
    }
}
