//! Remote collaborator seam. Controllers only see [`AnnouncementGateway`].

pub mod decode;
pub mod http;

use async_trait::async_trait;

use crate::{
    error::StoreResult,
    models::{
        announcement::Announcement,
        application::{Application, ApplicationStatus, SubmitApplication},
        notification::Notification,
        page::{ListQuery, Page},
    },
    services::cancel::CancelToken,
};

pub use http::HttpGateway;

/// Backend operations consumed by the stores.
///
/// List calls take the controller's [`CancelToken`]; an implementation may
/// resolve early with `StoreError::Cancelled` once it fires, but controllers
/// re-check the token after every await regardless.
#[async_trait]
pub trait AnnouncementGateway: Send + Sync {
    /// `GET /announcements`
    async fn list_announcements(
        &self,
        query: &ListQuery,
        cancel: &CancelToken,
    ) -> StoreResult<Page<Announcement>>;

    /// `GET /announcements/{id}`
    async fn get_announcement(&self, id: &str) -> StoreResult<Announcement>;

    /// `GET /announcements/me`
    async fn my_announcements(
        &self,
        page: u32,
        limit: u32,
        cancel: &CancelToken,
    ) -> StoreResult<Page<Announcement>>;

    /// `GET /announcements/applied`
    async fn applied_announcements(&self) -> StoreResult<Vec<Announcement>>;

    /// `POST /announcements/{id}/view`
    async fn record_view(&self, id: &str) -> StoreResult<()>;

    /// `POST /announcements/{id}/cancel`
    async fn cancel_announcement(&self, id: &str) -> StoreResult<()>;

    /// `POST /applications`
    async fn submit_application(&self, req: &SubmitApplication) -> StoreResult<Application>;

    /// `PATCH /applications/{id}` with the target status.
    async fn set_application_status(&self, id: &str, status: ApplicationStatus) -> StoreResult<()>;

    /// `GET /applications/announcement/{id}`
    async fn applications_for(&self, announcement_id: &str) -> StoreResult<Vec<Application>>;

    /// `GET /favorites`, ids only.
    async fn favorite_ids(&self) -> StoreResult<Vec<String>>;

    /// `GET /favorites`, paginated rows.
    async fn list_favorites(
        &self,
        page: u32,
        limit: u32,
        cancel: &CancelToken,
    ) -> StoreResult<Page<Announcement>>;

    /// `POST /favorites/{id}`
    async fn add_favorite(&self, id: &str) -> StoreResult<()>;

    /// `DELETE /favorites/{id}`
    async fn remove_favorite(&self, id: &str) -> StoreResult<()>;

    /// `GET /notifications`
    async fn list_notifications(
        &self,
        page: u32,
        limit: u32,
        cancel: &CancelToken,
    ) -> StoreResult<Page<Notification>>;

    /// `PATCH /notifications/{id}/read`
    async fn mark_notification_read(&self, id: &str) -> StoreResult<()>;

    async fn approve_application(&self, id: &str) -> StoreResult<()> {
        self.set_application_status(id, ApplicationStatus::Approved).await
    }

    async fn reject_application(&self, id: &str) -> StoreResult<()> {
        self.set_application_status(id, ApplicationStatus::Rejected).await
    }

    async fn close_application(&self, id: &str) -> StoreResult<()> {
        self.set_application_status(id, ApplicationStatus::Closed).await
    }
}
