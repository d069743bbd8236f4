use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    config::Config,
    error::{StoreError, StoreResult},
    gateway::{decode, AnnouncementGateway},
    models::{
        announcement::Announcement,
        application::{Application, ApplicationStatus, SubmitApplication},
        notification::Notification,
        page::{ListQuery, Page},
    },
    services::{cancel::CancelToken, metrics},
};

/// [`AnnouncementGateway`] over the REST backend.
pub struct HttpGateway {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpGateway {
    pub fn new(config: &Config) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header("x-request-id", Uuid::new_v4().to_string());
        match &self.api_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Send and parse the body as JSON (`Value::Null` for an empty body).
    /// With a token, the request is abandoned as soon as the token fires.
    async fn send(
        &self,
        endpoint: &'static str,
        req: RequestBuilder,
        cancel: Option<&CancelToken>,
    ) -> StoreResult<Value> {
        let call = async {
            let response = req.send().await?;
            let status = response.status();
            let text = response.text().await?;
            if !status.is_success() {
                return Err(api_error(status, &text));
            }
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_str(&text)
                .map_err(|e| StoreError::Network(format!("invalid JSON from {endpoint}: {e}")))
        };

        let result = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(StoreError::Cancelled),
                r = call => r,
            },
            None => call.await,
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(StoreError::Cancelled) => "cancelled",
            Err(StoreError::Network(_)) => "network_error",
            Err(_) => "api_error",
        };
        metrics::record_request(endpoint, outcome);
        if let Err(e) = &result {
            if !e.is_cancelled() {
                tracing::warn!("{} failed: {}", endpoint, e);
            }
        }
        result
    }

    async fn fetch_page<T>(
        &self,
        endpoint: &'static str,
        path: &str,
        page: u32,
        limit: u32,
        cancel: &CancelToken,
        decode: impl Fn(&Value) -> Option<T>,
    ) -> StoreResult<Page<T>> {
        let req = self
            .request(Method::GET, path)
            .query(&[("page", page), ("limit", limit)]);
        let body = self.send(endpoint, req, Some(cancel)).await?;
        Ok(decode::decode_page(&body, decode))
    }
}

fn api_error(status: StatusCode, body: &str) -> StoreError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "error", "detail"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.to_string());
    if status == StatusCode::NOT_FOUND {
        StoreError::NotFound(message)
    } else {
        StoreError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl AnnouncementGateway for HttpGateway {
    async fn list_announcements(
        &self,
        query: &ListQuery,
        cancel: &CancelToken,
    ) -> StoreResult<Page<Announcement>> {
        let req = self
            .request(Method::GET, "/announcements")
            .query(&query.to_query_pairs());
        let body = self.send("announcements.list", req, Some(cancel)).await?;
        Ok(decode::decode_page(&body, decode::decode_announcement))
    }

    async fn get_announcement(&self, id: &str) -> StoreResult<Announcement> {
        let req = self.request(Method::GET, &format!("/announcements/{id}"));
        let body = self.send("announcements.get", req, None).await?;
        decode::decode_announcement(decode::unwrap_record(&body))
            .ok_or_else(|| StoreError::NotFound(format!("announcement {id}")))
    }

    async fn my_announcements(
        &self,
        page: u32,
        limit: u32,
        cancel: &CancelToken,
    ) -> StoreResult<Page<Announcement>> {
        self.fetch_page(
            "announcements.mine",
            "/announcements/me",
            page,
            limit,
            cancel,
            decode::decode_announcement,
        )
        .await
    }

    async fn applied_announcements(&self) -> StoreResult<Vec<Announcement>> {
        let req = self.request(Method::GET, "/announcements/applied");
        let body = self.send("announcements.applied", req, None).await?;
        Ok(decode::decode_page(&body, decode::decode_announcement).items)
    }

    async fn record_view(&self, id: &str) -> StoreResult<()> {
        let req = self.request(Method::POST, &format!("/announcements/{id}/view"));
        self.send("announcements.view", req, None).await?;
        Ok(())
    }

    async fn cancel_announcement(&self, id: &str) -> StoreResult<()> {
        let req = self.request(Method::POST, &format!("/announcements/{id}/cancel"));
        self.send("announcements.cancel", req, None).await?;
        Ok(())
    }

    async fn submit_application(&self, req: &SubmitApplication) -> StoreResult<Application> {
        let http = self.request(Method::POST, "/applications").json(req);
        let body = self.send("applications.submit", http, None).await?;
        let created = decode::decode_application(
            decode::unwrap_record(&body),
            Some(req.announcement_id.as_str()),
        );
        Ok(created.unwrap_or_else(|| {
            tracing::warn!(
                "Submit for announcement {} returned no application record",
                req.announcement_id
            );
            Application {
                announcement_id: req.announcement_id.clone(),
                status: ApplicationStatus::Pending,
                count: req.count,
                unit: req.unit.clone(),
                delivery_dates: req.delivery_dates.clone(),
                notes: req.notes.clone(),
                ..Default::default()
            }
        }))
    }

    async fn set_application_status(&self, id: &str, status: ApplicationStatus) -> StoreResult<()> {
        let req = self
            .request(Method::PATCH, &format!("/applications/{id}"))
            .json(&json!({ "status": status.to_string() }));
        self.send("applications.status", req, None).await?;
        Ok(())
    }

    async fn applications_for(&self, announcement_id: &str) -> StoreResult<Vec<Application>> {
        let req = self.request(
            Method::GET,
            &format!("/applications/announcement/{announcement_id}"),
        );
        let body = self.send("applications.by_announcement", req, None).await?;
        Ok(decode::decode_page(&body, |v| {
            decode::decode_application(v, Some(announcement_id))
        })
        .items)
    }

    async fn favorite_ids(&self) -> StoreResult<Vec<String>> {
        let req = self.request(Method::GET, "/favorites");
        let body = self.send("favorites.ids", req, None).await?;
        Ok(decode::decode_id_list(&body))
    }

    async fn list_favorites(
        &self,
        page: u32,
        limit: u32,
        cancel: &CancelToken,
    ) -> StoreResult<Page<Announcement>> {
        self.fetch_page(
            "favorites.list",
            "/favorites",
            page,
            limit,
            cancel,
            decode::decode_announcement,
        )
        .await
    }

    async fn add_favorite(&self, id: &str) -> StoreResult<()> {
        let req = self.request(Method::POST, &format!("/favorites/{id}"));
        self.send("favorites.add", req, None).await?;
        Ok(())
    }

    async fn remove_favorite(&self, id: &str) -> StoreResult<()> {
        let req = self.request(Method::DELETE, &format!("/favorites/{id}"));
        self.send("favorites.remove", req, None).await?;
        Ok(())
    }

    async fn list_notifications(
        &self,
        page: u32,
        limit: u32,
        cancel: &CancelToken,
    ) -> StoreResult<Page<Notification>> {
        self.fetch_page(
            "notifications.list",
            "/notifications",
            page,
            limit,
            cancel,
            decode::decode_notification,
        )
        .await
    }

    async fn mark_notification_read(&self, id: &str) -> StoreResult<()> {
        let req = self.request(Method::PATCH, &format!("/notifications/{id}/read"));
        self.send("notifications.read", req, None).await?;
        Ok(())
    }
}
