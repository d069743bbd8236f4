use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub announcement_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}
