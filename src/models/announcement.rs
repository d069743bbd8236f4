use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::application::Application;

/// Domain type of a listing. Distinct from the transaction `kind` (sell/buy/rent).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AnnouncementCategory {
    Goods,
    Service,
    Rent,
}

impl std::fmt::Display for AnnouncementCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AnnouncementCategory::Goods => "goods",
            AnnouncementCategory::Service => "service",
            AnnouncementCategory::Rent => "rent",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for AnnouncementCategory {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "goods" => Ok(AnnouncementCategory::Goods),
            "service" | "services" => Ok(AnnouncementCategory::Service),
            "rent" => Ok(AnnouncementCategory::Rent),
            _ => Err(anyhow::anyhow!("Unknown announcement category: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnnouncementStatus {
    #[default]
    Published,
    Active,
    Completed,
    Cancelled,
}

impl std::fmt::Display for AnnouncementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AnnouncementStatus::Published => "published",
            AnnouncementStatus::Active => "active",
            AnnouncementStatus::Completed => "completed",
            AnnouncementStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for AnnouncementStatus {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "published" => Ok(AnnouncementStatus::Published),
            "active" => Ok(AnnouncementStatus::Active),
            "completed" => Ok(AnnouncementStatus::Completed),
            "cancelled" | "canceled" => Ok(AnnouncementStatus::Cancelled),
            _ => Err(anyhow::anyhow!("Unknown announcement status: {s}")),
        }
    }
}

/// Name in each supported locale. Empty strings mean "not provided".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LocalizedText {
    pub uz: String,
    pub ru: String,
    pub en: String,
}

impl LocalizedText {
    pub fn uniform(value: &str) -> Self {
        Self {
            uz: value.to_string(),
            ru: value.to_string(),
            en: value.to_string(),
        }
    }

    /// Text for `locale`, falling back to any non-empty translation.
    pub fn get(&self, locale: &str) -> &str {
        let preferred = match locale {
            "ru" => &self.ru,
            "en" => &self.en,
            _ => &self.uz,
        };
        if !preferred.is_empty() {
            return preferred;
        }
        [&self.uz, &self.ru, &self.en]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Announcement {
    pub id: String,
    /// Transaction type as sent by the backend (sell / buy / rent).
    pub kind: String,
    pub category: Option<AnnouncementCategory>,
    pub status: AnnouncementStatus,
    pub user_id: String,
    pub name: LocalizedText,
    pub price: f64,
    pub unit: String,
    pub available_quantity: f64,
    /// Advisory counter kept in sync locally; never authoritative.
    pub applications_count: u32,
    pub regions: Vec<String>,
    pub villages: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub date_to: Option<NaiveDate>,
    /// Present only when the backend embeds the application list.
    pub applications: Option<Vec<Application>>,
}

impl Announcement {
    /// Copy with `applications_count` shifted by `delta`, floored at zero.
    pub fn with_applications_delta(&self, delta: i64) -> Self {
        let next = (i64::from(self.applications_count) + delta).clamp(0, i64::from(u32::MAX));
        Self {
            applications_count: next as u32,
            ..self.clone()
        }
    }

    pub fn with_status(&self, status: AnnouncementStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

/// Partial update merged into a cached announcement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnouncementPatch {
    pub status: Option<AnnouncementStatus>,
    pub applications_count: Option<u32>,
    pub price: Option<f64>,
    pub available_quantity: Option<f64>,
}

impl AnnouncementPatch {
    pub fn apply_to(&self, current: &Announcement) -> Announcement {
        let mut next = current.clone();
        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(count) = self.applications_count {
            next.applications_count = count;
        }
        if let Some(price) = self.price {
            next.price = price;
        }
        if let Some(quantity) = self.available_quantity {
            next.available_quantity = quantity;
        }
        next
    }
}

/// Map `f` over the entry with `id`, leaving every other entry untouched.
///
/// Returns `None` when no entry has that id so callers can skip the write.
pub fn map_by_id(
    items: &[Announcement],
    id: &str,
    f: impl Fn(&Announcement) -> Announcement,
) -> Option<Vec<Announcement>> {
    if !items.iter().any(|a| a.id == id) {
        return None;
    }
    Some(
        items
            .iter()
            .map(|a| if a.id == id { f(a) } else { a.clone() })
            .collect(),
    )
}
