use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Closed,
    /// Status string the client does not recognise.
    Unknown,
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Closed => "closed",
            ApplicationStatus::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

impl ApplicationStatus {
    /// Lenient parse: trims, ignores case, and folds the backend's aliases.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => ApplicationStatus::Pending,
            "approved" | "accepted" => ApplicationStatus::Approved,
            "rejected" | "declined" => ApplicationStatus::Rejected,
            "closed" | "cancelled" | "canceled" => ApplicationStatus::Closed,
            _ => ApplicationStatus::Unknown,
        }
    }

    /// No transition leaves a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Rejected | ApplicationStatus::Closed)
    }

    /// pending -> {approved, rejected, closed}; approved -> {closed}.
    pub fn can_transition_to(&self, to: ApplicationStatus) -> bool {
        match (self, to) {
            (ApplicationStatus::Pending, ApplicationStatus::Approved)
            | (ApplicationStatus::Pending, ApplicationStatus::Rejected)
            | (ApplicationStatus::Pending, ApplicationStatus::Closed)
            | (ApplicationStatus::Approved, ApplicationStatus::Closed) => true,
            // The backend owns statuses we cannot read; let it decide.
            (ApplicationStatus::Unknown, _) => to != ApplicationStatus::Unknown,
            _ => false,
        }
    }

    pub fn validate_transition(&self, to: ApplicationStatus) -> StoreResult<()> {
        if self.can_transition_to(to) {
            Ok(())
        } else {
            Err(StoreError::InvalidTransition { from: *self, to })
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Application {
    pub id: String,
    pub announcement_id: String,
    /// The applicant.
    pub user_id: String,
    pub status: ApplicationStatus,
    pub count: f64,
    pub unit: String,
    pub delivery_dates: Vec<NaiveDate>,
    pub notes: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Application {
    pub fn is_pending_for(&self, user_id: &str) -> bool {
        !user_id.is_empty()
            && self.user_id == user_id
            && self.status == ApplicationStatus::Pending
    }

    pub fn with_status(&self, status: ApplicationStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

/// True when `user_id` has a pending application among `applications`.
pub fn has_pending_application(applications: &[Application], user_id: &str) -> bool {
    applications.iter().any(|a| a.is_pending_for(user_id))
}

/// Copy of `applications` with the entry `id` set to `status`.
pub fn with_application_status(
    applications: &[Application],
    id: &str,
    status: ApplicationStatus,
) -> Vec<Application> {
    applications
        .iter()
        .map(|a| if a.id == id { a.with_status(status) } else { a.clone() })
        .collect()
}

/// Body of `POST /applications`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SubmitApplication {
    pub announcement_id: String,
    pub count: f64,
    pub unit: String,
    pub delivery_dates: Vec<NaiveDate>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

impl SubmitApplication {
    pub fn validate(&self) -> StoreResult<()> {
        if self.announcement_id.trim().is_empty() {
            return Err(StoreError::validation("announcement_id is required"));
        }
        if !self.count.is_finite() || self.count <= 0.0 {
            return Err(StoreError::validation("count must be greater than zero"));
        }
        if self.delivery_dates.windows(2).any(|w| w[0] > w[1]) {
            return Err(StoreError::validation(
                "delivery dates must be in chronological order",
            ));
        }
        Ok(())
    }
}
