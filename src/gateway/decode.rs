//! Normalization of backend payloads into canonical records.
//!
//! The backend is inconsistent about envelopes, casing and number encoding,
//! so every field is read through an ordered list of candidate keys and falls
//! back to an empty/zero default instead of failing. Only a record without an
//! id is dropped, since nothing downstream can key it.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::models::{
    announcement::{Announcement, AnnouncementCategory, AnnouncementStatus, LocalizedText},
    application::{Application, ApplicationStatus},
    notification::Notification,
    page::Page,
};

/// Envelope keys tried in order before treating the body as a bare array.
const ENVELOPE_KEYS: [&str; 4] = ["data", "results", "items", "announcements"];

/// The record array of a list response, or an empty slice.
pub fn extract_items(body: &Value) -> &[Value] {
    if let Value::Array(items) = body {
        return items;
    }
    for key in ENVELOPE_KEYS {
        match body.get(key) {
            Some(Value::Array(items)) => return items,
            // `{ data: { items: [...] } }`
            Some(nested @ Value::Object(_)) => {
                let inner = extract_items(nested);
                if !inner.is_empty() {
                    return inner;
                }
            }
            _ => {}
        }
    }
    &[]
}

fn meta_value<'a>(body: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    for container in [Some(body), body.get("meta"), body.get("pagination"), body.get("data")]
        .into_iter()
        .flatten()
    {
        if let Some(v) = keys.iter().find_map(|k| container.get(*k)) {
            if !v.is_null() {
                return Some(v);
            }
        }
    }
    None
}

pub fn extract_total(body: &Value, fallback: usize) -> u64 {
    meta_value(body, &["total", "count", "total_count", "totalCount"])
        .and_then(as_u64)
        .unwrap_or(fallback as u64)
}

pub fn extract_page(body: &Value) -> Option<u32> {
    meta_value(body, &["page", "current_page", "currentPage"])
        .and_then(as_u64)
        .and_then(|p| u32::try_from(p).ok())
}

/// Decode a list response, skipping records that cannot be keyed.
pub fn decode_page<T>(body: &Value, decode: impl Fn(&Value) -> Option<T>) -> Page<T> {
    let raw = extract_items(body);
    let mut items = Vec::with_capacity(raw.len());
    for record in raw {
        match decode(record) {
            Some(item) => items.push(item),
            None => tracing::warn!("Skipping malformed record in list response"),
        }
    }
    let total = extract_total(body, items.len());
    Page::new(items, total, extract_page(body))
}

/// Single-record responses are sometimes wrapped in `data`.
pub fn unwrap_record(body: &Value) -> &Value {
    match body.get("data") {
        Some(inner @ Value::Object(_)) => inner,
        _ => body,
    }
}

pub fn decode_announcement(value: &Value) -> Option<Announcement> {
    // Favorites rows wrap the listing.
    if let Some(inner @ Value::Object(_)) = value.get("announcement") {
        if value.get("title").is_none() && value.get("name").is_none() {
            return decode_announcement(inner);
        }
    }
    if !value.is_object() {
        return None;
    }
    let id = string_field(value, &["id", "_id", "announcement_id"])?;

    let kind = string_field(value, &["type", "transaction_type"]).unwrap_or_default();
    let category = string_field(value, &["category"])
        .or_else(|| (!kind.is_empty()).then(|| kind.clone()))
        .and_then(|c| c.parse::<AnnouncementCategory>().ok());

    let status = string_field(value, &["status"])
        .and_then(|s| s.parse::<AnnouncementStatus>().ok())
        .unwrap_or_default();

    let applications = match value.get("applications") {
        Some(Value::Array(raw)) => Some(
            raw.iter()
                .filter_map(|a| decode_application(a, Some(id.as_str())))
                .collect::<Vec<_>>(),
        ),
        _ => None,
    };

    let applications_count = ["applications_count", "applicationsCount"]
        .iter()
        .find_map(|k| value.get(*k).and_then(as_u64))
        .or_else(|| match value.get("applications") {
            Some(Value::Array(raw)) => Some(raw.len() as u64),
            _ => None,
        })
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(0);

    Some(Announcement {
        kind,
        category,
        status,
        user_id: string_field(value, &["user_id", "userId", "owner_id"])
            .or_else(|| value.get("user").and_then(|u| string_field(u, &["id"])))
            .unwrap_or_default(),
        name: localized(value),
        price: number_field(value, &["price"]).unwrap_or(0.0),
        unit: string_field(value, &["unit", "unit_name"]).unwrap_or_default(),
        available_quantity: number_field(value, &["available_quantity", "availableQuantity", "quantity"])
            .unwrap_or(0.0),
        applications_count,
        regions: id_list(value, &["regions", "region_ids"], &["region_id", "region"]),
        villages: id_list(value, &["villages", "village_ids"], &["village_id", "village"]),
        created_at: string_field(value, &["created_at", "createdAt"]).and_then(|s| parse_datetime(&s)),
        date_to: string_field(value, &["date_to", "dateTo"]).and_then(|s| parse_date(&s)),
        applications,
        id,
    })
}

/// `fallback_announcement_id` fills in the foreign key for embedded lists.
pub fn decode_application(value: &Value, fallback_announcement_id: Option<&str>) -> Option<Application> {
    if !value.is_object() {
        return None;
    }
    let id = string_field(value, &["id", "_id"])?;
    let announcement_id = string_field(value, &["announcement_id", "announcementId"])
        .or_else(|| value.get("announcement").and_then(|a| string_field(a, &["id"])))
        .or_else(|| fallback_announcement_id.map(str::to_string))
        .unwrap_or_default();
    let user_id = string_field(value, &["applicant_id", "user_id", "userId"])
        .or_else(|| value.get("user").and_then(|u| string_field(u, &["id"])))
        .unwrap_or_default();
    let status = string_field(value, &["status"])
        .map(|s| ApplicationStatus::parse_lenient(&s))
        .unwrap_or(ApplicationStatus::Unknown);

    let delivery_dates = match value.get("delivery_dates") {
        Some(Value::Array(raw)) => raw
            .iter()
            .filter_map(|d| d.as_str().and_then(parse_date))
            .collect(),
        _ => string_field(value, &["delivery_date"])
            .and_then(|s| parse_date(&s))
            .into_iter()
            .collect(),
    };

    Some(Application {
        id,
        announcement_id,
        user_id,
        status,
        count: number_field(value, &["count", "quantity"]).unwrap_or(0.0),
        unit: string_field(value, &["unit"]).unwrap_or_default(),
        delivery_dates,
        notes: string_field(value, &["notes", "comment"]).unwrap_or_default(),
        created_at: string_field(value, &["created_at", "createdAt"]).and_then(|s| parse_datetime(&s)),
        updated_at: string_field(value, &["updated_at", "updatedAt"]).and_then(|s| parse_datetime(&s)),
    })
}

pub fn decode_notification(value: &Value) -> Option<Notification> {
    if !value.is_object() {
        return None;
    }
    Some(Notification {
        id: string_field(value, &["id", "_id"])?,
        title: string_field(value, &["title"]).unwrap_or_default(),
        body: string_field(value, &["body", "message", "text"]).unwrap_or_default(),
        is_read: value
            .get("is_read")
            .or_else(|| value.get("isRead"))
            .or_else(|| value.get("read"))
            .and_then(Value::as_bool)
            .unwrap_or(false),
        announcement_id: string_field(value, &["announcement_id", "announcementId"]),
        created_at: string_field(value, &["created_at", "createdAt"]).and_then(|s| parse_datetime(&s)),
    })
}

/// Favorite ids from either full rows or bare ids.
pub fn decode_id_list(body: &Value) -> Vec<String> {
    extract_items(body)
        .iter()
        .filter_map(|v| match v {
            Value::Object(_) => string_field(v, &["announcement_id", "announcementId"])
                .or_else(|| v.get("announcement").and_then(|a| string_field(a, &["id"])))
                .or_else(|| string_field(v, &["id"])),
            other => scalar_to_string(other),
        })
        .collect()
}

fn localized(value: &Value) -> LocalizedText {
    let flat = LocalizedText {
        uz: string_field(value, &["name_uz", "title_uz"]).unwrap_or_default(),
        ru: string_field(value, &["name_ru", "title_ru"]).unwrap_or_default(),
        en: string_field(value, &["name_en", "title_en"]).unwrap_or_default(),
    };
    if !(flat.uz.is_empty() && flat.ru.is_empty() && flat.en.is_empty()) {
        return flat;
    }
    for key in ["name", "title"] {
        match value.get(key) {
            Some(obj @ Value::Object(_)) => {
                return LocalizedText {
                    uz: string_field(obj, &["uz"]).unwrap_or_default(),
                    ru: string_field(obj, &["ru"]).unwrap_or_default(),
                    en: string_field(obj, &["en"]).unwrap_or_default(),
                };
            }
            Some(Value::String(s)) if !s.is_empty() => return LocalizedText::uniform(s),
            _ => {}
        }
    }
    LocalizedText::default()
}

fn id_list(value: &Value, array_keys: &[&str], single_keys: &[&str]) -> Vec<String> {
    for key in array_keys {
        if let Some(Value::Array(raw)) = value.get(*key) {
            return raw
                .iter()
                .filter_map(|v| match v {
                    Value::Object(_) => string_field(v, &["id"]),
                    other => scalar_to_string(other),
                })
                .collect();
        }
    }
    string_field(value, single_keys).into_iter().collect()
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First present key whose value is a non-empty string or a number.
fn string_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| value.get(*k).and_then(scalar_to_string))
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_u64(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn number_field(value: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| value.get(*k).and_then(as_f64))
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
        .or_else(|| parse_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|naive| naive.and_utc()))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}
