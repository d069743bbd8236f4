use crate::models::{announcement::AnnouncementCategory, filter::FilterSpec};

/// One page of a remote feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    /// Page number echoed by the backend, when it sends one.
    pub page: Option<u32>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, page: Option<u32>) -> Self {
        Self { items, total, page }
    }
}

/// `GET /announcements` parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub category: Option<AnnouncementCategory>,
    pub filter: FilterSpec,
}

impl ListQuery {
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        // The tab only scopes the feed when the filter does not name categories itself.
        if let Some(category) = self.category {
            if self.filter.categories.is_empty() {
                pairs.push(("category", category.to_string()));
            }
        }
        pairs.extend(self.filter.to_query_pairs());
        pairs
    }
}

/// `page * limit < total`.
pub fn has_more(page: u32, limit: u32, total: u64) -> bool {
    u64::from(page) * u64::from(limit) < total
}
