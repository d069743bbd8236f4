use std::sync::Arc;

use crate::{
    models::announcement::{Announcement, AnnouncementStatus},
    services::{browse::BrowseListController, detail_cache::DetailCache, metrics},
};

/// Which stores a cross-store patch actually reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub cache: bool,
    pub list: bool,
}

/// Mirrors counter and status changes into the detail cache and the browse list.
///
/// Best-effort and eventually consistent: a store that does not hold the
/// announcement is skipped, never fetched.
pub struct CounterSync {
    cache: Arc<DetailCache>,
    browse: Arc<BrowseListController>,
}

impl CounterSync {
    pub fn new(cache: Arc<DetailCache>, browse: Arc<BrowseListController>) -> Self {
        Self { cache, browse }
    }

    pub fn cache(&self) -> &Arc<DetailCache> {
        &self.cache
    }

    /// Shift `applications_count` by `delta`, floored at zero.
    pub fn adjust_applications_count(&self, id: &str, delta: i64) -> SyncReport {
        self.apply(id, |a| a.with_applications_delta(delta))
    }

    pub fn apply_status(&self, id: &str, status: AnnouncementStatus) -> SyncReport {
        self.apply(id, |a| a.with_status(status))
    }

    fn apply(&self, id: &str, f: impl Fn(&Announcement) -> Announcement) -> SyncReport {
        let report = SyncReport {
            cache: self.cache.update(id, &f),
            list: self.browse.patch_entry(id, &f),
        };
        metrics::record_sync("detail_cache", report.cache);
        metrics::record_sync("browse_list", report.list);
        tracing::debug!(
            "Synced announcement {} (cache: {}, list: {})",
            id,
            report.cache,
            report.list
        );
        report
    }
}
