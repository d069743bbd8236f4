pub mod applications;
pub mod browse;
pub mod cancel;
pub mod detail_cache;
pub mod favorites;
pub mod feed;
pub mod metrics;
pub mod my_announcements;
pub mod notifications;
pub mod session;
pub mod sync;
