use std::sync::Arc;

use crate::{
    config::Config,
    error::StoreResult,
    gateway::{AnnouncementGateway, HttpGateway},
    services::{
        applications::ApplicationsController, browse::BrowseListController,
        detail_cache::DetailCache, favorites::FavoritesController,
        my_announcements::MyAnnouncementsController, notifications::NotificationsController,
        session::Session, sync::CounterSync,
    },
};

/// Every store, wired once at application start and shared by reference with the UI.
#[derive(Clone)]
pub struct Marketplace {
    pub session: Arc<Session>,
    pub cache: Arc<DetailCache>,
    pub browse: Arc<BrowseListController>,
    pub sync: Arc<CounterSync>,
    pub applications: Arc<ApplicationsController>,
    pub favorites: Arc<FavoritesController>,
    pub my_announcements: Arc<MyAnnouncementsController>,
    pub notifications: Arc<NotificationsController>,
}

impl Marketplace {
    pub fn new(gateway: Arc<dyn AnnouncementGateway>, session: Arc<Session>, config: &Config) -> Self {
        let cache = Arc::new(DetailCache::new(gateway.clone()));
        let browse = Arc::new(BrowseListController::new(
            gateway.clone(),
            cache.clone(),
            config.browse_page_size,
        ));
        let sync = Arc::new(CounterSync::new(cache.clone(), browse.clone()));
        let applications = Arc::new(ApplicationsController::new(
            gateway.clone(),
            session.clone(),
            sync.clone(),
        ));
        let favorites = Arc::new(FavoritesController::new(
            gateway.clone(),
            config.favorites_page_size,
        ));
        let my_announcements = Arc::new(MyAnnouncementsController::new(
            gateway.clone(),
            sync.clone(),
            config.my_announcements_page_size,
        ));
        let notifications = Arc::new(NotificationsController::new(
            gateway,
            config.notifications_page_size,
        ));

        Self {
            session,
            cache,
            browse,
            sync,
            applications,
            favorites,
            my_announcements,
            notifications,
        }
    }

    /// Wire the stores against the REST backend described by `config`.
    pub fn connect(config: &Config, session: Arc<Session>) -> StoreResult<Self> {
        let gateway: Arc<dyn AnnouncementGateway> = Arc::new(HttpGateway::new(config)?);
        tracing::info!("Marketplace stores wired against {}", config.api_base_url);
        Ok(Self::new(gateway, session, config))
    }
}
