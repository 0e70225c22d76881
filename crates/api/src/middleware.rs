//! Shared handler state.

use std::sync::Arc;

use bacefook_common::Config;
use bacefook_core::{AnalyticsService, FriendshipService, UserService};
use bacefook_db::repositories::{
    EventRepository, FriendshipRepository, NetworkStrengthRepository, ReferralPointRepository,
    UserRepository,
};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub friendship_service: FriendshipService,
    pub analytics_service: AnalyticsService,
}

impl AppState {
    /// Wire every service onto one connection pool.
    #[must_use]
    pub fn new(db: &Arc<DatabaseConnection>, config: &Config) -> Self {
        let user_repo = UserRepository::new(Arc::clone(db));
        let friendship_repo = FriendshipRepository::new(Arc::clone(db));
        let point_repo = ReferralPointRepository::new(Arc::clone(db));
        let strength_repo = NetworkStrengthRepository::new(Arc::clone(db));
        let event_repo = EventRepository::new(Arc::clone(db));

        let user_service = UserService::new(
            user_repo.clone(),
            friendship_repo.clone(),
            point_repo.clone(),
            strength_repo.clone(),
            event_repo.clone(),
            config.pagination,
        );
        let friendship_service = FriendshipService::new(
            user_repo.clone(),
            friendship_repo.clone(),
            strength_repo.clone(),
            event_repo.clone(),
            config.pagination,
        );
        let analytics_service = AnalyticsService::new(
            user_repo,
            friendship_repo,
            point_repo,
            strength_repo,
            event_repo,
            config.leaderboard,
        );

        Self {
            user_service,
            friendship_service,
            analytics_service,
        }
    }
}
