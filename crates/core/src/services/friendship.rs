//! Friendship service.

use crate::services::{
    event_log::{EventLogService, GraphEvent},
    network_strength::NetworkStrengthService,
};
use crate::views::{Message, UserSummary};
use bacefook_common::{AppError, AppResult, PageWindow, Paginated, config::LimitConfig};
use bacefook_db::repositories::{
    EventRepository, FriendshipRepository, NetworkStrengthRepository, UserRepository,
};
use chrono::Utc;

/// Friendship service.
///
/// Keeps the friendship relation symmetric: both directions are linked or
/// unlinked together, then both endpoints get their strength recomputed.
#[derive(Clone)]
pub struct FriendshipService {
    user_repo: UserRepository,
    friendship_repo: FriendshipRepository,
    network_strength: NetworkStrengthService,
    event_log: EventLogService,
    pagination: LimitConfig,
}

impl FriendshipService {
    /// Create a new friendship service.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        friendship_repo: FriendshipRepository,
        strength_repo: NetworkStrengthRepository,
        event_repo: EventRepository,
        pagination: LimitConfig,
    ) -> Self {
        let network_strength = NetworkStrengthService::new(
            user_repo.clone(),
            friendship_repo.clone(),
            strength_repo,
        );

        Self {
            user_repo,
            friendship_repo,
            network_strength,
            event_log: EventLogService::new(event_repo),
            pagination,
        }
    }

    /// Make `user_id` and `friend_id` friends.
    pub async fn add_friend(&self, user_id: &str, friend_id: &str) -> AppResult<Message> {
        self.check_pair(user_id, friend_id).await?;

        let written = self.friendship_repo.connect(user_id, friend_id).await?;
        self.network_strength.update_all([user_id, friend_id]).await?;

        self.event_log
            .record(GraphEvent::AddFriend {
                user1_id: user_id.to_string(),
                user2_id: friend_id.to_string(),
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(user_id = %user_id, friend_id = %friend_id, written, "Friend added");
        Ok(Message::new("Friend added successfully"))
    }

    /// End the friendship between `user_id` and `friend_id`.
    pub async fn remove_friend(&self, user_id: &str, friend_id: &str) -> AppResult<Message> {
        self.check_pair(user_id, friend_id).await?;

        let removed = self.friendship_repo.disconnect(user_id, friend_id).await?;
        self.network_strength.update_all([user_id, friend_id]).await?;

        self.event_log
            .record(GraphEvent::Unfriend {
                user1_id: user_id.to_string(),
                user2_id: friend_id.to_string(),
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(user_id = %user_id, friend_id = %friend_id, removed, "Friend removed");
        Ok(Message::new("Friend removed successfully"))
    }

    /// Friends of `user_id` (paginated).
    pub async fn get_friends(
        &self,
        user_id: &str,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> AppResult<Paginated<UserSummary>> {
        self.user_repo.get_by_id(user_id).await?;

        let total = self.friendship_repo.count_friends(user_id).await?;
        let window = PageWindow::new(
            page.unwrap_or(1),
            self.pagination.resolve(limit),
            total,
        );

        let friends = self
            .friendship_repo
            .find_friends_page(user_id, window.offset(), window.limit)
            .await?;

        Ok(window.wrap(friends).map(UserSummary::from))
    }

    async fn check_pair(&self, user_id: &str, friend_id: &str) -> AppResult<()> {
        if user_id == friend_id {
            return Err(AppError::Conflict(
                "Cannot add yourself as a friend".to_string(),
            ));
        }

        self.user_repo.get_by_id(user_id).await?;
        self.user_repo.get_by_id(friend_id).await?;
        Ok(())
    }
}
