//! Analytics service: graph lookups, leaderboards and activity counts.

use crate::views::{InfluentialFriend, NetworkGraph, PointsEntry, StrengthEntry, UserSummary};
use bacefook_common::{AppError, AppResult, DateRange, DayCount, config::LimitConfig, day_series};
use bacefook_db::repositories::{
    EventRepository, FriendshipRepository, NetworkStrengthRepository, ReferralPointRepository,
    UserRepository,
};
use chrono::Utc;

/// Number of friends returned by [`AnalyticsService::top_influential_friends`].
pub const TOP_FRIENDS: u64 = 3;

/// Read-only queries over the graph and the event log.
#[derive(Clone)]
pub struct AnalyticsService {
    user_repo: UserRepository,
    friendship_repo: FriendshipRepository,
    point_repo: ReferralPointRepository,
    strength_repo: NetworkStrengthRepository,
    event_repo: EventRepository,
    leaderboard: LimitConfig,
}

impl AnalyticsService {
    /// Create a new analytics service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        friendship_repo: FriendshipRepository,
        point_repo: ReferralPointRepository,
        strength_repo: NetworkStrengthRepository,
        event_repo: EventRepository,
        leaderboard: LimitConfig,
    ) -> Self {
        Self {
            user_repo,
            friendship_repo,
            point_repo,
            strength_repo,
            event_repo,
            leaderboard,
        }
    }

    /// Neighbourhood of the oldest user whose username, first name or last
    /// name is exactly `name`.
    pub async fn network_graph_by_name(&self, name: &str) -> AppResult<NetworkGraph> {
        let user = self
            .user_repo
            .find_first_by_name(name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with name {name} not found")))?;

        let referred_by = match user.referred_by_id.as_deref() {
            Some(referrer_id) => self.user_repo.find_by_id(referrer_id).await?,
            None => None,
        };
        let referrals = self.user_repo.find_referrals(&user.id).await?;
        let friends = self.friendship_repo.find_friends(&user.id).await?;

        Ok(NetworkGraph {
            user: UserSummary::from(user),
            referred_by: referred_by.map(UserSummary::from),
            referrals: referrals.into_iter().map(UserSummary::from).collect(),
            friends: friends.into_iter().map(UserSummary::from).collect(),
        })
    }

    /// Users ranked by cached network strength.
    pub async fn network_strength_leaderboard(
        &self,
        range: &DateRange,
        limit: Option<u64>,
    ) -> AppResult<Vec<StrengthEntry>> {
        let rows = self
            .strength_repo
            .leaderboard(range, self.leaderboard.resolve(limit))
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(strength, user)| {
                user.map(|user| StrengthEntry {
                    user: UserSummary::from(user),
                    strength: strength.strength,
                    calculated_at: strength.calculated_at.with_timezone(&Utc),
                })
            })
            .collect())
    }

    /// Users ranked by referral points.
    pub async fn referral_points_leaderboard(
        &self,
        range: &DateRange,
        limit: Option<u64>,
    ) -> AppResult<Vec<PointsEntry>> {
        let rows = self
            .point_repo
            .leaderboard(range, self.leaderboard.resolve(limit))
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(points, user)| {
                user.map(|user| PointsEntry {
                    user: UserSummary::from(user),
                    points: points.points,
                    updated_at: points.updated_at.with_timezone(&Utc),
                })
            })
            .collect())
    }

    /// Number of users `user_id` referred inside `range`.
    pub async fn referral_count(&self, user_id: &str, range: &DateRange) -> AppResult<u64> {
        self.user_repo.count_referrals(user_id, range).await
    }

    /// Referrals of `user_id` inside `range`, per UTC day.
    pub async fn referral_timeseries(
        &self,
        user_id: &str,
        range: &DateRange,
    ) -> AppResult<Vec<DayCount>> {
        let times = self.user_repo.referral_times(user_id, range).await?;
        Ok(day_series(times))
    }

    /// Friendships `user_id` initiated inside `range`.
    ///
    /// Friendships where `user_id` was the other side are not counted.
    pub async fn friends_count(&self, user_id: &str, range: &DateRange) -> AppResult<u64> {
        self.event_repo.count_friend_adds(user_id, range).await
    }

    /// Friendships `user_id` initiated inside `range`, per UTC day.
    pub async fn friends_timeseries(
        &self,
        user_id: &str,
        range: &DateRange,
    ) -> AppResult<Vec<DayCount>> {
        let times = self.event_repo.friend_add_times(user_id, range).await?;
        Ok(day_series(times))
    }

    /// The friends of `user_id` with the highest cached network strength.
    pub async fn top_influential_friends(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<InfluentialFriend>> {
        self.user_repo.get_by_id(user_id).await?;

        let friend_ids = self.friendship_repo.friend_ids(user_id).await?;
        if friend_ids.is_empty() {
            return Ok(vec![]);
        }

        let strongest = self
            .user_repo
            .find_strongest(&friend_ids, TOP_FRIENDS)
            .await?;

        Ok(strongest
            .into_iter()
            .map(|(user, strength)| InfluentialFriend {
                user: UserSummary::from(user),
                network_strength: strength.map_or(0, |s| s.strength),
            })
            .collect())
    }
}
