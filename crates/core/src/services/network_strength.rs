//! Network strength service.

use bacefook_common::{AppResult, DateRange};
use bacefook_db::{
    entities::user,
    repositories::{FriendshipRepository, NetworkStrengthRepository, UserRepository},
};

/// `friends + direct referrals + 1 if the user was referred`.
#[must_use]
pub fn network_strength(friends: u64, referrals: u64, has_referrer: bool) -> i32 {
    let total = friends
        .saturating_add(referrals)
        .saturating_add(u64::from(has_referrer));
    i32::try_from(total).unwrap_or(i32::MAX)
}

/// Network strength service.
///
/// Strength is always recomputed from the current graph, never adjusted
/// incrementally. Only the users whose own adjacency changed are
/// recomputed; friends of friends keep their cached value.
#[derive(Clone)]
pub struct NetworkStrengthService {
    user_repo: UserRepository,
    friendship_repo: FriendshipRepository,
    strength_repo: NetworkStrengthRepository,
}

impl NetworkStrengthService {
    /// Create a new network strength service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        friendship_repo: FriendshipRepository,
        strength_repo: NetworkStrengthRepository,
    ) -> Self {
        Self {
            user_repo,
            friendship_repo,
            strength_repo,
        }
    }

    /// Compute the current strength of `user_id`, 0 if the user does not exist.
    pub async fn calculate(&self, user_id: &str) -> AppResult<i32> {
        match self.user_repo.find_by_id(user_id).await? {
            Some(user) => self.compute(&user).await,
            None => Ok(0),
        }
    }

    /// Recompute and store the strength of `user_id`.
    ///
    /// A user that no longer exists has nothing to store and yields 0.
    pub async fn update(&self, user_id: &str) -> AppResult<i32> {
        let Some(user) = self.user_repo.find_by_id(user_id).await? else {
            tracing::debug!(user_id = %user_id, "Skipping strength update for missing user");
            return Ok(0);
        };

        let strength = self.compute(&user).await?;
        self.strength_repo.upsert(user_id, strength).await?;

        tracing::debug!(user_id = %user_id, strength, "Updated network strength");
        Ok(strength)
    }

    /// Recompute and store the strength of each user in turn.
    pub async fn update_all<I, S>(&self, user_ids: I) -> AppResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for user_id in user_ids {
            self.update(user_id.as_ref()).await?;
        }
        Ok(())
    }

    async fn compute(&self, user: &user::Model) -> AppResult<i32> {
        let friends = self.friendship_repo.count_friends(&user.id).await?;
        let referrals = self
            .user_repo
            .count_referrals(&user.id, &DateRange::default())
            .await?;

        Ok(network_strength(
            friends,
            referrals,
            user.referred_by_id.is_some(),
        ))
    }
}
