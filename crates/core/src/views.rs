//! Read projections returned by the services.

use bacefook_db::entities::user;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Public identity of a user, as embedded in lists and graphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// User ID.
    pub id: String,
    /// Unique handle.
    pub username: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Avatar URL.
    pub avatar: Option<String>,
}

impl From<&user::Model> for UserSummary {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

impl From<user::Model> for UserSummary {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            avatar: user.avatar,
        }
    }
}

/// Full profile of a user with its adjacency and derived metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// User ID.
    pub id: String,
    /// Unique email address.
    pub email: String,
    /// Unique handle.
    pub username: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Free-text bio.
    pub bio: Option<String>,
    /// Avatar URL.
    pub avatar: Option<String>,
    /// Registration time.
    pub created_at: DateTime<Utc>,
    /// Last profile change.
    pub updated_at: DateTime<Utc>,
    /// Current friends.
    pub friends: Vec<UserSummary>,
    /// Users this user referred directly.
    pub referrals: Vec<UserSummary>,
    /// 0 when the user has no counter yet.
    pub referral_points: i32,
    /// Live for a single profile. Listings read the cached value, 0 when
    /// none is stored yet.
    pub network_strength: i32,
}

impl UserProfile {
    /// Assemble a profile from a user row and its related data.
    #[must_use]
    pub fn new(
        user: user::Model,
        friends: Vec<UserSummary>,
        referrals: Vec<UserSummary>,
        referral_points: i32,
        network_strength: i32,
    ) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            bio: user.bio,
            avatar: user.avatar,
            created_at: user.created_at.with_timezone(&Utc),
            updated_at: user.updated_at.with_timezone(&Utc),
            friends,
            referrals,
            referral_points,
            network_strength,
        }
    }
}

/// Immediate neighbourhood of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkGraph {
    /// The user at the centre.
    pub user: UserSummary,
    /// Who referred the user, if anyone.
    pub referred_by: Option<UserSummary>,
    /// Users the user referred directly.
    pub referrals: Vec<UserSummary>,
    /// Current friends.
    pub friends: Vec<UserSummary>,
}

/// Network strength leaderboard entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrengthEntry {
    /// Ranked user.
    pub user: UserSummary,
    /// Cached strength.
    pub strength: i32,
    /// When the strength was last recomputed.
    pub calculated_at: DateTime<Utc>,
}

/// Referral points leaderboard entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsEntry {
    /// Ranked user.
    pub user: UserSummary,
    /// Referral points.
    pub points: i32,
    /// When the counter last changed.
    pub updated_at: DateTime<Utc>,
}

/// A friend ranked by cached network strength.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfluentialFriend {
    /// The friend.
    #[serde(flatten)]
    pub user: UserSummary,
    /// Cached strength, 0 when none is stored.
    pub network_strength: i32,
}

/// Plain acknowledgement of a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Human-readable outcome.
    pub message: &'static str,
}

impl Message {
    /// Wrap an acknowledgement text.
    #[must_use]
    pub const fn new(message: &'static str) -> Self {
        Self { message }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bacefook_db::test_utils::user_model;

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = UserSummary::from(user_model("u1", "alice", None));
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["firstName"], "Alice");
        assert_eq!(json["lastName"], "Tester");
        assert!(json["avatar"].is_null());
        assert!(json.get("email").is_none());
    }

    #[test]
    fn test_influential_friend_is_flat() {
        let friend = InfluentialFriend {
            user: UserSummary::from(user_model("u2", "bob", None)),
            network_strength: 4,
        };
        let json = serde_json::to_value(&friend).unwrap();

        assert_eq!(json["id"], "u2");
        assert_eq!(json["networkStrength"], 4);
    }
}
