//! User service.

use std::collections::{HashMap, HashSet};

use crate::services::{
    event_log::{EventLogService, GraphEvent},
    network_strength::NetworkStrengthService,
    referral_point::{JOIN_BONUS, ReferralPointService},
};
use crate::views::{Message, UserProfile, UserSummary};
use bacefook_common::{AppError, AppResult, IdGenerator, PageWindow, Paginated, config::LimitConfig};
use bacefook_db::{
    entities::user,
    repositories::{
        EventRepository, FriendshipRepository, NetworkStrengthRepository,
        ReferralPointRepository, UserRepository,
    },
};
use chrono::Utc;
use sea_orm::Set;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, json};
use validator::Validate;

/// Input for registering a user.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    /// Must be unique.
    #[validate(email)]
    pub email: String,
    /// Must be unique.
    #[validate(length(min = 3, max = 30))]
    pub username: String,
    /// First name.
    #[validate(length(min = 2, max = 50))]
    pub first_name: String,
    /// Last name.
    #[validate(length(min = 2, max = 50))]
    pub last_name: String,
    /// Free-text bio.
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    /// Avatar URL.
    pub avatar: Option<String>,
    /// Referring user. Unknown IDs are ignored.
    pub referred_by_id: Option<String>,
}

/// Keep an explicit `null` apart from an absent field.
fn nullable<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Input for updating a user. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    /// New email address.
    #[validate(email)]
    pub email: Option<String>,
    /// New username.
    #[validate(length(min = 3, max = 30))]
    pub username: Option<String>,
    /// New first name.
    #[validate(length(min = 2, max = 50))]
    pub first_name: Option<String>,
    /// New last name.
    #[validate(length(min = 2, max = 50))]
    pub last_name: Option<String>,
    /// New bio. `null` clears it.
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 500))]
    pub bio: Option<Option<String>>,
    /// New avatar URL. `null` clears it.
    #[serde(default, deserialize_with = "nullable")]
    pub avatar: Option<Option<String>>,
}

/// User service for registration, profiles and deletion.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    friendship_repo: FriendshipRepository,
    point_repo: ReferralPointRepository,
    strength_repo: NetworkStrengthRepository,
    referral_points: ReferralPointService,
    network_strength: NetworkStrengthService,
    event_log: EventLogService,
    pagination: LimitConfig,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        friendship_repo: FriendshipRepository,
        point_repo: ReferralPointRepository,
        strength_repo: NetworkStrengthRepository,
        event_repo: EventRepository,
        pagination: LimitConfig,
    ) -> Self {
        Self {
            referral_points: ReferralPointService::new(point_repo.clone(), user_repo.clone()),
            network_strength: NetworkStrengthService::new(
                user_repo.clone(),
                friendship_repo.clone(),
                strength_repo.clone(),
            ),
            event_log: EventLogService::new(event_repo),
            user_repo,
            friendship_repo,
            point_repo,
            strength_repo,
            pagination,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new user.
    ///
    /// An unknown `referredById` is dropped and the user registers without
    /// a referrer.
    pub async fn create(&self, input: CreateUserInput) -> AppResult<UserProfile> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self
            .user_repo
            .find_conflicting(Some(&input.email), Some(&input.username), None)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "User with this email or username already exists".to_string(),
            ));
        }

        let referrer_id = self.resolve_referrer(input.referred_by_id.as_deref()).await?;

        let now = Utc::now();
        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            email: Set(input.email),
            username: Set(input.username),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            bio: Set(input.bio),
            avatar: Set(input.avatar),
            referred_by_id: Set(referrer_id.clone()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let user = self.user_repo.create(model).await?;

        self.event_log
            .record(GraphEvent::Register { user: user.clone() })
            .await?;
        if let Some(ref referrer_id) = referrer_id {
            self.event_log
                .record(GraphEvent::Referral {
                    referred_by: referrer_id.clone(),
                    user_id: user.id.clone(),
                    created_at: now,
                })
                .await?;
        }

        self.referral_points
            .award_referral_points(&user.id, referrer_id.as_deref())
            .await?;

        let strength = self.network_strength.update(&user.id).await?;
        if let Some(ref referrer_id) = referrer_id {
            self.network_strength.update(referrer_id).await?;
        }

        tracing::info!(
            user_id = %user.id,
            username = %user.username,
            referrer_id = ?referrer_id,
            "User registered"
        );

        Ok(UserProfile::new(user, vec![], vec![], JOIN_BONUS, strength))
    }

    /// List users (paginated, oldest first) with cached metrics.
    pub async fn find_all(
        &self,
        search: Option<&str>,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> AppResult<Paginated<UserProfile>> {
        let total = self.user_repo.count_search(search).await?;
        let window = PageWindow::new(
            page.unwrap_or(1),
            self.pagination.resolve(limit),
            total,
        );

        let users = self
            .user_repo
            .search(search, window.offset(), window.limit)
            .await?;
        let profiles = self.assemble_profiles(users).await?;

        Ok(window.wrap(profiles))
    }

    /// Full profile of a user with a freshly computed network strength.
    pub async fn find_one(&self, id: &str) -> AppResult<UserProfile> {
        let user = self.user_repo.get_by_id(id).await?;
        self.profile(user).await
    }

    /// Update the profile fields of a user.
    pub async fn update(&self, id: &str, input: UpdateUserInput) -> AppResult<UserProfile> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let user = self.user_repo.get_by_id(id).await?;

        if self
            .user_repo
            .find_conflicting(input.email.as_deref(), input.username.as_deref(), Some(id))
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "User with this email or username already exists".to_string(),
            ));
        }

        let mut changes = Map::new();
        let mut model: user::ActiveModel = user.into();

        if let Some(email) = input.email {
            changes.insert("email".to_string(), json!(email));
            model.email = Set(email);
        }
        if let Some(username) = input.username {
            changes.insert("username".to_string(), json!(username));
            model.username = Set(username);
        }
        if let Some(first_name) = input.first_name {
            changes.insert("firstName".to_string(), json!(first_name));
            model.first_name = Set(first_name);
        }
        if let Some(last_name) = input.last_name {
            changes.insert("lastName".to_string(), json!(last_name));
            model.last_name = Set(last_name);
        }
        if let Some(bio) = input.bio {
            changes.insert("bio".to_string(), json!(bio));
            model.bio = Set(bio);
        }
        if let Some(avatar) = input.avatar {
            changes.insert("avatar".to_string(), json!(avatar));
            model.avatar = Set(avatar);
        }

        let now = Utc::now();
        model.updated_at = Set(now.into());

        let updated = self.user_repo.update(model).await?;

        self.event_log
            .record(GraphEvent::Updated {
                user_id: updated.id.clone(),
                changes,
                updated_at: now,
            })
            .await?;

        tracing::info!(user_id = %updated.id, "User updated");
        self.profile(updated).await
    }

    /// Delete a user and refresh the strength of its former neighbours.
    pub async fn remove(&self, id: &str) -> AppResult<Message> {
        let user = self.user_repo.get_by_id(id).await?;

        let mut affected = self.friendship_repo.friend_ids(id).await?;
        affected.extend(
            self.user_repo
                .find_referrals(id)
                .await?
                .into_iter()
                .map(|referral| referral.id),
        );
        affected.extend(user.referred_by_id);

        self.user_repo.delete(id).await?;
        self.network_strength.update_all(&affected).await?;

        self.event_log
            .record(GraphEvent::Deleted {
                user_id: id.to_string(),
            })
            .await?;

        tracing::info!(user_id = %id, affected = affected.len(), "User deleted");
        Ok(Message::new("User deleted successfully"))
    }

    async fn resolve_referrer(&self, referred_by_id: Option<&str>) -> AppResult<Option<String>> {
        let Some(referrer_id) = referred_by_id.filter(|id| !id.is_empty()) else {
            return Ok(None);
        };

        match self.user_repo.find_by_id(referrer_id).await? {
            Some(referrer) => Ok(Some(referrer.id)),
            None => {
                tracing::warn!(
                    referrer_id = %referrer_id,
                    "Unknown referrer, registering without one"
                );
                Ok(None)
            }
        }
    }

    /// Profile of a single user. Strength is recomputed, not read from cache.
    async fn profile(&self, user: user::Model) -> AppResult<UserProfile> {
        let friends = self.friendship_repo.find_friends(&user.id).await?;
        let referrals = self.user_repo.find_referrals(&user.id).await?;
        let points = self
            .point_repo
            .find_by_user_id(&user.id)
            .await?
            .map_or(0, |p| p.points);
        let strength = self.network_strength.calculate(&user.id).await?;

        Ok(UserProfile::new(
            user,
            friends.into_iter().map(UserSummary::from).collect(),
            referrals.into_iter().map(UserSummary::from).collect(),
            points,
            strength,
        ))
    }

    /// Profiles of a page of users, loading related rows in batches.
    async fn assemble_profiles(&self, users: Vec<user::Model>) -> AppResult<Vec<UserProfile>> {
        let ids: Vec<String> = users.iter().map(|u| u.id.clone()).collect();

        let points: HashMap<String, i32> = self
            .point_repo
            .find_by_user_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.user_id, p.points))
            .collect();
        let strengths: HashMap<String, i32> = self
            .strength_repo
            .find_by_user_ids(&ids)
            .await?
            .into_iter()
            .map(|s| (s.user_id, s.strength))
            .collect();

        let mut friend_sets: HashMap<String, HashSet<String>> = HashMap::new();
        for row in self.friendship_repo.find_by_user_ids(&ids).await? {
            friend_sets.entry(row.user_id).or_default().insert(row.friend_id);
        }

        let friend_ids: Vec<String> = friend_sets
            .values()
            .flatten()
            .cloned()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let friend_users = self.user_repo.find_by_ids(&friend_ids).await?;

        let mut referrals: HashMap<String, Vec<UserSummary>> = HashMap::new();
        for referral in self.user_repo.find_referrals_of(&ids).await? {
            if let Some(ref referrer_id) = referral.referred_by_id {
                referrals
                    .entry(referrer_id.clone())
                    .or_default()
                    .push(UserSummary::from(&referral));
            }
        }

        Ok(users
            .into_iter()
            .map(|user| {
                let friends = friend_sets.get(&user.id).map_or_else(Vec::new, |set| {
                    friend_users
                        .iter()
                        .filter(|f| set.contains(&f.id))
                        .map(UserSummary::from)
                        .collect()
                });
                let user_referrals = referrals.remove(&user.id).unwrap_or_default();
                let user_points = points.get(&user.id).copied().unwrap_or(0);
                let user_strength = strengths.get(&user.id).copied().unwrap_or(0);

                UserProfile::new(user, friends, user_referrals, user_points, user_strength)
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bacefook_db::{
        entities::{event::EventType, friendship, referral_point},
        test_utils::{event_model, executed_sql, points_model, strength_model, user_model},
    };
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn count(n: i64) -> BTreeMap<&'static str, sea_orm::Value> {
        maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }
    }

    fn exec(n: usize) -> Vec<MockExecResult> {
        (0..n)
            .map(|_| MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            })
            .collect()
    }

    fn empty() -> MockDatabase {
        MockDatabase::new(DatabaseBackend::Postgres)
    }

    fn stored_event(event_type: EventType) -> bacefook_db::entities::event::Model {
        event_model("e1", event_type, json!({}), Utc::now())
    }

    fn pair(user_id: &str, friend_id: &str) -> friendship::Model {
        friendship::Model {
            user_id: user_id.to_string(),
            friend_id: friend_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    struct Dbs {
        user: MockDatabase,
        friendship: MockDatabase,
        point: MockDatabase,
        strength: MockDatabase,
        event: MockDatabase,
    }

    impl Default for Dbs {
        fn default() -> Self {
            Self {
                user: empty(),
                friendship: empty(),
                point: empty(),
                strength: empty(),
                event: empty(),
            }
        }
    }

    fn service(dbs: Dbs) -> UserService {
        UserService::new(
            UserRepository::new(Arc::new(dbs.user.into_connection())),
            FriendshipRepository::new(Arc::new(dbs.friendship.into_connection())),
            ReferralPointRepository::new(Arc::new(dbs.point.into_connection())),
            NetworkStrengthRepository::new(Arc::new(dbs.strength.into_connection())),
            EventRepository::new(Arc::new(dbs.event.into_connection())),
            LimitConfig::default(),
        )
    }

    fn input(username: &str, referred_by_id: Option<&str>) -> CreateUserInput {
        CreateUserInput {
            email: format!("{username}@example.com"),
            username: username.to_string(),
            first_name: "Alice".to_string(),
            last_name: "Tester".to_string(),
            bio: None,
            avatar: None,
            referred_by_id: referred_by_id.map(str::to_string),
        }
    }

    #[test]
    fn test_create_input_rejects_bad_email_and_short_username() {
        let mut bad = input("alice", None);
        bad.email = "not-an-email".to_string();
        assert!(bad.validate().is_err());

        let short = input("al", None);
        assert!(short.validate().is_err());

        assert!(input("alice", None).validate().is_ok());
    }

    #[test]
    fn test_create_input_deserializes_camel_case() {
        let parsed: CreateUserInput = serde_json::from_value(json!({
            "email": "bob@example.com",
            "username": "bob",
            "firstName": "Bob",
            "lastName": "Tester",
            "referredById": "u1"
        }))
        .unwrap();

        assert_eq!(parsed.first_name, "Bob");
        assert_eq!(parsed.referred_by_id.as_deref(), Some("u1"));
        assert!(parsed.bio.is_none());
    }

    #[test]
    fn test_update_input_tells_null_from_absent() {
        let parsed: UpdateUserInput =
            serde_json::from_value(json!({ "bio": null, "firstName": "Bo" })).unwrap();

        assert_eq!(parsed.bio, Some(None));
        assert_eq!(parsed.avatar, None);
        assert_eq!(parsed.first_name.as_deref(), Some("Bo"));
    }

    #[test]
    fn test_update_input_rejects_long_bio() {
        let input = UpdateUserInput {
            bio: Some(Some("x".repeat(501))),
            ..UpdateUserInput::default()
        };

        assert!(input.validate().is_err());
    }

    #[tokio::test]
    async fn test_create_invalid_input_touches_nothing() {
        let mut bad = input("alice", None);
        bad.email = "nope".to_string();

        let result = service(Dbs::default()).create(bad).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_duplicate_is_conflict() {
        let service = service(Dbs {
            user: empty().append_query_results([[user_model("u1", "alice", None)]]),
            ..Dbs::default()
        });

        let result = service.create(input("alice", None)).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_without_referrer() {
        let created = user_model("u1", "alice", None);

        let service = service(Dbs {
            user: empty()
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[created.clone()]])
                .append_query_results([[created.clone()]])
                .append_query_results([[count(0)]]),
            friendship: empty().append_query_results([[count(0)]]),
            point: empty().append_exec_results(exec(1)),
            strength: empty().append_exec_results(exec(1)),
            event: empty().append_query_results([[stored_event(EventType::Register)]]),
        });

        let profile = service.create(input("alice", None)).await.unwrap();

        assert_eq!(profile.id, "u1");
        assert_eq!(profile.referral_points, 1);
        assert_eq!(profile.network_strength, 0);
        assert!(profile.friends.is_empty());
        assert!(profile.referrals.is_empty());
    }

    #[tokio::test]
    async fn test_create_with_referrer_updates_both_strengths() {
        let referrer = user_model("u1", "alice", None);
        let created = user_model("u2", "bob", Some("u1"));

        let service = service(Dbs {
            user: empty()
                // conflict check, referrer lookup, insert
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[referrer.clone()]])
                .append_query_results([[created.clone()]])
                // grand referrer lookup
                .append_query_results([[referrer.clone()]])
                // strength of bob, then alice
                .append_query_results([[created.clone()]])
                .append_query_results([[count(0)]])
                .append_query_results([[referrer]])
                .append_query_results([[count(1)]]),
            friendship: empty()
                .append_query_results([[count(0)]])
                .append_query_results([[count(0)]]),
            point: empty().append_exec_results(exec(2)),
            strength: empty().append_exec_results(exec(2)),
            event: empty()
                .append_query_results([[stored_event(EventType::Register)]])
                .append_query_results([[stored_event(EventType::Referral)]]),
        });

        let profile = service.create(input("bob", Some("u1"))).await.unwrap();

        assert_eq!(profile.id, "u2");
        assert_eq!(profile.referral_points, 1);
        assert_eq!(profile.network_strength, 1);
    }

    #[tokio::test]
    async fn test_create_drops_unknown_referrer() {
        let created = user_model("u2", "bob", None);

        let service = service(Dbs {
            user: empty()
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[created.clone()]])
                .append_query_results([[created.clone()]])
                .append_query_results([[count(0)]]),
            friendship: empty().append_query_results([[count(0)]]),
            // Only the join bonus is written
            point: empty().append_exec_results(exec(1)),
            strength: empty().append_exec_results(exec(1)),
            event: empty().append_query_results([[stored_event(EventType::Register)]]),
        });

        let profile = service.create(input("bob", Some("ghost"))).await.unwrap();

        assert_eq!(profile.network_strength, 0);
    }

    #[tokio::test]
    async fn test_find_one_missing_is_not_found() {
        let service = service(Dbs {
            user: empty().append_query_results([Vec::<user::Model>::new()]),
            ..Dbs::default()
        });

        let result = service.find_one("ghost").await;

        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_find_one_computes_live_strength() {
        // The stored strength is stale: it is never read for a single profile
        let bob = user_model("u2", "bob", Some("u1"));

        let service = service(Dbs {
            user: empty()
                .append_query_results([[bob.clone()]])
                .append_query_results([[user_model("u3", "carol", Some("u2"))]])
                // recomputation: bob again, then his referral count
                .append_query_results([[bob]])
                .append_query_results([[count(1)]]),
            friendship: empty()
                .append_query_results([[
                    user_model("u4", "dave", None),
                    user_model("u5", "erin", None),
                ]])
                .append_query_results([[count(2)]]),
            point: empty().append_query_results([[points_model("u2", 3)]]),
            ..Dbs::default()
        });

        let profile = service.find_one("u2").await.unwrap();

        assert_eq!(profile.friends.len(), 2);
        assert_eq!(profile.referrals[0].username, "carol");
        assert_eq!(profile.referral_points, 3);
        assert_eq!(profile.network_strength, 4);
    }

    #[tokio::test]
    async fn test_find_one_without_counters_reads_zero() {
        let service = service(Dbs {
            user: empty()
                .append_query_results([[user_model("u1", "alice", None)]])
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[user_model("u1", "alice", None)]])
                .append_query_results([[count(0)]]),
            friendship: empty()
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[count(0)]]),
            point: empty().append_query_results([Vec::<referral_point::Model>::new()]),
            ..Dbs::default()
        });

        let profile = service.find_one("u1").await.unwrap();

        assert_eq!(profile.referral_points, 0);
        assert_eq!(profile.network_strength, 0);
    }

    #[tokio::test]
    async fn test_find_all_assembles_cached_metrics() {
        let alice = user_model("a", "alice", None);
        let bob = user_model("b", "bob", None);
        let carol = user_model("c", "carol", Some("a"));

        let service = service(Dbs {
            user: empty()
                .append_query_results([[count(3)]])
                .append_query_results([[alice.clone(), bob.clone()]])
                .append_query_results([[alice, bob]])
                .append_query_results([[carol]]),
            friendship: empty().append_query_results([[pair("a", "b"), pair("b", "a")]]),
            point: empty().append_query_results([[points_model("a", 2), points_model("b", 1)]]),
            strength: empty().append_query_results([[strength_model("a", 2)]]),
            ..Dbs::default()
        });

        let page = service.find_all(None, Some(1), Some(2)).await.unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.data.len(), 2);

        let alice = &page.data[0];
        assert_eq!(alice.friends[0].id, "b");
        assert_eq!(alice.referrals[0].id, "c");
        assert_eq!(alice.referral_points, 2);
        assert_eq!(alice.network_strength, 2);

        let bob = &page.data[1];
        assert_eq!(bob.friends[0].id, "a");
        assert!(bob.referrals.is_empty());
        assert_eq!(bob.network_strength, 0);
    }

    #[tokio::test]
    async fn test_find_all_empty_listing() {
        let service = service(Dbs {
            user: empty()
                .append_query_results([[count(0)]])
                .append_query_results([Vec::<user::Model>::new()]),
            ..Dbs::default()
        });

        let page = service.find_all(Some("nobody"), None, None).await.unwrap();

        assert!(page.data.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.page, 1);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let service = service(Dbs {
            user: empty().append_query_results([Vec::<user::Model>::new()]),
            ..Dbs::default()
        });

        let result = service.update("ghost", UpdateUserInput::default()).await;

        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_taken_username_is_conflict() {
        let service = service(Dbs {
            user: empty()
                .append_query_results([[user_model("a", "alice", None)]])
                .append_query_results([[user_model("b", "bob", None)]]),
            ..Dbs::default()
        });

        let result = service
            .update(
                "a",
                UpdateUserInput {
                    username: Some("bob".to_string()),
                    ..UpdateUserInput::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_applies_fields() {
        let mut renamed = user_model("a", "alicia", None);
        renamed.bio = Some("hello".to_string());

        let service = service(Dbs {
            user: empty()
                .append_query_results([[user_model("a", "alice", None)]])
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[renamed.clone()]])
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[renamed]])
                .append_query_results([[count(0)]]),
            friendship: empty()
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[count(0)]]),
            point: empty().append_query_results([[points_model("a", 1)]]),
            event: empty().append_query_results([[stored_event(EventType::Updated)]]),
            ..Dbs::default()
        });

        let profile = service
            .update(
                "a",
                UpdateUserInput {
                    username: Some("alicia".to_string()),
                    bio: Some(Some("hello".to_string())),
                    ..UpdateUserInput::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(profile.username, "alicia");
        assert_eq!(profile.bio.as_deref(), Some("hello"));
        assert_eq!(profile.referral_points, 1);
    }

    #[tokio::test]
    async fn test_update_null_bio_clears_it() {
        let mut alice = user_model("a", "alice", None);
        alice.bio = Some("old".to_string());
        let cleared = user_model("a", "alice", None);

        let user_conn = Arc::new(
            empty()
                .append_query_results([[alice]])
                .append_query_results([[cleared.clone()]])
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[cleared]])
                .append_query_results([[count(0)]])
                .into_connection(),
        );
        let dbs = Dbs {
            friendship: empty()
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[count(0)]]),
            point: empty().append_query_results([Vec::<referral_point::Model>::new()]),
            event: empty().append_query_results([[stored_event(EventType::Updated)]]),
            ..Dbs::default()
        };
        let service = UserService::new(
            UserRepository::new(Arc::clone(&user_conn)),
            FriendshipRepository::new(Arc::new(dbs.friendship.into_connection())),
            ReferralPointRepository::new(Arc::new(dbs.point.into_connection())),
            NetworkStrengthRepository::new(Arc::new(dbs.strength.into_connection())),
            EventRepository::new(Arc::new(dbs.event.into_connection())),
            LimitConfig::default(),
        );

        let input: UpdateUserInput = serde_json::from_value(json!({ "bio": null })).unwrap();
        let profile = service.update("a", input).await.unwrap();
        drop(service);

        assert!(profile.bio.is_none());
        let sql = executed_sql(user_conn).unwrap();
        let update = sql.iter().find(|s| s.starts_with("UPDATE")).unwrap();
        assert!(update.contains(r#""bio" = NULL"#), "{update}");
    }

    #[tokio::test]
    async fn test_remove_missing_is_not_found() {
        let service = service(Dbs {
            user: empty().append_query_results([Vec::<user::Model>::new()]),
            ..Dbs::default()
        });

        let result = service.remove("ghost").await;

        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_refreshes_former_neighbours() {
        // bob referred carol, was referred by alice and is friends with dave
        let bob = user_model("b", "bob", Some("a"));
        let carol = user_model("c", "carol", None);

        let service = service(Dbs {
            user: empty()
                .append_query_results([[bob]])
                .append_query_results([[carol.clone()]])
                .append_exec_results(exec(1))
                // dave, carol, alice in turn
                .append_query_results([[user_model("d", "dave", None)]])
                .append_query_results([[count(0)]])
                .append_query_results([[carol]])
                .append_query_results([[count(0)]])
                .append_query_results([[user_model("a", "alice", None)]])
                .append_query_results([[count(0)]]),
            friendship: empty()
                .append_query_results([[maplit::btreemap! {
                    "friend_id" => sea_orm::Value::String(Some(Box::new("d".to_string())))
                }]])
                .append_query_results([[count(0)]])
                .append_query_results([[count(0)]])
                .append_query_results([[count(0)]]),
            strength: empty().append_exec_results(exec(3)),
            event: empty().append_query_results([[stored_event(EventType::Deleted)]]),
            ..Dbs::default()
        });

        let message = service.remove("b").await.unwrap();

        assert_eq!(message.message, "User deleted successfully");
    }
}
