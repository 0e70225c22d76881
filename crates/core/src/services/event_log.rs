//! Event log service.
//!
//! Every graph mutation is appended to the event log. Friend-add activity
//! can only be reconstructed from here, since friendship rows do not keep
//! per-pair history.

use bacefook_common::{AppResult, IdGenerator};
use bacefook_db::{
    entities::{
        event::{self, EventType},
        user,
    },
    repositories::EventRepository,
};
use chrono::{DateTime, Utc};
use sea_orm::Set;
use serde_json::{Map, Value, json};

/// A mutation worth recording.
#[derive(Debug, Clone)]
pub enum GraphEvent {
    /// A user registered.
    Register { user: user::Model },
    /// A user registered through a referrer.
    Referral {
        referred_by: String,
        user_id: String,
        created_at: DateTime<Utc>,
    },
    /// Profile fields changed.
    Updated {
        user_id: String,
        changes: Map<String, Value>,
        updated_at: DateTime<Utc>,
    },
    /// A user was deleted.
    Deleted { user_id: String },
    /// `user1_id` befriended `user2_id`.
    AddFriend {
        user1_id: String,
        user2_id: String,
        created_at: DateTime<Utc>,
    },
    /// `user1_id` unfriended `user2_id`.
    Unfriend {
        user1_id: String,
        user2_id: String,
        created_at: DateTime<Utc>,
    },
}

impl GraphEvent {
    /// Stored event type.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::Register { .. } => EventType::Register,
            Self::Referral { .. } => EventType::Referral,
            Self::Updated { .. } => EventType::Updated,
            Self::Deleted { .. } => EventType::Deleted,
            Self::AddFriend { .. } => EventType::AddFriend,
            Self::Unfriend { .. } => EventType::Unfriend,
        }
    }

    /// JSON payload stored in `event.data`.
    #[must_use]
    pub fn payload(&self) -> Value {
        match self {
            Self::Register { user } => json!({
                "email": user.email,
                "username": user.username,
                "firstName": user.first_name,
                "lastName": user.last_name,
                "bio": user.bio,
                "avatar": user.avatar,
                "referredById": user.referred_by_id,
                "userId": user.id,
                "createdAt": user.created_at.with_timezone(&Utc),
            }),
            Self::Referral {
                referred_by,
                user_id,
                created_at,
            } => json!({
                "referredBy": referred_by,
                "user": user_id,
                "createdAt": created_at,
            }),
            Self::Updated {
                user_id,
                changes,
                updated_at,
            } => {
                let mut data = changes.clone();
                data.insert("userId".to_string(), json!(user_id));
                data.insert("updatedAt".to_string(), json!(updated_at));
                Value::Object(data)
            }
            Self::Deleted { user_id } => json!({ "userId": user_id }),
            Self::AddFriend {
                user1_id,
                user2_id,
                created_at,
            }
            | Self::Unfriend {
                user1_id,
                user2_id,
                created_at,
            } => json!({
                "user1Id": user1_id,
                "user2Id": user2_id,
                "createdAt": created_at,
            }),
        }
    }
}

/// Event log service.
#[derive(Clone)]
pub struct EventLogService {
    event_repo: EventRepository,
    id_gen: IdGenerator,
}

impl EventLogService {
    /// Create a new event log service.
    #[must_use]
    pub const fn new(event_repo: EventRepository) -> Self {
        Self {
            event_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Append `event` to the log.
    pub async fn record(&self, event: GraphEvent) -> AppResult<event::Model> {
        let model = event::ActiveModel {
            id: Set(self.id_gen.generate()),
            event_type: Set(event.event_type()),
            data: Set(event.payload()),
            created_at: Set(Utc::now().into()),
            processed: Set(true),
        };

        let stored = self.event_repo.append(model).await?;
        tracing::debug!(event_id = %stored.id, event_type = ?stored.event_type, "Recorded event");
        Ok(stored)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bacefook_db::test_utils::{event_model, user_model};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[test]
    fn test_register_payload() {
        let user = user_model("u2", "bob", Some("u1"));
        let payload = GraphEvent::Register { user }.payload();

        assert_eq!(payload["userId"], "u2");
        assert_eq!(payload["referredById"], "u1");
        assert_eq!(payload["firstName"], "Bob");
        assert!(payload["bio"].is_null());
        assert!(payload["createdAt"].is_string());
    }

    #[test]
    fn test_referral_payload() {
        let payload = GraphEvent::Referral {
            referred_by: "u1".to_string(),
            user_id: "u2".to_string(),
            created_at: Utc::now(),
        }
        .payload();

        assert_eq!(payload["referredBy"], "u1");
        assert_eq!(payload["user"], "u2");
    }

    #[test]
    fn test_updated_payload_merges_changes() {
        let mut changes = Map::new();
        changes.insert("bio".to_string(), json!("hello"));

        let payload = GraphEvent::Updated {
            user_id: "u1".to_string(),
            changes,
            updated_at: Utc::now(),
        }
        .payload();

        assert_eq!(payload["bio"], "hello");
        assert_eq!(payload["userId"], "u1");
        assert!(payload.get("updatedAt").is_some());
    }

    #[test]
    fn test_friend_payloads_share_shape() {
        let now = Utc::now();
        let add = GraphEvent::AddFriend {
            user1_id: "a".to_string(),
            user2_id: "b".to_string(),
            created_at: now,
        };
        let remove = GraphEvent::Unfriend {
            user1_id: "a".to_string(),
            user2_id: "b".to_string(),
            created_at: now,
        };

        assert_eq!(add.payload(), remove.payload());
        assert_eq!(add.event_type(), EventType::AddFriend);
        assert_eq!(remove.event_type(), EventType::Unfriend);
    }

    #[tokio::test]
    async fn test_record_appends_processed_event() {
        let stored = event_model(
            "e1",
            EventType::Deleted,
            json!({ "userId": "u1" }),
            Utc::now(),
        );
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[stored.clone()]])
                .into_connection(),
        );

        let service = EventLogService::new(EventRepository::new(db));
        let recorded = service
            .record(GraphEvent::Deleted {
                user_id: "u1".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(recorded, stored);
    }
}
