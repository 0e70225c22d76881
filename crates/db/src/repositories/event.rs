//! Event log repository.

use std::sync::Arc;

use super::within;
use crate::entities::{
    Event,
    event::{self, EventType},
};
use bacefook_common::{AppError, AppResult, DateRange};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, prelude::DateTimeWithTimeZone, sea_query::Expr,
};

/// `addfriend` events initiated by `user_id`.
///
/// Only the `user1Id` side of the payload is matched, so a friendship
/// accepted as `user2Id` does not count for that user.
fn friend_adds_by(user_id: &str, range: &DateRange) -> Select<Event> {
    let query = Event::find()
        .filter(event::Column::EventType.eq(EventType::AddFriend))
        .filter(Expr::cust_with_values("data->>'user1Id' = $1", [user_id]));

    within(query, event::Column::CreatedAt, range)
}

/// Event log repository. Rows are only ever appended.
#[derive(Clone)]
pub struct EventRepository {
    db: Arc<DatabaseConnection>,
}

impl EventRepository {
    /// Create a new event repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append an event.
    pub async fn append(&self, model: event::ActiveModel) -> AppResult<event::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count friend-add events initiated by `user_id` inside `range`.
    pub async fn count_friend_adds(&self, user_id: &str, range: &DateRange) -> AppResult<u64> {
        friend_adds_by(user_id, range)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Times of the friend-add events initiated by `user_id` inside `range`.
    pub async fn friend_add_times(
        &self,
        user_id: &str,
        range: &DateRange,
    ) -> AppResult<Vec<DateTime<Utc>>> {
        let times = friend_adds_by(user_id, range)
            .select_only()
            .column(event::Column::CreatedAt)
            .order_by_asc(event::Column::CreatedAt)
            .into_tuple::<DateTimeWithTimeZone>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(times.into_iter().map(|t| t.with_timezone(&Utc)).collect())
    }
}
