//! Friendship repository.
//!
//! Every friendship is two directed rows. Both are written by one
//! statement and removed by one statement, so a pair is never half-applied.

use std::sync::Arc;

use crate::entities::{Friendship, User, friendship, user};
use bacefook_common::{AppError, AppResult};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
    prelude::DateTimeWithTimeZone,
    sea_query::{OnConflict, Query, SelectStatement},
};

/// Both directed rows of the pair `{a, b}`.
fn pair_rows(a: &str, b: &str, now: DateTimeWithTimeZone) -> [friendship::ActiveModel; 2] {
    [(a, b), (b, a)].map(|(user_id, friend_id)| friendship::ActiveModel {
        user_id: Set(user_id.to_string()),
        friend_id: Set(friend_id.to_string()),
        created_at: Set(now),
    })
}

/// Either directed row of the pair `{a, b}`.
fn pair_condition(a: &str, b: &str) -> Condition {
    Condition::any()
        .add(
            Condition::all()
                .add(friendship::Column::UserId.eq(a))
                .add(friendship::Column::FriendId.eq(b)),
        )
        .add(
            Condition::all()
                .add(friendship::Column::UserId.eq(b))
                .add(friendship::Column::FriendId.eq(a)),
        )
}

/// `SELECT friend_id FROM friendship WHERE user_id = ?`
fn friend_ids_of(user_id: &str) -> SelectStatement {
    Query::select()
        .column(friendship::Column::FriendId)
        .from(Friendship)
        .and_where(friendship::Column::UserId.eq(user_id))
        .to_owned()
}

/// Friendship repository for database operations.
#[derive(Clone)]
pub struct FriendshipRepository {
    db: Arc<DatabaseConnection>,
}

impl FriendshipRepository {
    /// Create a new friendship repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Link `a` and `b` in both directions. Existing rows are left alone.
    ///
    /// Returns the number of directed rows written.
    pub async fn connect(&self, a: &str, b: &str) -> AppResult<u64> {
        Friendship::insert_many(pair_rows(a, b, Utc::now().into()))
            .on_conflict(
                OnConflict::columns([friendship::Column::UserId, friendship::Column::FriendId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Unlink `a` and `b` in both directions.
    ///
    /// Returns the number of directed rows removed.
    pub async fn disconnect(&self, a: &str, b: &str) -> AppResult<u64> {
        let result = Friendship::delete_many()
            .filter(pair_condition(a, b))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// IDs of the friends of `user_id`.
    pub async fn friend_ids(&self, user_id: &str) -> AppResult<Vec<String>> {
        Friendship::find()
            .filter(friendship::Column::UserId.eq(user_id))
            .select_only()
            .column(friendship::Column::FriendId)
            .order_by_asc(friendship::Column::FriendId)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Friendship rows owned by any of `user_ids`.
    pub async fn find_by_user_ids(&self, user_ids: &[String]) -> AppResult<Vec<friendship::Model>> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        Friendship::find()
            .filter(friendship::Column::UserId.is_in(user_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count the friends of `user_id`.
    pub async fn count_friends(&self, user_id: &str) -> AppResult<u64> {
        Friendship::find()
            .filter(friendship::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All friends of `user_id`, oldest account first.
    pub async fn find_friends(&self, user_id: &str) -> AppResult<Vec<user::Model>> {
        User::find()
            .filter(user::Column::Id.in_subquery(friend_ids_of(user_id)))
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Friends of `user_id` (paginated, oldest account first).
    pub async fn find_friends_page(
        &self,
        user_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<user::Model>> {
        User::find()
            .filter(user::Column::Id.in_subquery(friend_ids_of(user_id)))
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
