//! User repository.

use std::sync::Arc;

use super::within;
use crate::entities::{NetworkStrength, User, network_strength, user};
use bacefook_common::{AppError, AppResult, DateRange};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
    prelude::DateTimeWithTimeZone,
    sea_query::{Expr, Func, NullOrdering, Order},
};

/// Columns matched by the free-text listing search.
const SEARCH_COLUMNS: [user::Column; 4] = [
    user::Column::Username,
    user::Column::Email,
    user::Column::FirstName,
    user::Column::LastName,
];

/// Escape LIKE wildcards so the search term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive substring match over the searchable columns.
fn search_condition(search: Option<&str>) -> Condition {
    let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) else {
        return Condition::all();
    };

    let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
    SEARCH_COLUMNS
        .into_iter()
        .fold(Condition::any(), |condition, column| {
            condition.add(Expr::expr(Func::lower(Expr::col((User, column)))).like(pattern.clone()))
        })
}

/// Map a failed user write. A unique index hit means the email or
/// username was taken by a concurrent write.
fn write_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("User with this email or username already exists".to_string())
        }
        _ => AppError::Database(err.to_string()),
    }
}

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find users by IDs, oldest first.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user::Column::Id.is_in(ids.to_vec()))
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user, other than `exclude_id`, already holding `email` or `username`.
    pub async fn find_conflicting(
        &self,
        email: Option<&str>,
        username: Option<&str>,
        exclude_id: Option<&str>,
    ) -> AppResult<Option<user::Model>> {
        if email.is_none() && username.is_none() {
            return Ok(None);
        }

        let mut taken = Condition::any();
        if let Some(email) = email {
            taken = taken.add(user::Column::Email.eq(email));
        }
        if let Some(username) = username {
            taken = taken.add(user::Column::Username.eq(username));
        }

        let mut query = User::find().filter(taken);
        if let Some(id) = exclude_id {
            query = query.filter(user::Column::Id.ne(id));
        }

        query
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the oldest user whose username, first name or last name is exactly `name`.
    pub async fn find_first_by_name(&self, name: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(name))
                    .add(user::Column::FirstName.eq(name))
                    .add(user::Column::LastName.eq(name)),
            )
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model.insert(self.db.as_ref()).await.map_err(write_error)
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model.update(self.db.as_ref()).await.map_err(write_error)
    }

    /// Delete a user. Friendship, point and strength rows go with it;
    /// users it referred lose their referrer.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = User::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::UserNotFound(id.to_string()));
        }
        Ok(())
    }

    /// List users matching `search` (paginated, oldest first).
    pub async fn search(
        &self,
        search: Option<&str>,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<user::Model>> {
        User::find()
            .filter(search_condition(search))
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count users matching `search`.
    pub async fn count_search(&self, search: Option<&str>) -> AppResult<u64> {
        User::find()
            .filter(search_condition(search))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Users directly referred by `user_id`, oldest first.
    pub async fn find_referrals(&self, user_id: &str) -> AppResult<Vec<user::Model>> {
        User::find()
            .filter(user::Column::ReferredById.eq(user_id))
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Users directly referred by any of `user_ids`, oldest first.
    pub async fn find_referrals_of(&self, user_ids: &[String]) -> AppResult<Vec<user::Model>> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user::Column::ReferredById.is_in(user_ids.to_vec()))
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count direct referrals of `user_id` registered inside `range`.
    pub async fn count_referrals(&self, user_id: &str, range: &DateRange) -> AppResult<u64> {
        let query = User::find().filter(user::Column::ReferredById.eq(user_id));

        within(query, user::Column::CreatedAt, range)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Registration times of the direct referrals of `user_id` inside `range`.
    pub async fn referral_times(
        &self,
        user_id: &str,
        range: &DateRange,
    ) -> AppResult<Vec<DateTime<Utc>>> {
        let query = User::find().filter(user::Column::ReferredById.eq(user_id));

        let times = within(query, user::Column::CreatedAt, range)
            .select_only()
            .column(user::Column::CreatedAt)
            .order_by_asc(user::Column::CreatedAt)
            .into_tuple::<DateTimeWithTimeZone>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(times.into_iter().map(|t| t.with_timezone(&Utc)).collect())
    }

    /// Users among `ids` with the highest cached network strength.
    ///
    /// Users without a strength row rank last; ties go to the earlier
    /// registration.
    pub async fn find_strongest(
        &self,
        ids: &[String],
        limit: u64,
    ) -> AppResult<Vec<(user::Model, Option<network_strength::Model>)>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user::Column::Id.is_in(ids.to_vec()))
            .find_also_related(NetworkStrength)
            .order_by_with_nulls(
                network_strength::Column::Strength,
                Order::Desc,
                NullOrdering::Last,
            )
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
