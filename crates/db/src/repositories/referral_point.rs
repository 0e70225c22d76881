//! Referral point repository.

use std::sync::Arc;

use super::within;
use crate::entities::{ReferralPoint, User, referral_point, user};
use bacefook_common::{AppError, AppResult, DateRange};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    sea_query::{Expr, OnConflict},
};

/// Referral point repository for database operations.
#[derive(Clone)]
pub struct ReferralPointRepository {
    db: Arc<DatabaseConnection>,
}

impl ReferralPointRepository {
    /// Create a new referral point repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create the counter of a newly registered user, starting at `points`.
    ///
    /// Fails if the user already has a counter.
    pub async fn create(&self, user_id: &str, points: i32) -> AppResult<()> {
        let now = Utc::now();
        let model = referral_point::ActiveModel {
            user_id: Set(user_id.to_string()),
            points: Set(points),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        ReferralPoint::insert(model)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Add one point to `user_id`, creating the counter at 1 if absent.
    ///
    /// Single `INSERT .. ON CONFLICT DO UPDATE`, so concurrent increments
    /// of the same row never lose an update.
    pub async fn increment(&self, user_id: &str) -> AppResult<()> {
        let now = Utc::now();
        let model = referral_point::ActiveModel {
            user_id: Set(user_id.to_string()),
            points: Set(1),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        ReferralPoint::insert(model)
            .on_conflict(
                OnConflict::column(referral_point::Column::UserId)
                    .value(
                        referral_point::Column::Points,
                        Expr::col((ReferralPoint, referral_point::Column::Points)).add(1),
                    )
                    .update_column(referral_point::Column::UpdatedAt)
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Find the counter of a user.
    pub async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<referral_point::Model>> {
        ReferralPoint::find_by_id(user_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the counters of several users.
    pub async fn find_by_user_ids(
        &self,
        user_ids: &[String],
    ) -> AppResult<Vec<referral_point::Model>> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        ReferralPoint::find()
            .filter(referral_point::Column::UserId.is_in(user_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Highest counters last touched inside `range`, ties by user ID.
    pub async fn leaderboard(
        &self,
        range: &DateRange,
        limit: u64,
    ) -> AppResult<Vec<(referral_point::Model, Option<user::Model>)>> {
        within(
            ReferralPoint::find(),
            referral_point::Column::UpdatedAt,
            range,
        )
        .find_also_related(User)
        .order_by_desc(referral_point::Column::Points)
        .order_by_asc(referral_point::Column::UserId)
        .limit(limit)
        .all(self.db.as_ref())
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::{executed_sql, points_model, user_model};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_increment_is_a_single_upsert() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = ReferralPointRepository::new(Arc::clone(&db));
        repo.increment("u1").await.unwrap();
        drop(repo);

        let sql = executed_sql(db).unwrap();
        assert_eq!(sql.len(), 1);
        assert!(sql[0].starts_with(r#"INSERT INTO "referral_point""#));
        assert!(sql[0].contains("VALUES ('u1', 1,"));
        assert!(sql[0].contains(r#"ON CONFLICT ("user_id") DO UPDATE SET"#));
        assert!(sql[0].contains(r#""points" = "referral_point"."points" + 1"#));
        assert!(sql[0].contains(r#""updated_at" = "excluded"."updated_at""#));
    }

    #[tokio::test]
    async fn test_create_starts_at_given_points() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = ReferralPointRepository::new(Arc::clone(&db));
        repo.create("u2", 1).await.unwrap();
        drop(repo);

        let sql = executed_sql(db).unwrap();
        assert!(sql[0].contains("VALUES ('u2', 1,"));
        assert!(!sql[0].contains("ON CONFLICT"));
    }

    #[tokio::test]
    async fn test_find_by_user_id() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[points_model("u1", 3)]])
                .into_connection(),
        );

        let repo = ReferralPointRepository::new(db);
        let found = repo.find_by_user_id("u1").await.unwrap();

        assert_eq!(found.map(|p| p.points), Some(3));
    }

    #[tokio::test]
    async fn test_leaderboard() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    (points_model("u1", 5), user_model("u1", "alice", None)),
                    (points_model("u2", 2), user_model("u2", "bob", None)),
                ]])
                .into_connection(),
        );

        let repo = ReferralPointRepository::new(db);
        let entries = repo.leaderboard(&DateRange::default(), 10).await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0.points, 5);
        assert_eq!(
            entries[1].1.as_ref().map(|u| u.username.as_str()),
            Some("bob")
        );
    }
}
