//! Referral point service.

use bacefook_common::AppResult;
use bacefook_db::repositories::{ReferralPointRepository, UserRepository};

/// Points a new user starts with.
pub const JOIN_BONUS: i32 = 1;

/// Referral point service.
///
/// Registration grants the new user [`JOIN_BONUS`], then one point to its
/// referrer and one to the referrer's own referrer. Nothing beyond the
/// second level is rewarded.
#[derive(Clone)]
pub struct ReferralPointService {
    point_repo: ReferralPointRepository,
    user_repo: UserRepository,
}

impl ReferralPointService {
    /// Create a new referral point service.
    #[must_use]
    pub const fn new(point_repo: ReferralPointRepository, user_repo: UserRepository) -> Self {
        Self {
            point_repo,
            user_repo,
        }
    }

    /// Award the points due for the registration of `new_user_id`.
    ///
    /// Fails if `new_user_id` already has a counter.
    pub async fn award_referral_points(
        &self,
        new_user_id: &str,
        referrer_id: Option<&str>,
    ) -> AppResult<()> {
        self.point_repo.create(new_user_id, JOIN_BONUS).await?;

        let Some(referrer_id) = referrer_id else {
            return Ok(());
        };

        self.point_repo.increment(referrer_id).await?;

        let grand_referrer = self
            .user_repo
            .find_by_id(referrer_id)
            .await?
            .and_then(|referrer| referrer.referred_by_id);

        if let Some(ref grand_referrer_id) = grand_referrer {
            self.point_repo.increment(grand_referrer_id).await?;
        }

        tracing::debug!(
            user_id = %new_user_id,
            referrer_id = %referrer_id,
            grand_referrer_id = ?grand_referrer,
            "Awarded referral points"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bacefook_common::AppError;
    use bacefook_db::{
        entities::user,
        test_utils::{executed_sql, user_model},
    };
    use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn exec_ok(n: usize) -> Vec<MockExecResult> {
        (0..n)
            .map(|_| MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            })
            .collect()
    }

    fn connection(db: MockDatabase) -> Arc<DatabaseConnection> {
        Arc::new(db.into_connection())
    }

    /// Award points for `new_user_id` and return the point writes issued.
    async fn point_writes(
        point_db: MockDatabase,
        user_db: MockDatabase,
        new_user_id: &str,
        referrer_id: Option<&str>,
    ) -> AppResult<Vec<String>> {
        let point_conn = connection(point_db);
        let service = ReferralPointService::new(
            ReferralPointRepository::new(Arc::clone(&point_conn)),
            UserRepository::new(connection(user_db)),
        );

        service
            .award_referral_points(new_user_id, referrer_id)
            .await?;
        drop(service);

        Ok(executed_sql(point_conn).unwrap())
    }

    fn assert_join_bonus(sql: &str, user_id: &str) {
        assert!(sql.contains(&format!("VALUES ('{user_id}', 1,")), "{sql}");
        assert!(!sql.contains("ON CONFLICT"), "{sql}");
    }

    fn assert_increment(sql: &str, user_id: &str) {
        assert!(sql.contains(&format!("VALUES ('{user_id}', 1,")), "{sql}");
        assert!(sql.contains(r#""points" = "referral_point"."points" + 1"#), "{sql}");
    }

    #[tokio::test]
    async fn test_no_referrer_only_creates_own_counter() {
        let writes = point_writes(
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results(exec_ok(1)),
            MockDatabase::new(DatabaseBackend::Postgres),
            "u1",
            None,
        )
        .await
        .unwrap();

        assert_eq!(writes.len(), 1);
        assert_join_bonus(&writes[0], "u1");
    }

    #[tokio::test]
    async fn test_three_user_chain_rewards_each_ancestor_once() {
        // u1 registers alone: u1 = 1
        let writes = point_writes(
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results(exec_ok(1)),
            MockDatabase::new(DatabaseBackend::Postgres),
            "u1",
            None,
        )
        .await
        .unwrap();
        assert_eq!(writes.len(), 1);
        assert_join_bonus(&writes[0], "u1");

        // u2 registers through u1: u2 = 1, u1 = 2
        let writes = point_writes(
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results(exec_ok(2)),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user_model("u1", "alice", None)]]),
            "u2",
            Some("u1"),
        )
        .await
        .unwrap();
        assert_eq!(writes.len(), 2);
        assert_join_bonus(&writes[0], "u2");
        assert_increment(&writes[1], "u1");

        // u3 registers through u2: u3 = 1, u2 = 2, u1 = 3
        let writes = point_writes(
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results(exec_ok(3)),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user_model("u2", "bob", Some("u1"))]]),
            "u3",
            Some("u2"),
        )
        .await
        .unwrap();
        assert_eq!(writes.len(), 3);
        assert_join_bonus(&writes[0], "u3");
        assert_increment(&writes[1], "u2");
        assert_increment(&writes[2], "u1");
    }

    #[tokio::test]
    async fn test_propagation_stops_at_second_level() {
        // u3 was referred by u2, who was referred by u1. Registering u4
        // through u3 rewards u3 and u2 only.
        let writes = point_writes(
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results(exec_ok(4)),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user_model("u3", "carol", Some("u2"))]]),
            "u4",
            Some("u3"),
        )
        .await
        .unwrap();

        assert_eq!(writes.len(), 3);
        assert_increment(&writes[1], "u3");
        assert_increment(&writes[2], "u2");
        assert!(writes.iter().all(|sql| !sql.contains("'u1'")));
    }

    #[tokio::test]
    async fn test_missing_referrer_row_still_rewards_first_level() {
        let writes = point_writes(
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results(exec_ok(2)),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
            "u2",
            Some("gone"),
        )
        .await
        .unwrap();

        assert_eq!(writes.len(), 2);
        assert_increment(&writes[1], "gone");
    }

    #[tokio::test]
    async fn test_duplicate_counter_propagates_error() {
        let result = point_writes(
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_errors([DbErr::Custom(
                "duplicate key value violates unique constraint".to_string(),
            )]),
            MockDatabase::new(DatabaseBackend::Postgres),
            "u1",
            None,
        )
        .await;

        assert!(matches!(result, Err(AppError::Database(_))));
    }
}
