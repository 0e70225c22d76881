//! Network strength repository.

use std::sync::Arc;

use super::within;
use crate::entities::{NetworkStrength, User, network_strength, user};
use bacefook_common::{AppError, AppResult, DateRange};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    sea_query::OnConflict,
};

/// Network strength repository for database operations.
#[derive(Clone)]
pub struct NetworkStrengthRepository {
    db: Arc<DatabaseConnection>,
}

impl NetworkStrengthRepository {
    /// Create a new network strength repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Store `strength` for `user_id`, replacing any previous value.
    pub async fn upsert(&self, user_id: &str, strength: i32) -> AppResult<()> {
        let model = network_strength::ActiveModel {
            user_id: Set(user_id.to_string()),
            strength: Set(strength),
            calculated_at: Set(Utc::now().into()),
        };

        NetworkStrength::insert(model)
            .on_conflict(
                OnConflict::column(network_strength::Column::UserId)
                    .update_columns([
                        network_strength::Column::Strength,
                        network_strength::Column::CalculatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Find the cached strength of a user.
    pub async fn find_by_user_id(
        &self,
        user_id: &str,
    ) -> AppResult<Option<network_strength::Model>> {
        NetworkStrength::find_by_id(user_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the cached strengths of several users.
    pub async fn find_by_user_ids(
        &self,
        user_ids: &[String],
    ) -> AppResult<Vec<network_strength::Model>> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        NetworkStrength::find()
            .filter(network_strength::Column::UserId.is_in(user_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Strongest users computed inside `range`, ties by user ID.
    pub async fn leaderboard(
        &self,
        range: &DateRange,
        limit: u64,
    ) -> AppResult<Vec<(network_strength::Model, Option<user::Model>)>> {
        within(
            NetworkStrength::find(),
            network_strength::Column::CalculatedAt,
            range,
        )
        .find_also_related(User)
        .order_by_desc(network_strength::Column::Strength)
        .order_by_asc(network_strength::Column::UserId)
        .limit(limit)
        .all(self.db.as_ref())
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }
}
