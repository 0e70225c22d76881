//! Test utilities for database operations.
//!
//! Live-database helpers for the ignored integration tests, plus model
//! builders shared by the mock-database unit tests of this crate and
//! `bacefook-core`.

use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement};
use tracing::info;

use crate::entities::{event, network_strength, referral_point, user};

/// Tables in child-to-parent order, so truncation never trips a foreign key.
const TABLES: [&str; 5] = [
    "event",
    "network_strength",
    "referral_point",
    "friendship",
    "user",
];

/// Test database configuration, read from `TEST_DB_*` variables.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| fallback.to_string())
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: env_or("TEST_DB_HOST", "localhost"),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: env_or("TEST_DB_USER", "bacefook_test"),
            password: env_or("TEST_DB_PASSWORD", "bacefook_test"),
            database: env_or("TEST_DB_NAME", "bacefook_test"),
        }
    }
}

impl TestDbConfig {
    /// Get the database URL.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

/// A migrated test database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: DatabaseConnection,
    /// Database configuration.
    pub config: TestDbConfig,
}

impl TestDatabase {
    /// Connect with the default configuration and run all migrations.
    pub async fn new() -> Result<Self, DbErr> {
        Self::with_config(TestDbConfig::default()).await
    }

    /// Connect with a custom configuration and run all migrations.
    pub async fn with_config(config: TestDbConfig) -> Result<Self, DbErr> {
        use sea_orm_migration::MigratorTrait;

        let conn = Database::connect(&config.database_url()).await?;
        crate::migrations::Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Connected to migrated test database");

        Ok(Self { conn, config })
    }

    /// Get the database connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Remove every row from the application tables.
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        let tables = TABLES
            .iter()
            .map(|t| format!("\"{t}\""))
            .collect::<Vec<_>>()
            .join(", ");

        self.conn
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("TRUNCATE TABLE {tables} CASCADE"),
            ))
            .await?;

        info!("Cleaned up test database");
        Ok(())
    }
}

/// Build a user model with derived profile fields.
#[must_use]
pub fn user_model(id: &str, username: &str, referred_by_id: Option<&str>) -> user::Model {
    user_model_at(id, username, referred_by_id, Utc::now())
}

/// Build a user model created at a fixed instant.
#[must_use]
pub fn user_model_at(
    id: &str,
    username: &str,
    referred_by_id: Option<&str>,
    created_at: DateTime<Utc>,
) -> user::Model {
    let mut name = username.chars();
    let first_name = name
        .next()
        .map(|c| c.to_uppercase().chain(name).collect())
        .unwrap_or_default();

    user::Model {
        id: id.to_string(),
        email: format!("{username}@example.com"),
        username: username.to_string(),
        first_name,
        last_name: "Tester".to_string(),
        bio: None,
        avatar: None,
        referred_by_id: referred_by_id.map(str::to_string),
        created_at: created_at.into(),
        updated_at: created_at.into(),
    }
}

/// Build a referral point row.
#[must_use]
pub fn points_model(user_id: &str, points: i32) -> referral_point::Model {
    referral_point::Model {
        user_id: user_id.to_string(),
        points,
        created_at: Utc::now().into(),
        updated_at: Utc::now().into(),
    }
}

/// Build a network strength row.
#[must_use]
pub fn strength_model(user_id: &str, strength: i32) -> network_strength::Model {
    network_strength::Model {
        user_id: user_id.to_string(),
        strength,
        calculated_at: Utc::now().into(),
    }
}

/// Build an event row.
#[must_use]
pub fn event_model(
    id: &str,
    event_type: event::EventType,
    data: serde_json::Value,
    created_at: DateTime<Utc>,
) -> event::Model {
    event::Model {
        id: id.to_string(),
        event_type,
        data,
        created_at: created_at.into(),
        processed: true,
    }
}

/// SQL run on a mock connection so far, parameters inlined, in order.
///
/// Returns `None` while any repository still holds a clone of `db`.
#[cfg(any(test, feature = "test-utils"))]
#[must_use]
pub fn executed_sql(db: std::sync::Arc<DatabaseConnection>) -> Option<Vec<String>> {
    let log = std::sync::Arc::try_unwrap(db).ok()?.into_transaction_log();
    Some(
        log.iter()
            .flat_map(|transaction| transaction.statements().iter().map(ToString::to_string))
            .collect(),
    )
}
