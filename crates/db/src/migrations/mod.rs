//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250701_000001_create_user_table;
mod m20250701_000002_create_friendship_table;
mod m20250701_000003_create_referral_point_table;
mod m20250701_000004_create_network_strength_table;
mod m20250701_000005_create_event_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250701_000001_create_user_table::Migration),
            Box::new(m20250701_000002_create_friendship_table::Migration),
            Box::new(m20250701_000003_create_referral_point_table::Migration),
            Box::new(m20250701_000004_create_network_strength_table::Migration),
            Box::new(m20250701_000005_create_event_table::Migration),
        ]
    }
}
