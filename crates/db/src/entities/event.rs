//! Event log entity (append-only record of graph mutations).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of mutation an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// A user registered.
    #[sea_orm(string_value = "register")]
    Register,
    /// A user registered through a referrer.
    #[sea_orm(string_value = "referral")]
    Referral,
    /// A profile was updated.
    #[sea_orm(string_value = "updated")]
    Updated,
    /// A user was deleted.
    #[sea_orm(string_value = "deleted")]
    Deleted,
    /// Two users became friends.
    #[sea_orm(string_value = "addfriend")]
    AddFriend,
    /// Two users stopped being friends.
    #[sea_orm(string_value = "unfriend")]
    Unfriend,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(column_name = "type")]
    pub event_type: EventType,

    /// Free-form payload
    #[sea_orm(column_type = "JsonBinary")]
    pub data: Json,

    pub created_at: DateTimeWithTimeZone,

    /// Always true; nothing consumes the log asynchronously
    #[sea_orm(default_value = true)]
    pub processed: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
