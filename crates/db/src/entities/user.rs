//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub email: String,

    #[sea_orm(unique)]
    pub username: String,

    pub first_name: String,

    pub last_name: String,

    /// Profile description
    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,

    /// Avatar URL
    #[sea_orm(nullable)]
    pub avatar: Option<String>,

    /// The user who referred this one. Set once at registration; the
    /// referral links form a forest.
    #[sea_orm(nullable)]
    pub referred_by_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ReferredById",
        to = "Column::Id",
        on_delete = "SetNull"
    )]
    ReferredBy,

    #[sea_orm(has_many = "super::friendship::Entity")]
    Friendships,

    #[sea_orm(has_one = "super::referral_point::Entity")]
    ReferralPoint,

    #[sea_orm(has_one = "super::network_strength::Entity")]
    NetworkStrength,
}

impl Related<super::friendship::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Friendships.def()
    }
}

impl Related<super::referral_point::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReferralPoint.def()
    }
}

impl Related<super::network_strength::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::NetworkStrength.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
