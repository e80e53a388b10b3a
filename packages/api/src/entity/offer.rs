//! `SeaORM` Entity for tracked offers
//!
//! The offer name is the external identifier used by update routes. Sales
//! and revenue fields are derived; only the sync operation writes them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(schema_name = "public", table_name = "Offer")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_type = "Text", unique)]
    pub name: String,
    /// External site this offer tracks; joins sales via their origin site
    #[sea_orm(column_type = "Text")]
    pub site: String,
    pub status: super::sea_orm_active_enums::OfferStatus,
    /// Owning group, when shared
    #[sea_orm(column_name = "groupId", column_type = "Text", nullable)]
    pub group_id: Option<String>,
    #[sea_orm(column_name = "createdById", column_type = "Text")]
    pub created_by_id: String,
    /// Creator snapshot, fixed at creation time
    #[sea_orm(column_name = "createdByUsername", column_type = "Text")]
    pub created_by_username: String,
    #[sea_orm(column_name = "createdByEmail", column_type = "Text")]
    pub created_by_email: String,
    /// Paid sale count, recomputed by sync
    #[sea_orm(column_name = "salesCount")]
    pub sales_count: i64,
    /// Gross revenue in cents, recomputed by sync
    #[sea_orm(column_name = "grossRevenueCents")]
    pub gross_revenue_cents: i64,
    /// Net revenue in cents, recomputed by sync
    #[sea_orm(column_name = "netRevenueCents")]
    pub net_revenue_cents: i64,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedById",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Group,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
