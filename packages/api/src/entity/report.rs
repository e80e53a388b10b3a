//! `SeaORM` Entity for the offer audit log
//!
//! Best-effort side channel: writes here are fire-and-forget and never roll
//! back the primary mutation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(schema_name = "public", table_name = "Report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_name = "reportType")]
    pub report_type: super::sea_orm_active_enums::ReportType,
    #[sea_orm(column_name = "offerName", column_type = "Text")]
    pub offer_name: String,
    #[sea_orm(column_type = "Text")]
    pub site: String,
    #[sea_orm(column_type = "Text")]
    pub status: String,
    #[sea_orm(column_name = "groupId", column_type = "Text", nullable)]
    pub group_id: Option<String>,
    /// Actor snapshot {id, username, email}
    #[sea_orm(column_type = "JsonBinary")]
    pub actor: Json,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
