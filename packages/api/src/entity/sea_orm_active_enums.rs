//! `SeaORM` active enums shared across entities

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Global user role. Admin and Owner unlock cross-user views.
#[derive(
    Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
pub enum UserRole {
    #[sea_orm(string_value = "Member")]
    Member,
    #[sea_orm(string_value = "Admin")]
    Admin,
    #[sea_orm(string_value = "Owner")]
    Owner,
}

impl UserRole {
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::Admin | Self::Owner)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "offer_status")]
pub enum OfferStatus {
    #[sea_orm(string_value = "Active")]
    Active,
    #[sea_orm(string_value = "Paused")]
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "group_status")]
pub enum GroupStatus {
    #[sea_orm(string_value = "Active")]
    Active,
    #[sea_orm(string_value = "Inactive")]
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "ad_status")]
pub enum AdStatus {
    #[sea_orm(string_value = "Running")]
    Running,
    #[sea_orm(string_value = "Paused")]
    Paused,
}

/// Audit-log entry kind for offer mutations.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "report_type")]
pub enum ReportType {
    #[sea_orm(string_value = "Creation")]
    Creation,
    #[sea_orm(string_value = "Update")]
    Update,
    #[sea_orm(string_value = "GroupLink")]
    GroupLink,
}
