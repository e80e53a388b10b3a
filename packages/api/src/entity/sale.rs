//! `SeaORM` Entity for the sale ledger
//!
//! One row per external transaction id. Webhook replays update only `status`
//! and `received_at`; every other field is fixed at first insert. Amounts are
//! minor units (cents) exactly as delivered by the processor.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(schema_name = "public", table_name = "Sale")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    /// Processor transaction id, the ledger's unique key
    #[sea_orm(column_name = "transactionId", column_type = "Text", unique)]
    pub transaction_id: String,
    /// Processor-controlled status string (pending/paid/failed/...)
    #[sea_orm(column_type = "Text")]
    pub status: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub method: Option<String>,
    #[sea_orm(column_name = "totalAmountCents")]
    pub total_amount_cents: i64,
    #[sea_orm(column_name = "netAmountCents")]
    pub net_amount_cents: i64,
    /// Offer snapshot carried by the payment event
    #[sea_orm(column_name = "offerName", column_type = "Text", nullable)]
    pub offer_name: Option<String>,
    #[sea_orm(column_name = "offerPriceCents", nullable)]
    pub offer_price_cents: Option<i64>,
    #[sea_orm(column_name = "offerQuantity")]
    pub offer_quantity: i32,
    #[sea_orm(column_name = "buyerName", column_type = "Text", nullable)]
    pub buyer_name: Option<String>,
    #[sea_orm(column_name = "buyerEmail", column_type = "Text", nullable)]
    pub buyer_email: Option<String>,
    #[sea_orm(column_name = "buyerPhone", column_type = "Text", nullable)]
    pub buyer_phone: Option<String>,
    #[sea_orm(column_name = "buyerDocument", column_type = "Text", nullable)]
    pub buyer_document: Option<String>,
    /// Raw tracking object from the checkout
    #[sea_orm(column_type = "JsonBinary")]
    pub tracking: Json,
    /// Origin site, extracted from tracking at receive time
    #[sea_orm(column_name = "sourceSite", column_type = "Text")]
    pub source_site: String,
    /// Processor-side creation time, fixed at first delivery
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
    /// Latest delivery time, rewritten on every replay
    #[sea_orm(column_name = "receivedAt")]
    pub received_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
