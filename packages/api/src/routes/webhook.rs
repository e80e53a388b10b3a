use crate::{bad_request, entity::sale, error::ApiError, state::AppState};
use axum::{Json, Router, extract::State, routing::post};
use chrono::NaiveDateTime;
use sea_orm::{ActiveValue::Set, EntityTrait, sea_query::OnConflict};
use serde::{Deserialize, Serialize};
use selltrack_types::Value;
use selltrack_types::json::json;

pub fn routes() -> Router<AppState> {
    Router::new().route("/payments", post(payment_webhook))
}

/// Payment processor notification. Amounts are integer minor units.
#[derive(Debug, Deserialize)]
pub struct PaymentNotification {
    pub data: Option<PaymentData>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub total_amount: i64,
    #[serde(default)]
    pub net_amount: i64,
    #[serde(default)]
    pub offer: Option<OfferPayload>,
    #[serde(default)]
    pub buyer: Option<BuyerPayload>,
    #[serde(default)]
    pub tracking: Option<Value>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OfferPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub discount_price: Option<i64>,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct BuyerPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub document: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub ok: bool,
}

fn source_site(tracking: Option<&Value>) -> String {
    tracking
        .and_then(|t| t.get("site"))
        .and_then(|s| s.as_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Processor timestamps arrive as RFC 3339 strings; fall back to the receive
/// time when absent or unparseable.
fn parse_created_at(raw: Option<&str>, fallback: NaiveDateTime) -> NaiveDateTime {
    let Some(raw) = raw else { return fallback };
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|d| d.naive_utc())
        .or_else(|_| raw.parse::<NaiveDateTime>())
        .unwrap_or(fallback)
}

/// Ledger upsert keyed by the processor transaction id.
///
/// Deliveries are at-least-once and possibly out of order. Replays rewrite
/// only `status` and `received_at`; the financial fields, buyer, and offer
/// snapshot are fixed by whichever delivery arrived first. No signature is
/// verified on this boundary.
#[tracing::instrument(name = "POST /webhook/payments", skip(state, payload))]
pub async fn payment_webhook(
    State(state): State<AppState>,
    Json(payload): Json<PaymentNotification>,
) -> Result<Json<WebhookAck>, ApiError> {
    let Some(data) = payload.data else {
        return Err(bad_request!("Invalid payload"));
    };
    let transaction_id = match data.id.as_deref() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => return Err(bad_request!("Invalid payload")),
    };

    let site = source_site(data.tracking.as_ref());
    tracing::info!(transaction_id = %transaction_id, site = %site, "Payment notification received");

    let now = chrono::Utc::now().naive_utc();
    let (offer_name, offer_price_cents, offer_quantity) = match data.offer {
        Some(offer) => (offer.name, offer.discount_price, offer.quantity),
        None => (None, None, 1),
    };
    let buyer = data.buyer.unwrap_or(BuyerPayload {
        name: None,
        email: None,
        phone: None,
        document: None,
    });

    let row = sale::ActiveModel {
        id: Set(selltrack_types::create_id()),
        transaction_id: Set(transaction_id),
        status: Set(data.status.unwrap_or_default()),
        method: Set(data.payment_method),
        total_amount_cents: Set(data.total_amount),
        net_amount_cents: Set(data.net_amount),
        offer_name: Set(offer_name),
        offer_price_cents: Set(offer_price_cents),
        offer_quantity: Set(offer_quantity),
        buyer_name: Set(buyer.name),
        buyer_email: Set(buyer.email),
        buyer_phone: Set(buyer.phone),
        buyer_document: Set(buyer.document),
        tracking: Set(data.tracking.unwrap_or_else(|| json!({}))),
        source_site: Set(site),
        created_at: Set(parse_created_at(data.created_at.as_deref(), now)),
        received_at: Set(now),
    };

    sale::Entity::insert(row)
        .on_conflict(
            OnConflict::column(sale::Column::TransactionId)
                .update_columns([sale::Column::Status, sale::Column::ReceivedAt])
                .to_owned(),
        )
        .exec(&state.db)
        .await?;

    Ok(Json(WebhookAck { ok: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::to_major;

    const SAMPLE: &str = r#"{
        "event": "transaction.updated",
        "data": {
            "id": "tx_01",
            "status": "approved",
            "payment_method": "pix",
            "total_amount": 10000,
            "net_amount": 9200,
            "offer": { "name": "Starter", "discount_price": 10000, "quantity": 2 },
            "buyer": { "name": "Alice", "email": "alice@example.com" },
            "tracking": { "site": "sitex", "utm_source": "ads" },
            "created_at": "2026-01-05T10:00:00Z"
        }
    }"#;

    #[test]
    fn parses_processor_payload() {
        let payload: PaymentNotification = selltrack_types::json::from_str(SAMPLE).unwrap();
        let data = payload.data.unwrap();
        assert_eq!(data.id.as_deref(), Some("tx_01"));
        assert_eq!(data.status.as_deref(), Some("approved"));
        assert_eq!(data.total_amount, 10_000);
        // 10000 minor units are 100.00 in major units
        assert_eq!(to_major(data.total_amount), 100.0);
        assert_eq!(data.offer.unwrap().quantity, 2);
        assert_eq!(source_site(data.tracking.as_ref()), "sitex");
    }

    #[test]
    fn missing_tracking_site_falls_back_to_unknown() {
        let payload: PaymentNotification =
            selltrack_types::json::from_str(r#"{"data": {"id": "tx_02"}}"#).unwrap();
        let data = payload.data.unwrap();
        assert_eq!(source_site(data.tracking.as_ref()), "unknown");
        assert_eq!(data.total_amount, 0);
    }

    #[test]
    fn offer_quantity_defaults_to_one() {
        let payload: PaymentNotification = selltrack_types::json::from_str(
            r#"{"data": {"id": "tx_03", "offer": {"name": "Starter"}}}"#,
        )
        .unwrap();
        assert_eq!(payload.data.unwrap().offer.unwrap().quantity, 1);
    }

    #[test]
    fn created_at_parses_rfc3339_with_fallback() {
        let fallback: NaiveDateTime = "2026-02-01T00:00:00".parse().unwrap();
        let parsed = parse_created_at(Some("2026-01-05T10:00:00Z"), fallback);
        assert_eq!(parsed, "2026-01-05T10:00:00".parse::<NaiveDateTime>().unwrap());
        assert_eq!(parse_created_at(Some("not a date"), fallback), fallback);
        assert_eq!(parse_created_at(None, fallback), fallback);
    }
}
