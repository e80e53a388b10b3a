use axum::{
    Extension, Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::Utc;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};

use crate::aggregation::to_major;
use crate::entity::sea_orm_active_enums::{OfferStatus, ReportType};
use crate::entity::{group, offer, report, sale};
use crate::error::ApiError;
use crate::middleware::jwt::{AuthUser, Claims};
use crate::routes::ActorInfo;
use crate::routes::group::groups_for_user;
use crate::state::AppState;
use crate::{bad_request, not_found};
use selltrack_types::json::to_value;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_offers).post(create_offer).put(update_offer))
        .route("/sync", post(sync_offers))
}

/// Offers the user may see: their own plus anything owned by a group they
/// belong to, newest first.
pub(crate) async fn offers_for_user(
    state: &AppState,
    claims: &Claims,
    groups: &[group::Model],
) -> Result<Vec<offer::Model>, ApiError> {
    let group_ids: Vec<String> = groups.iter().map(|g| g.id.clone()).collect();

    let mut condition = Condition::any().add(offer::Column::CreatedById.eq(&claims.sub));
    if !group_ids.is_empty() {
        condition = condition.add(offer::Column::GroupId.is_in(group_ids));
    }

    let offers = offer::Entity::find()
        .filter(condition)
        .order_by_desc(offer::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(offers)
}

/// Audit entries are best-effort: a failed write is logged and swallowed,
/// never rolling back the offer mutation it describes.
async fn append_report(
    state: &AppState,
    report_type: ReportType,
    offer: &offer::Model,
    actor: ActorInfo,
) {
    let entry = report::ActiveModel {
        id: Set(selltrack_types::create_id()),
        report_type: Set(report_type),
        offer_name: Set(offer.name.clone()),
        site: Set(offer.site.clone()),
        status: Set(offer.status.to_value()),
        group_id: Set(offer.group_id.clone()),
        actor: Set(to_value(actor).unwrap_or_default()),
        created_at: Set(Utc::now().naive_utc()),
    };
    if let Err(err) = entry.insert(&state.db).await {
        tracing::warn!(error = ?err, offer = %offer.name, "Failed to append offer report");
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferResponse {
    pub id: String,
    pub name: String,
    pub site: String,
    pub status: OfferStatus,
    pub group_id: Option<String>,
    /// Paid sale count as of the last sync
    pub sales: i64,
    pub gross_revenue: f64,
    pub net_revenue: f64,
    pub created_at: chrono::NaiveDateTime,
    pub created_by: ActorInfo,
}

impl OfferResponse {
    pub(crate) fn from_model(offer: offer::Model) -> Self {
        Self {
            id: offer.id,
            name: offer.name,
            site: offer.site,
            status: offer.status,
            group_id: offer.group_id,
            sales: offer.sales_count,
            gross_revenue: to_major(offer.gross_revenue_cents),
            net_revenue: to_major(offer.net_revenue_cents),
            created_at: offer.created_at,
            created_by: ActorInfo {
                id: offer.created_by_id,
                username: offer.created_by_username,
                email: offer.created_by_email,
            },
        }
    }
}

#[tracing::instrument(name = "GET /offers", skip(state, user))]
pub async fn list_offers(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<OfferResponse>>, ApiError> {
    let claims = user.claims()?;

    let groups = groups_for_user(&state, &claims.username).await?;
    let offers = offers_for_user(&state, claims, &groups).await?;

    Ok(Json(
        offers.into_iter().map(OfferResponse::from_model).collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct CreateOfferRequest {
    pub name: String,
    pub site: String,
}

#[tracing::instrument(name = "POST /offers", skip(state, user, payload))]
pub async fn create_offer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateOfferRequest>,
) -> Result<Json<OfferResponse>, ApiError> {
    let claims = user.claims()?;

    let name = payload.name.trim();
    let site = payload.site.trim();
    if name.is_empty() || site.is_empty() {
        return Err(bad_request!("Required fields: name and site"));
    }

    let existing = offer::Entity::find()
        .filter(offer::Column::Name.eq(name))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::conflict("Offer name already taken"));
    }

    let new_offer = offer::ActiveModel {
        id: Set(selltrack_types::create_id()),
        name: Set(name.to_string()),
        site: Set(site.to_string()),
        status: Set(OfferStatus::Active),
        group_id: Set(None),
        created_by_id: Set(claims.sub.clone()),
        created_by_username: Set(claims.username.clone()),
        created_by_email: Set(claims.email.clone()),
        sales_count: Set(0),
        gross_revenue_cents: Set(0),
        net_revenue_cents: Set(0),
        created_at: Set(Utc::now().naive_utc()),
    };
    let created = new_offer.insert(&state.db).await?;

    append_report(&state, ReportType::Creation, &created, ActorInfo::from(claims)).await;

    Ok(Json(OfferResponse::from_model(created)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOfferRequest {
    /// Offers are addressed by name, their external identifier
    pub name: String,
    #[serde(default)]
    pub status: Option<OfferStatus>,
    #[serde(default)]
    pub group_id: Option<String>,
}

#[tracing::instrument(name = "PUT /offers", skip(state, user, payload))]
pub async fn update_offer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateOfferRequest>,
) -> Result<Json<OfferResponse>, ApiError> {
    let claims = user.claims()?;

    if payload.name.is_empty() {
        return Err(bad_request!("Field 'name' is required"));
    }
    if payload.status.is_none() && payload.group_id.is_none() {
        return Err(bad_request!("No updatable field present"));
    }

    let offer = offer::Entity::find()
        .filter(offer::Column::Name.eq(&payload.name))
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found!("Offer not found"))?;

    let linking_group = payload.group_id.is_some();

    let mut active = offer.into_active_model();
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    if let Some(group_id) = payload.group_id {
        active.group_id = Set(Some(group_id));
    }
    let updated = active.update(&state.db).await?;

    let report_type = if linking_group {
        ReportType::GroupLink
    } else {
        ReportType::Update
    };
    append_report(&state, report_type, &updated, ActorInfo::from(claims)).await;

    Ok(Json(OfferResponse::from_model(updated)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferSyncEntry {
    pub offer: String,
    pub site: String,
    pub sales: i64,
    pub gross_revenue: f64,
    pub net_revenue: f64,
}

#[derive(Debug, Serialize)]
pub struct SyncOffersResponse {
    pub success: bool,
    pub updates: Vec<OfferSyncEntry>,
}

/// Recompute the derived sales fields of every offer the caller created from
/// the paid entries of the ledger.
#[tracing::instrument(name = "POST /offers/sync", skip(state, user))]
pub async fn sync_offers(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SyncOffersResponse>, ApiError> {
    let claims = user.claims()?;

    let offers = offer::Entity::find()
        .filter(offer::Column::CreatedById.eq(&claims.sub))
        .all(&state.db)
        .await?;

    let mut updates = Vec::with_capacity(offers.len());

    for offer_model in offers {
        let paid_sales = sale::Entity::find()
            .filter(sale::Column::SourceSite.eq(&offer_model.site))
            .filter(sale::Column::Status.eq("paid"))
            .all(&state.db)
            .await?;

        let sales_count = paid_sales.len() as i64;
        let gross_cents: i64 = paid_sales.iter().map(|s| s.total_amount_cents).sum();
        let net_cents: i64 = paid_sales.iter().map(|s| s.net_amount_cents).sum();

        let name = offer_model.name.clone();
        let site = offer_model.site.clone();

        let mut active = offer_model.into_active_model();
        active.sales_count = Set(sales_count);
        active.gross_revenue_cents = Set(gross_cents);
        active.net_revenue_cents = Set(net_cents);
        active.update(&state.db).await?;

        updates.push(OfferSyncEntry {
            offer: name,
            site,
            sales: sales_count,
            gross_revenue: to_major(gross_cents),
            net_revenue: to_major(net_cents),
        });
    }

    Ok(Json(SyncOffersResponse {
        success: true,
        updates,
    }))
}
