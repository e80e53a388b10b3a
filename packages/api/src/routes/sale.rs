use axum::{Extension, Json, Router, extract::State, routing::get};
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use utoipa::ToSchema;

use crate::aggregation::{
    commission_cents, merge_percentages, monthly_buckets, summarize, to_major,
};
use crate::entity::sale;
use crate::error::ApiError;
use crate::middleware::jwt::{AuthUser, Claims};
use crate::routes::group::groups_for_user;
use crate::routes::offer::offers_for_user;
use crate::state::AppState;
use selltrack_types::Value;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sales))
        .route("/summary", get(sales_summary))
        .route("/monthly", get(monthly_revenue))
        .route("/all", get(list_all_sales))
}

/// The sites visible to a user: one per offer they own or share via a group.
async fn resolve_sites(
    state: &AppState,
    claims: &Claims,
) -> Result<(Vec<String>, std::collections::HashMap<String, f64>), ApiError> {
    let groups = groups_for_user(state, &claims.username).await?;
    let percentages = merge_percentages(&groups, &claims.username);
    let offers = offers_for_user(state, claims, &groups).await?;
    let sites = offers.into_iter().map(|o| o.site).collect();
    Ok((sites, percentages))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleOfferInfo {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleBuyerInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub document: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleResponse {
    pub id: String,
    pub transaction_id: String,
    pub status: String,
    pub method: Option<String>,
    pub total_amount: f64,
    pub net_amount: f64,
    pub offer: SaleOfferInfo,
    pub buyer: SaleBuyerInfo,
    pub tracking: Value,
    pub source_site: String,
    pub created_at: chrono::NaiveDateTime,
    pub received_at: chrono::NaiveDateTime,
    /// The viewing user's share of the net amount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission: Option<f64>,
}

impl SaleResponse {
    fn from_model(sale: sale::Model, commission: Option<i64>) -> Self {
        Self {
            id: sale.id,
            transaction_id: sale.transaction_id,
            status: sale.status,
            method: sale.method,
            total_amount: to_major(sale.total_amount_cents),
            net_amount: to_major(sale.net_amount_cents),
            offer: SaleOfferInfo {
                name: sale.offer_name,
                price: sale.offer_price_cents.map(to_major),
                quantity: sale.offer_quantity,
            },
            buyer: SaleBuyerInfo {
                name: sale.buyer_name,
                email: sale.buyer_email,
                phone: sale.buyer_phone,
                document: sale.buyer_document,
            },
            tracking: sale.tracking,
            source_site: sale.source_site,
            created_at: sale.created_at,
            received_at: sale.received_at,
            commission: commission.map(to_major),
        }
    }
}

/// Every sale on the user's sites, annotated with their commission.
#[tracing::instrument(name = "GET /sales", skip(state, user))]
pub async fn list_sales(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<SaleResponse>>, ApiError> {
    let claims = user.claims()?;

    let (sites, percentages) = resolve_sites(&state, claims).await?;
    if sites.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let sales = sale::Entity::find()
        .filter(sale::Column::SourceSite.is_in(sites))
        .order_by_desc(sale::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(
        sales
            .into_iter()
            .map(|s| {
                let percent = percentages.get(&s.source_site.to_lowercase()).copied();
                let commission = commission_cents(s.net_amount_cents, percent);
                SaleResponse::from_model(s, Some(commission))
            })
            .collect(),
    ))
}

#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub paid: f64,
    pub pending: f64,
    pub total: f64,
    pub net: f64,
    pub count_paid: u64,
    pub count_pending: u64,
    pub total_count: u64,
}

#[utoipa::path(
    get,
    path = "/sales/summary",
    tag = "sales",
    responses(
        (status = 200, description = "Per-status totals over the user's sites", body = SummaryResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[tracing::instrument(name = "GET /sales/summary", skip(state, user))]
pub async fn sales_summary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let claims = user.claims()?;

    let (sites, _) = resolve_sites(&state, claims).await?;
    if sites.is_empty() {
        return Ok(Json(SummaryResponse::default()));
    }

    let sales = sale::Entity::find()
        .filter(sale::Column::SourceSite.is_in(sites))
        .all(&state.db)
        .await?;

    let totals = summarize(&sales);

    Ok(Json(SummaryResponse {
        paid: to_major(totals.paid_cents),
        pending: to_major(totals.pending_cents),
        total: to_major(totals.total_cents()),
        net: to_major(totals.net_cents),
        count_paid: totals.count_paid,
        count_pending: totals.count_pending,
        total_count: totals.total_count,
    }))
}

#[derive(Debug, Serialize)]
pub struct MonthlyRevenueEntry {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub net: f64,
}

/// Net revenue on the user's sites bucketed into the trailing six months.
#[tracing::instrument(name = "GET /sales/monthly", skip(state, user))]
pub async fn monthly_revenue(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<MonthlyRevenueEntry>>, ApiError> {
    let claims = user.claims()?;

    let (sites, _) = resolve_sites(&state, claims).await?;
    if sites.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let sales = sale::Entity::find()
        .filter(sale::Column::SourceSite.is_in(sites))
        .all(&state.db)
        .await?;

    let buckets = monthly_buckets(&sales, 6, Utc::now().date_naive());

    Ok(Json(
        buckets
            .into_iter()
            .map(|b| MonthlyRevenueEntry {
                year: b.year,
                month: b.month,
                label: b.label,
                net: to_major(b.net_cents),
            })
            .collect(),
    ))
}

/// Every paid sale across all sites. Admin and Owner only.
#[tracing::instrument(name = "GET /sales/all", skip(state, user))]
pub async fn list_all_sales(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<SaleResponse>>, ApiError> {
    user.require_privileged()?;

    let sales = sale::Entity::find()
        .filter(sale::Column::Status.eq("paid"))
        .order_by_desc(sale::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(
        sales
            .into_iter()
            .map(|s| SaleResponse::from_model(s, None))
            .collect(),
    ))
}
