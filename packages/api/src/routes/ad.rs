use axum::{Extension, Json, Router, extract::State, routing::get};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, EntityTrait, QueryFilter,
    QueryOrder,
};
use serde::{Deserialize, Serialize};

use crate::aggregation::to_major;
use crate::entity::sea_orm_active_enums::AdStatus;
use crate::entity::ad;
use crate::error::ApiError;
use crate::middleware::jwt::AuthUser;
use crate::routes::ActorInfo;
use crate::routes::group::groups_for_user;
use crate::state::AppState;
use crate::{bad_request, not_found};

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_ads).post(create_ad).put(update_ad))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdResponse {
    pub id: String,
    pub campaign: String,
    pub platform: String,
    pub site: String,
    pub budget: f64,
    pub leads: i64,
    pub status: AdStatus,
    pub group_id: Option<String>,
    pub created_at: chrono::NaiveDateTime,
    pub created_by: ActorInfo,
}

impl AdResponse {
    fn from_model(ad: ad::Model) -> Self {
        Self {
            id: ad.id,
            campaign: ad.campaign,
            platform: ad.platform,
            site: ad.site,
            budget: to_major(ad.budget_cents),
            leads: ad.leads,
            status: ad.status,
            group_id: ad.group_id,
            created_at: ad.created_at,
            created_by: ActorInfo {
                id: ad.created_by_id,
                username: ad.created_by_username,
                email: ad.created_by_email,
            },
        }
    }
}

/// Campaigns the user created plus those owned by their groups, newest first.
#[tracing::instrument(name = "GET /ads", skip(state, user))]
pub async fn list_ads(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<AdResponse>>, ApiError> {
    let claims = user.claims()?;

    let groups = groups_for_user(&state, &claims.username).await?;
    let group_ids: Vec<String> = groups.into_iter().map(|g| g.id).collect();

    let mut condition = Condition::any().add(ad::Column::CreatedById.eq(&claims.sub));
    if !group_ids.is_empty() {
        condition = condition.add(ad::Column::GroupId.is_in(group_ids));
    }

    let ads = ad::Entity::find()
        .filter(condition)
        .order_by_desc(ad::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(ads.into_iter().map(AdResponse::from_model).collect()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdRequest {
    pub campaign: String,
    pub platform: String,
    pub site: String,
    /// Major units; stored as cents
    pub budget: f64,
    #[serde(default)]
    pub group_id: Option<String>,
}

#[tracing::instrument(name = "POST /ads", skip(state, user, payload))]
pub async fn create_ad(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateAdRequest>,
) -> Result<Json<AdResponse>, ApiError> {
    let claims = user.claims()?;

    let campaign = payload.campaign.trim();
    let platform = payload.platform.trim();
    let site = payload.site.trim();
    if campaign.is_empty() || platform.is_empty() || site.is_empty() || payload.budget <= 0.0 {
        return Err(bad_request!(
            "Required fields: campaign, platform, site, budget"
        ));
    }

    let new_ad = ad::ActiveModel {
        id: Set(selltrack_types::create_id()),
        campaign: Set(campaign.to_string()),
        platform: Set(platform.to_string()),
        site: Set(site.to_string()),
        budget_cents: Set((payload.budget * 100.0).round() as i64),
        leads: Set(0),
        status: Set(AdStatus::Running),
        group_id: Set(payload.group_id),
        created_by_id: Set(claims.sub.clone()),
        created_by_username: Set(claims.username.clone()),
        created_by_email: Set(claims.email.clone()),
        created_at: Set(Utc::now().naive_utc()),
    };
    let created = new_ad.insert(&state.db).await?;

    Ok(Json(AdResponse::from_model(created)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdRequest {
    /// Campaigns are addressed by name, their external identifier
    pub campaign: String,
    #[serde(default)]
    pub status: Option<AdStatus>,
    #[serde(default)]
    pub group_id: Option<String>,
    /// Budget delta in major units, applied atomically
    #[serde(default)]
    pub increment: Option<f64>,
}

#[tracing::instrument(name = "PUT /ads", skip(state, user, payload))]
pub async fn update_ad(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateAdRequest>,
) -> Result<Json<AdResponse>, ApiError> {
    user.claims()?;

    if payload.campaign.is_empty() {
        return Err(bad_request!("Field 'campaign' is required"));
    }

    let mut update =
        ad::Entity::update_many().filter(ad::Column::Campaign.eq(&payload.campaign));
    let mut any_field = false;

    if let Some(status) = payload.status {
        update = update.col_expr(ad::Column::Status, Expr::value(status));
        any_field = true;
    }
    if let Some(group_id) = &payload.group_id {
        update = update.col_expr(ad::Column::GroupId, Expr::value(group_id.clone()));
        any_field = true;
    }
    if let Some(increment) = payload.increment {
        let cents = (increment * 100.0).round() as i64;
        update = update.col_expr(
            ad::Column::BudgetCents,
            Expr::col(ad::Column::BudgetCents).add(cents),
        );
        any_field = true;
    }

    if !any_field {
        return Err(bad_request!("No updatable field present"));
    }

    let result = update.exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(not_found!("Ad not found"));
    }

    let updated = ad::Entity::find()
        .filter(ad::Column::Campaign.eq(&payload.campaign))
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found!("Ad not found"))?;

    Ok(Json(AdResponse::from_model(updated)))
}
