use std::collections::HashMap;

use axum::http::StatusCode;
use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    routing::get,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder,
};
use serde::{Deserialize, Serialize};

use crate::entity::sea_orm_active_enums::GroupStatus;
use crate::entity::{group, group_member, offer};
use crate::error::ApiError;
use crate::middleware::jwt::AuthUser;
use crate::routes::offer::OfferResponse;
use crate::state::AppState;
use crate::{bad_request, not_found};
use selltrack_types::json::{Map, json};
use selltrack_types::Value;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_groups).post(create_group))
        .route(
            "/{name}",
            get(get_group).put(update_group).delete(delete_group),
        )
}

/// Groups the username belongs to, newest first. This ordering is also the
/// merge order for conflicting commission percentages (last one wins).
pub(crate) async fn groups_for_user(
    state: &AppState,
    username: &str,
) -> Result<Vec<group::Model>, ApiError> {
    let memberships = group_member::Entity::find()
        .filter(group_member::Column::Username.eq(username))
        .all(&state.db)
        .await?;

    let group_ids: Vec<String> = memberships.into_iter().map(|m| m.group_id).collect();
    if group_ids.is_empty() {
        return Ok(Vec::new());
    }

    let groups = group::Entity::find()
        .filter(group::Column::Id.is_in(group_ids))
        .order_by_desc(group::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(groups)
}

async fn members_by_group(
    state: &AppState,
    group_ids: Vec<String>,
) -> Result<HashMap<String, Vec<String>>, ApiError> {
    let mut members: HashMap<String, Vec<String>> = HashMap::new();
    if group_ids.is_empty() {
        return Ok(members);
    }
    let rows = group_member::Entity::find()
        .filter(group_member::Column::GroupId.is_in(group_ids))
        .all(&state.db)
        .await?;
    for row in rows {
        members.entry(row.group_id).or_default().push(row.username);
    }
    Ok(members)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    pub id: String,
    pub name: String,
    pub image: String,
    pub status: GroupStatus,
    pub members: Vec<String>,
    pub percentages: Value,
    pub created_at: chrono::NaiveDateTime,
}

impl GroupResponse {
    fn from_model(group: group::Model, members: Vec<String>) -> Self {
        Self {
            id: group.id,
            name: group.name,
            image: group.image,
            status: group.status,
            members,
            percentages: group.percentages,
            created_at: group.created_at,
        }
    }
}

#[tracing::instrument(name = "GET /groups", skip(state, user))]
pub async fn list_groups(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<GroupResponse>>, ApiError> {
    let claims = user.claims()?;

    let groups = groups_for_user(&state, &claims.username).await?;
    let mut members =
        members_by_group(&state, groups.iter().map(|g| g.id.clone()).collect()).await?;

    Ok(Json(
        groups
            .into_iter()
            .map(|g| {
                let group_members = members.remove(&g.id).unwrap_or_default();
                GroupResponse::from_model(g, group_members)
            })
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub members: Option<Vec<String>>,
}

#[tracing::instrument(name = "POST /groups", skip(state, user, payload))]
pub async fn create_group(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), ApiError> {
    let claims = user.claims()?;

    if payload.name.is_empty() {
        return Err(bad_request!("Name is required"));
    }

    let existing = group::Entity::find()
        .filter(group::Column::Name.eq(&payload.name))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::conflict("Group name already taken"));
    }

    let now = Utc::now().naive_utc();
    let group_id = selltrack_types::create_id();

    let new_group = group::ActiveModel {
        id: Set(group_id.clone()),
        name: Set(payload.name.clone()),
        image: Set(payload.image.unwrap_or_default()),
        status: Set(GroupStatus::Active),
        percentages: Set(json!({})),
        created_at: Set(now),
    };
    let created = new_group.insert(&state.db).await?;

    // The creator becomes the first member unless an explicit list was given.
    let members = match payload.members {
        Some(members) if !members.is_empty() => members,
        _ => vec![claims.username.clone()],
    };

    for username in &members {
        let row = group_member::ActiveModel {
            id: Set(selltrack_types::create_id()),
            group_id: Set(group_id.clone()),
            username: Set(username.clone()),
            created_at: Set(now),
        };
        row.insert(&state.db).await?;
    }

    Ok((
        StatusCode::CREATED,
        Json(GroupResponse::from_model(created, members)),
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDetailResponse {
    #[serde(flatten)]
    pub group: GroupResponse,
    pub offers: Vec<OfferResponse>,
}

/// Public lookup by group name; also lists the offers linked to the group.
#[tracing::instrument(name = "GET /groups/{name}", skip(state))]
pub async fn get_group(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<GroupDetailResponse>, ApiError> {
    let group = group::Entity::find()
        .filter(group::Column::Name.eq(&name))
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found!("Group not found"))?;

    let members = members_by_group(&state, vec![group.id.clone()])
        .await?
        .remove(&group.id)
        .unwrap_or_default();

    let offers = offer::Entity::find()
        .filter(offer::Column::GroupId.eq(&group.id))
        .all(&state.db)
        .await?
        .into_iter()
        .map(OfferResponse::from_model)
        .collect();

    Ok(Json(GroupDetailResponse {
        group: GroupResponse::from_model(group, members),
        offers,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroupRequest {
    pub action: String,
    #[serde(default)]
    pub member: Option<String>,
    #[serde(default)]
    pub offer_id: Option<String>,
    #[serde(default)]
    pub percent: Option<f64>,
}

#[tracing::instrument(name = "PUT /groups/{name}", skip(state, user, payload))]
pub async fn update_group(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(name): Path<String>,
    Json(payload): Json<UpdateGroupRequest>,
) -> Result<Json<GroupResponse>, ApiError> {
    user.claims()?;

    let group = group::Entity::find()
        .filter(group::Column::Name.eq(&name))
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found!("Group not found"))?;

    match (payload.action.as_str(), &payload.member) {
        ("add", Some(member)) => {
            let existing = group_member::Entity::find()
                .filter(group_member::Column::GroupId.eq(&group.id))
                .filter(group_member::Column::Username.eq(member))
                .one(&state.db)
                .await?;
            if existing.is_none() {
                let row = group_member::ActiveModel {
                    id: Set(selltrack_types::create_id()),
                    group_id: Set(group.id.clone()),
                    username: Set(member.clone()),
                    created_at: Set(Utc::now().naive_utc()),
                };
                row.insert(&state.db).await?;
            }
        }
        ("remove", Some(member)) => {
            group_member::Entity::delete_many()
                .filter(group_member::Column::GroupId.eq(&group.id))
                .filter(group_member::Column::Username.eq(member))
                .exec(&state.db)
                .await?;
        }
        ("percentage", Some(member)) => {
            let offer_id = payload
                .offer_id
                .as_deref()
                .ok_or_else(|| bad_request!("offerId is required for percentage updates"))?;

            // The percentage is keyed by the offer's site, not the offer itself.
            let offer = offer::Entity::find_by_id(offer_id)
                .one(&state.db)
                .await?
                .ok_or_else(|| not_found!("Offer not found"))?;

            let mut table = group.percentages.clone();
            if !table.is_object() {
                table = json!({});
            }
            if let Some(root) = table.as_object_mut() {
                let member_table = root
                    .entry(member.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !member_table.is_object() {
                    *member_table = Value::Object(Map::new());
                }
                if let Some(member_table) = member_table.as_object_mut() {
                    member_table.insert(offer.site.clone(), json!(payload.percent.unwrap_or(0.0)));
                }
            }

            let mut active = group.clone().into_active_model();
            active.percentages = Set(table);
            active.update(&state.db).await?;
        }
        _ => return Err(bad_request!("No valid action")),
    }

    let updated = group::Entity::find()
        .filter(group::Column::Name.eq(&name))
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found!("Group not found"))?;

    let members = members_by_group(&state, vec![updated.id.clone()])
        .await?
        .remove(&updated.id)
        .unwrap_or_default();

    Ok(Json(GroupResponse::from_model(updated, members)))
}

#[derive(Debug, Serialize)]
pub struct DeleteGroupResponse {
    pub success: bool,
}

#[tracing::instrument(name = "DELETE /groups/{name}", skip(state, user))]
pub async fn delete_group(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(name): Path<String>,
) -> Result<Json<DeleteGroupResponse>, ApiError> {
    user.claims()?;

    let group = group::Entity::find()
        .filter(group::Column::Name.eq(&name))
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found!("Group not found"))?;

    group_member::Entity::delete_many()
        .filter(group_member::Column::GroupId.eq(&group.id))
        .exec(&state.db)
        .await?;

    group::Entity::delete_by_id(&group.id).exec(&state.db).await?;

    Ok(Json(DeleteGroupResponse { success: true }))
}
