use axum::http::StatusCode;
use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};

use crate::bad_request;
use crate::entity::activity;
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_activities).post(upsert_activity))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[tracing::instrument(name = "GET /activities", skip(state))]
pub async fn list_activities(
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<activity::Model>>, ApiError> {
    let mut condition = Condition::all();
    if let Some(user_id) = &query.user_id {
        condition = condition.add(activity::Column::UserId.eq(user_id));
    }
    if let Some(username) = &query.username {
        condition = condition.add(activity::Column::Username.eq(username));
    }

    let activities = activity::Entity::find()
        .filter(condition)
        .order_by_desc(activity::Column::CreatedAt)
        .limit(20)
        .all(&state.db)
        .await?;

    Ok(Json(activities))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertActivityRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UpsertActivityResponse {
    pub success: bool,
}

/// One entry per (user, type): posting the same type again replaces the
/// previous message instead of growing a history.
#[tracing::instrument(name = "POST /activities", skip(state, payload))]
pub async fn upsert_activity(
    State(state): State<AppState>,
    Json(payload): Json<UpsertActivityRequest>,
) -> Result<(StatusCode, Json<UpsertActivityResponse>), ApiError> {
    if (payload.user_id.is_none() && payload.username.is_none())
        || payload.activity_type.is_empty()
        || payload.message.is_empty()
    {
        return Err(bad_request!(
            "Required fields: userId or username, type, message"
        ));
    }

    let mut condition =
        Condition::all().add(activity::Column::ActivityType.eq(&payload.activity_type));
    if let Some(user_id) = &payload.user_id {
        condition = condition.add(activity::Column::UserId.eq(user_id));
    } else if let Some(username) = &payload.username {
        condition = condition.add(activity::Column::Username.eq(username));
    }

    let now = Utc::now().naive_utc();

    let existing = activity::Entity::find()
        .filter(condition)
        .one(&state.db)
        .await?;

    match existing {
        Some(entry) => {
            let mut active = entry.into_active_model();
            active.user_id = Set(payload.user_id);
            active.username = Set(payload.username);
            active.message = Set(payload.message);
            active.created_at = Set(now);
            active.update(&state.db).await?;
        }
        None => {
            let entry = activity::ActiveModel {
                id: Set(selltrack_types::create_id()),
                user_id: Set(payload.user_id),
                username: Set(payload.username),
                activity_type: Set(payload.activity_type),
                message: Set(payload.message),
                created_at: Set(now),
            };
            entry.insert(&state.db).await?;
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(UpsertActivityResponse { success: true }),
    ))
}
