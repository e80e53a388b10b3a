use crate::entity::user;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{Json, Router, extract::State, routing::get};
use sea_orm::{EntityTrait, QuerySelect};
use serde::Serialize;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_users))
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
}

/// Public directory used by member pickers; exposes ids and usernames only.
#[tracing::instrument(name = "GET /users", skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let users: Vec<(String, String)> = user::Entity::find()
        .select_only()
        .column(user::Column::Id)
        .column(user::Column::Username)
        .into_tuple()
        .all(&state.db)
        .await?;

    Ok(Json(
        users
            .into_iter()
            .map(|(id, username)| UserSummary { id, username })
            .collect(),
    ))
}
