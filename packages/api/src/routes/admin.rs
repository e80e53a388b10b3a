use axum::{
    Extension, Json, Router,
    extract::State,
    routing::{get, put},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait, IntoActiveModel, QueryOrder};
use serde::{Deserialize, Serialize};

use crate::entity::sea_orm_active_enums::UserRole;
use crate::entity::user;
use crate::error::ApiError;
use crate::middleware::jwt::AuthUser;
use crate::state::AppState;
use crate::{bad_request, not_found};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/role", put(update_role))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub invite_code: Option<String>,
    pub created_at: chrono::NaiveDateTime,
}

/// Full user directory, password hashes omitted. Admin and Owner only.
#[tracing::instrument(name = "GET /admin/users", skip(state, user))]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<AdminUserResponse>>, ApiError> {
    user.require_privileged()?;

    let users = user::Entity::find()
        .order_by_desc(user::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(
        users
            .into_iter()
            .map(|u| AdminUserResponse {
                id: u.id,
                username: u.username,
                email: u.email,
                role: u.role,
                invite_code: u.invite_code,
                created_at: u.created_at,
            })
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub id: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateRoleResponse {
    pub message: String,
}

#[tracing::instrument(name = "PUT /admin/users/role", skip(state, user, payload))]
pub async fn update_role(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<UpdateRoleResponse>, ApiError> {
    user.require_privileged()?;

    let role = match payload.role.as_str() {
        "Member" => UserRole::Member,
        "Admin" => UserRole::Admin,
        "Owner" => UserRole::Owner,
        other => return Err(bad_request!("Invalid role: {}", other)),
    };

    let target = user::Entity::find_by_id(&payload.id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found!("User not found"))?;

    let mut active = target.into_active_model();
    active.role = Set(role);
    active.updated_at = Set(Utc::now().naive_utc());
    active.update(&state.db).await?;

    Ok(Json(UpdateRoleResponse {
        message: "Role updated".to_string(),
    }))
}
