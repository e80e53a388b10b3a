use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Router, routing::get, routing::post};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, EntityTrait, IntoActiveModel,
    QueryFilter,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::sea_orm_active_enums::UserRole;
use crate::entity::{invite, user};
use crate::error::ApiError;
use crate::middleware::jwt::AuthUser;
use crate::password::{hash_password, verify_password};
use crate::state::AppState;
use crate::{bad_request, forbidden, not_found, unauthorized};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/me", get(me))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    responses(
        (status = 200, description = "Credentials accepted, token issued", body = LoginResponse),
        (status = 401, description = "Wrong password"),
        (status = 404, description = "Unknown username")
    )
)]
#[tracing::instrument(name = "POST /auth/login", skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(bad_request!("Username and password are required"));
    }

    let user = user::Entity::find()
        .filter(user::Column::Username.eq(&payload.username))
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found!("User not found"))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(unauthorized!("Invalid password"));
    }

    let token = state.issue_token(&user)?;

    Ok(Json(LoginResponse {
        token,
        username: user.username,
        email: user.email,
        role: user.role,
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub invite_code: String,
    #[serde(default)]
    pub role: Option<UserRole>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    responses(
        (status = 201, description = "User created", body = RegisterResponse),
        (status = 400, description = "Missing field or duplicate username/email"),
        (status = 403, description = "Invite code invalid or already used")
    )
)]
#[tracing::instrument(name = "POST /auth/register", skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    if payload.username.is_empty()
        || payload.email.is_empty()
        || payload.password.is_empty()
        || payload.invite_code.is_empty()
    {
        return Err(bad_request!("All fields are required"));
    }

    let invite = invite::Entity::find()
        .filter(invite::Column::Code.eq(&payload.invite_code))
        .filter(invite::Column::Used.eq(false))
        .one(&state.db)
        .await?
        .ok_or_else(|| forbidden!("Invite code invalid or already used"))?;

    let existing = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Username.eq(&payload.username))
                .add(user::Column::Email.eq(&payload.email)),
        )
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(bad_request!("Username or email already registered"));
    }

    let password_hash = hash_password(&payload.password)?;
    let now = Utc::now().naive_utc();

    let new_user = user::ActiveModel {
        id: Set(selltrack_types::create_id()),
        username: Set(payload.username.clone()),
        email: Set(payload.email.clone()),
        password_hash: Set(password_hash),
        role: Set(payload.role.unwrap_or(UserRole::Member)),
        invite_code: Set(Some(payload.invite_code.clone())),
        created_at: Set(now),
        updated_at: Set(now),
    };
    new_user.insert(&state.db).await?;

    let mut used_invite = invite.into_active_model();
    used_invite.used = Set(true);
    used_invite.used_by = Set(Some(payload.username.clone()));
    used_invite.used_at = Set(Some(now));
    used_invite.update(&state.db).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered".to_string(),
        }),
    ))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

#[tracing::instrument(name = "GET /auth/me", skip(state, user))]
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MeResponse>, ApiError> {
    let claims = user.claims()?;

    // Token may outlive the row; answer from the database, not the claims.
    let user = user::Entity::find_by_id(&claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found!("User not found"))?;

    Ok(Json(MeResponse {
        username: user.username,
        email: user.email,
        role: user.role,
    }))
}
