use crate::{
    entity::{sea_orm_active_enums::UserRole, user},
    error::{ApiError, AuthorizationError},
};
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use hyper::header::AUTHORIZATION;
use sea_orm::EntityTrait;
use selltrack_types::anyhow;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Identity claims carried by every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub enum AuthUser {
    Token(Claims),
    Unauthorized,
}

impl AuthUser {
    pub fn claims(&self) -> Result<&Claims, AuthorizationError> {
        match self {
            AuthUser::Token(claims) => Ok(claims),
            AuthUser::Unauthorized => Err(ApiError::unauthorized("Missing or invalid token")),
        }
    }

    /// Admin and Owner only; everyone else is rejected with 403.
    pub fn require_privileged(&self) -> Result<&Claims, ApiError> {
        let claims = self.claims()?;
        if claims.role.is_privileged() {
            Ok(claims)
        } else {
            Err(ApiError::FORBIDDEN)
        }
    }

    /// Re-reads the user row behind the claims; the row may have been removed
    /// since the token was issued.
    pub async fn get_user(&self, state: &AppState) -> Result<user::Model, ApiError> {
        let claims = self.claims()?;
        user::Entity::find_by_id(&claims.sub)
            .one(&state.db)
            .await?
            .ok_or_else(|| AuthorizationError::from(anyhow!("User not found")))
    }
}

pub async fn jwt_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response<Body>, AuthorizationError> {
    let mut request = request;
    if let Some(auth_header) = request.headers().get(AUTHORIZATION)
        && let Ok(token) = auth_header.to_str()
    {
        let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();
        let claims = state
            .validate_token(token)
            .map_err(|err| ApiError::unauthorized(format!("Invalid token: {}", err)))?;
        request
            .extensions_mut()
            .insert::<AuthUser>(AuthUser::Token(claims));
        return Ok(next.run(request).await);
    }

    request
        .extensions_mut()
        .insert::<AuthUser>(AuthUser::Unauthorized);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_user_has_no_claims() {
        assert!(AuthUser::Unauthorized.claims().is_err());
    }

    #[test]
    fn member_is_not_privileged() {
        let claims = Claims {
            sub: "usr_1".into(),
            username: "bob".into(),
            email: "bob@example.com".into(),
            role: UserRole::Member,
            iat: 0,
            exp: i64::MAX,
        };
        let user = AuthUser::Token(claims);
        assert!(user.claims().is_ok());
        assert!(user.require_privileged().is_err());
    }

    #[test]
    fn admin_and_owner_are_privileged() {
        for role in [UserRole::Admin, UserRole::Owner] {
            let user = AuthUser::Token(Claims {
                sub: "usr_1".into(),
                username: "root".into(),
                email: "root@example.com".into(),
                role,
                iat: 0,
                exp: i64::MAX,
            });
            assert!(user.require_privileged().is_ok());
        }
    }
}
