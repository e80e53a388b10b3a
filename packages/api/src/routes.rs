use serde::{Deserialize, Serialize};

pub mod activity;
pub mod ad;
pub mod admin;
pub mod auth;
pub mod group;
pub mod health;
pub mod offer;
pub mod sale;
pub mod user;
pub mod webhook;

/// Actor snapshot embedded in created records and audit entries.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActorInfo {
    pub id: String,
    pub username: String,
    pub email: String,
}

impl From<&crate::middleware::jwt::Claims> for ActorInfo {
    fn from(claims: &crate::middleware::jwt::Claims) -> Self {
        Self {
            id: claims.sub.clone(),
            username: claims.username.clone(),
            email: claims.email.clone(),
        }
    }
}
