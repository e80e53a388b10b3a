use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::{sync::Arc, time::Duration};

use crate::entity::user;
use crate::middleware::jwt::Claims;
use selltrack_types::Result;

pub type AppState = Arc<State>;

/// Issued tokens stay valid for this long; there is no revocation list.
const TOKEN_TTL_DAYS: i64 = 7;

pub struct State {
    pub db: DatabaseConnection,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    /// Auth token cache: blake3(token) -> Claims
    /// Short TTL (240s) to balance security vs performance
    pub auth_cache: moka::sync::Cache<String, Claims>,
}

impl State {
    pub async fn new() -> Self {
        let db_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let mut opt = ConnectOptions::new(db_url.to_owned());
        opt.max_connections(10)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .sqlx_logging(false);

        let db = Database::connect(opt)
            .await
            .expect("Failed to connect to database");

        let jwt_secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set");
        assert!(
            jwt_secret.len() >= 32,
            "JWT_SECRET must be at least 32 bytes"
        );

        let encoding_key = EncodingKey::from_secret(jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(jwt_secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            db,
            encoding_key,
            decoding_key,
            validation,
            // Entries are keyed by token hash to avoid storing raw tokens
            auth_cache: moka::sync::Cache::builder()
                .max_capacity(10_000)
                .time_to_live(Duration::from_secs(240))
                .build(),
        }
    }

    /// Sign a 7-day HS256 token carrying the user's identity claims.
    pub fn issue_token(&self, user: &user::Model) -> Result<String> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate signature and expiry, returning the embedded claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let cache_key = blake3::hash(token.as_bytes()).to_hex().to_string();
        if let Some(claims) = self.auth_cache.get(&cache_key) {
            return Ok(claims);
        }
        let decoded = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        self.auth_cache.insert(cache_key, decoded.claims.clone());
        Ok(decoded.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::sea_orm_active_enums::UserRole;

    fn keys(secret: &[u8]) -> (EncodingKey, DecodingKey, Validation) {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        (
            EncodingKey::from_secret(secret),
            DecodingKey::from_secret(secret),
            validation,
        )
    }

    #[test]
    fn token_round_trips_claims() {
        let (enc, dec, validation) = keys(b"0123456789abcdef0123456789abcdef");
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: "usr_1".into(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            role: UserRole::Member,
            iat: now.timestamp(),
            exp: (now + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &enc).unwrap();
        let decoded = decode::<Claims>(&token, &dec, &validation).unwrap();
        assert_eq!(decoded.claims.sub, "usr_1");
        assert_eq!(decoded.claims.username, "alice");
        assert_eq!(decoded.claims.role, UserRole::Member);
    }

    #[test]
    fn expired_token_is_rejected() {
        let (enc, dec, validation) = keys(b"0123456789abcdef0123456789abcdef");
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: "usr_1".into(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            role: UserRole::Member,
            iat: (now - chrono::Duration::days(8)).timestamp(),
            exp: (now - chrono::Duration::days(1)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &enc).unwrap();
        assert!(decode::<Claims>(&token, &dec, &validation).is_err());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let (enc, ..) = keys(b"0123456789abcdef0123456789abcdef");
        let (_, other_dec, validation) = keys(b"ffffffffffffffffffffffffffffffff");
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: "usr_1".into(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            role: UserRole::Owner,
            iat: now.timestamp(),
            exp: (now + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &enc).unwrap();
        assert!(decode::<Claims>(&token, &other_dec, &validation).is_err());
    }
}
