use std::sync::Arc;

use axum::{Router, middleware::from_fn_with_state, routing::get};
use middleware::jwt::jwt_middleware;
use state::State;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, decompression::RequestDecompressionLayer,
};

pub mod aggregation;
pub mod entity;
mod middleware;
mod routes;

pub mod error;
pub mod password;
pub mod state;

pub use axum;
pub mod auth {
    use crate::middleware;
    pub use middleware::jwt::{AuthUser, Claims};
}

pub use sea_orm;

pub fn construct_router(state: Arc<State>) -> Router {
    let router = Router::new()
        .nest("/health", routes::health::routes())
        .nest("/auth", routes::auth::routes())
        .nest("/users", routes::user::routes())
        .nest("/offers", routes::offer::routes())
        .nest("/sales", routes::sale::routes())
        .nest("/groups", routes::group::routes())
        .nest("/ads", routes::ad::routes())
        .nest("/activities", routes::activity::routes())
        .nest("/admin", routes::admin::routes())
        .nest("/webhook", routes::webhook::routes())
        .with_state(state.clone())
        .route("/version", get(|| async { env!("CARGO_PKG_VERSION") }))
        .layer(from_fn_with_state(state.clone(), jwt_middleware))
        .layer(CorsLayer::permissive())
        .layer(
            ServiceBuilder::new()
                .layer(RequestDecompressionLayer::new())
                .layer(CompressionLayer::new()),
        );

    Router::new().nest("/api/v1", router)
}
