mod order;
mod registration;
mod verify;

pub use order::*;
pub use registration::*;
pub use verify::*;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::config::RateLimitConfig;
use crate::db::AppState;
use crate::rate_limit;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router(rate: RateLimitConfig) -> Router<AppState> {
    // POST /functions/create-order calls out to the gateway, hence strict.
    let strict = Router::new()
        .route("/functions/create-order", post(create_order))
        .route_layer(rate_limit::strict_layer(rate.strict_rpm));

    let standard = Router::new()
        .route("/functions/verify-payment", post(verify_payment))
        .route("/public/registration/{branch_id}", get(registration_data))
        .route_layer(rate_limit::standard_layer(rate.standard_rpm));

    let relaxed = Router::new()
        .route("/health", get(health))
        .route_layer(rate_limit::relaxed_layer(rate.relaxed_rpm));

    strict.merge(standard).merge(relaxed)
}
