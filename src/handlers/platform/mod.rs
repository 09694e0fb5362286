mod tenants;

pub use tenants::*;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::db::AppState;
use crate::middleware::platform_auth;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/platform/tenants", post(create_tenant))
        .route("/platform/tenants", get(list_tenants))
        .route("/platform/tenants/{tenant_id}", get(get_tenant))
        .route("/platform/tenants/{tenant_id}", put(update_tenant))
        .route("/platform/tenants/{tenant_id}", delete(delete_tenant))
        .route("/platform/tenants/{tenant_id}/owner", post(create_tenant_owner))
        .layer(middleware::from_fn_with_state(state, platform_auth))
}
