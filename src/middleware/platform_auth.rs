use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::authz::with_auth_timeout;
use crate::db::{queries, AppState};
use crate::error::AppError;
use crate::models::PlatformAdmin;
use crate::util::extract_bearer_token;

/// Request context for platform console routes.
#[derive(Clone)]
pub struct PlatformContext {
    pub admin: PlatformAdmin,
}

pub async fn platform_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = extract_bearer_token(request.headers())
        .ok_or(AppError::Unauthorized)?
        .to_string();

    let admin = with_auth_timeout(move || {
        let conn = state.db.get()?;
        queries::get_platform_admin_by_api_key(&conn, &api_key)
    })
    .await?
    .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(PlatformContext { admin });
    Ok(next.run(request).await)
}
