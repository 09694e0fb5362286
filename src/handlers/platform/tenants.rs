//! Platform console: tenant lifecycle and plan management.
//!
//! Every route here sits behind `platform_auth`. Responses use
//! `TenantPublic`, which reports credential presence as a boolean and never
//! carries the encrypted blob.

use axum::extract::{Extension, State};
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::{Json, Path, Query};
use crate::middleware::PlatformContext;
use crate::models::{
    CreateStaff, CreateTenant, StaffRole, TenantPublic, UpdateTenant,
};

#[derive(Debug, Deserialize)]
pub struct ListTenantsQuery {
    #[serde(default)]
    pub include_deleted: bool,
}

pub async fn create_tenant(
    State(state): State<AppState>,
    Extension(ctx): Extension<PlatformContext>,
    Json(input): Json<CreateTenant>,
) -> Result<Json<TenantPublic>> {
    input.validate()?;

    let conn = state.db.get()?;
    let tenant = queries::create_tenant(&conn, &input)?;

    tracing::info!(
        tenant_id = %tenant.id,
        admin_id = %ctx.admin.id,
        "Tenant created"
    );

    Ok(Json(tenant.into()))
}

pub async fn list_tenants(
    State(state): State<AppState>,
    Query(query): Query<ListTenantsQuery>,
) -> Result<Json<Vec<TenantPublic>>> {
    let conn = state.db.get()?;
    let tenants = queries::list_tenants(&conn, query.include_deleted)?;
    Ok(Json(tenants.into_iter().map(Into::into).collect()))
}

pub async fn get_tenant(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Result<Json<TenantPublic>> {
    let conn = state.db.get()?;
    let tenant = queries::get_tenant_by_id(&conn, &tenant_id).or_not_found(msg::TENANT_NOT_FOUND)?;
    Ok(Json(tenant.into()))
}

pub async fn update_tenant(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Json(input): Json<UpdateTenant>,
) -> Result<Json<TenantPublic>> {
    input.validate()?;

    let conn = state.db.get()?;
    let tenant =
        queries::update_tenant(&conn, &tenant_id, &input).or_not_found(msg::TENANT_NOT_FOUND)?;

    Ok(Json(tenant.into()))
}

pub async fn delete_tenant(
    State(state): State<AppState>,
    Extension(ctx): Extension<PlatformContext>,
    Path(tenant_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let deleted = queries::soft_delete_tenant(&conn, &tenant_id)?;
    if !deleted {
        return Err(AppError::NotFound(msg::TENANT_NOT_FOUND.into()));
    }

    tracing::info!(
        tenant_id = %tenant_id,
        admin_id = %ctx.admin.id,
        "Tenant soft-deleted"
    );

    Ok(Json(serde_json::json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct CreateOwnerRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CreateOwnerResponse {
    pub staff_id: String,
    /// Shown exactly once; only its hash is stored.
    pub api_key: String,
}

/// Provision the owner account for a freshly created tenant. The returned
/// API key is the tenant's way in and is not recoverable later.
pub async fn create_tenant_owner(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Json(input): Json<CreateOwnerRequest>,
) -> Result<Json<CreateOwnerResponse>> {
    let conn = state.db.get()?;

    let tenant = queries::get_tenant_by_id(&conn, &tenant_id).or_not_found(msg::TENANT_NOT_FOUND)?;
    if tenant.is_deleted() {
        return Err(AppError::NotFound(msg::TENANT_NOT_FOUND.into()));
    }

    let create = CreateStaff {
        name: input.name,
        role: StaffRole::Owner,
        permissions: None,
    };
    create.validate()?;

    let staff_count = queries::count_staff(&conn, &tenant.id)?;
    if staff_count >= tenant.max_staff {
        return Err(AppError::Conflict(msg::STAFF_LIMIT_REACHED.into()));
    }

    let api_key = queries::generate_api_key();
    let staff = queries::create_staff(&conn, &tenant.id, &create, &api_key)?;

    tracing::info!(tenant_id = %tenant.id, staff_id = %staff.id, "Tenant owner created");

    Ok(Json(CreateOwnerResponse {
        staff_id: staff.id,
        api_key,
    }))
}
