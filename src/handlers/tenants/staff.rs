use axum::extract::{Extension, State};
use serde::Serialize;

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::{Json, Path};
use crate::middleware::TenantContext;
use crate::models::{CreateStaff, PermissionSet, Staff, StaffRole};

#[derive(Debug, Serialize)]
pub struct StaffCreatedResponse {
    pub staff: Staff,
    /// Shown exactly once; only its hash is stored.
    pub api_key: String,
}

pub async fn create_staff(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(input): Json<CreateStaff>,
) -> Result<Json<StaffCreatedResponse>> {
    ctx.require_owner()?;
    input.validate()?;

    let conn = state.db.get()?;

    let staff_count = queries::count_staff(&conn, &ctx.tenant.id)?;
    if staff_count >= ctx.tenant.max_staff {
        return Err(AppError::Conflict(msg::STAFF_LIMIT_REACHED.into()));
    }

    let api_key = queries::generate_api_key();
    let staff = queries::create_staff(&conn, &ctx.tenant.id, &input, &api_key)?;

    tracing::info!(
        tenant_id = %ctx.tenant.id,
        staff_id = %staff.id,
        role = staff.role.as_str(),
        "Staff account created"
    );

    Ok(Json(StaffCreatedResponse { staff, api_key }))
}

pub async fn list_staff(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> Result<Json<Vec<Staff>>> {
    ctx.require_owner()?;

    let conn = state.db.get()?;
    let staff = queries::list_staff(&conn, &ctx.tenant.id)?;
    Ok(Json(staff))
}

pub async fn delete_staff(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(staff_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    ctx.require_owner()?;

    if staff_id == ctx.staff.id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".into(),
        ));
    }

    let conn = state.db.get()?;
    let staff = resolve_tenant_staff(&conn, &ctx, &staff_id)?;

    if !queries::soft_delete_staff(&conn, &staff.id)? {
        return Err(AppError::NotFound(msg::STAFF_NOT_FOUND.into()));
    }

    tracing::info!(tenant_id = %ctx.tenant.id, staff_id = %staff_id, "Staff account removed");

    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn get_staff_permissions(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(staff_id): Path<String>,
) -> Result<Json<PermissionSet>> {
    ctx.require_owner()?;

    let conn = state.db.get()?;
    let staff = resolve_tenant_staff(&conn, &ctx, &staff_id)?;

    let permissions = match staff.role {
        StaffRole::Owner => PermissionSet::full(),
        StaffRole::Staff => queries::get_staff_permissions(&conn, &staff.id)?.unwrap_or_default(),
    };

    Ok(Json(permissions))
}

pub async fn set_staff_permissions(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(staff_id): Path<String>,
    Json(input): Json<PermissionSet>,
) -> Result<Json<PermissionSet>> {
    ctx.require_owner()?;

    let conn = state.db.get()?;
    let staff = resolve_tenant_staff(&conn, &ctx, &staff_id)?;

    // Owners are not governed by permission rows.
    if staff.role == StaffRole::Owner {
        return Err(AppError::BadRequest(
            "Permissions cannot be set for an owner account".into(),
        ));
    }

    queries::set_staff_permissions(&conn, &staff.id, &input)?;

    Ok(Json(input))
}

/// Staff from another tenant read as not-found, never forbidden.
fn resolve_tenant_staff(
    conn: &rusqlite::Connection,
    ctx: &TenantContext,
    staff_id: &str,
) -> Result<Staff> {
    let staff = queries::get_staff_by_id(conn, staff_id).or_not_found(msg::STAFF_NOT_FOUND)?;
    if staff.tenant_id != ctx.tenant.id {
        return Err(AppError::NotFound(msg::STAFF_NOT_FOUND.into()));
    }
    Ok(staff)
}
