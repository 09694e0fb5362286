use axum::extract::{Extension, State};

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::{Json, Path};
use crate::middleware::{resolve_tenant_branch, TenantContext};
use crate::models::{Branch, CreateBranch, UpdateBranch};

pub async fn create_branch(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(input): Json<CreateBranch>,
) -> Result<Json<Branch>> {
    ctx.require_owner()?;
    input.validate()?;

    let conn = state.db.get()?;

    let branch_count = queries::count_branches(&conn, &ctx.tenant.id)?;
    if branch_count >= ctx.tenant.max_branches {
        return Err(AppError::Conflict(msg::BRANCH_LIMIT_REACHED.into()));
    }

    let branch = queries::create_branch(&conn, &ctx.tenant.id, &input)?;

    tracing::info!(tenant_id = %ctx.tenant.id, branch_id = %branch.id, "Branch created");

    Ok(Json(branch))
}

pub async fn list_branches(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> Result<Json<Vec<Branch>>> {
    ctx.require_active_plan()?;

    let conn = state.db.get()?;
    let branches = queries::list_branches(&conn, &ctx.tenant.id)?;
    Ok(Json(branches))
}

pub async fn update_branch(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(branch_id): Path<String>,
    Json(input): Json<UpdateBranch>,
) -> Result<Json<Branch>> {
    ctx.require_owner()?;
    input.validate()?;

    let conn = state.db.get()?;
    resolve_tenant_branch(&conn, &ctx, &branch_id)?;

    let branch =
        queries::update_branch(&conn, &branch_id, &input).or_not_found(msg::BRANCH_NOT_FOUND)?;
    Ok(Json(branch))
}

pub async fn delete_branch(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(branch_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    ctx.require_owner()?;

    let conn = state.db.get()?;
    resolve_tenant_branch(&conn, &ctx, &branch_id)?;

    if !queries::soft_delete_branch(&conn, &branch_id)? {
        return Err(AppError::NotFound(msg::BRANCH_NOT_FOUND.into()));
    }

    tracing::info!(tenant_id = %ctx.tenant.id, branch_id = %branch_id, "Branch soft-deleted");

    Ok(Json(serde_json::json!({ "success": true })))
}
