use axum::extract::{Extension, State};
use serde::Deserialize;

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::{Json, Path};
use crate::middleware::{resolve_tenant_branch, TenantContext};
use crate::models::{Capability, CreatePackage, CreateTrainer, Package, Trainer};

#[derive(Debug, Deserialize)]
pub struct PackagePath {
    pub branch_id: String,
    pub package_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TrainerPath {
    pub branch_id: String,
    pub trainer_id: String,
}

// ============ Packages ============

pub async fn create_package(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(branch_id): Path<String>,
    Json(input): Json<CreatePackage>,
) -> Result<Json<Package>> {
    ctx.require_any(&[Capability::ChangeSettings], None, Some(&branch_id))?;
    input.validate()?;

    let conn = state.db.get()?;
    resolve_tenant_branch(&conn, &ctx, &branch_id)?;

    // Names are unique per branch; surface the business error instead of
    // the constraint violation.
    let existing = queries::list_branch_packages(&conn, &branch_id)?;
    if existing.iter().any(|p| p.name.eq_ignore_ascii_case(input.name.trim())) {
        return Err(AppError::Conflict(
            "A package with this name already exists".into(),
        ));
    }

    let package = queries::create_package(&conn, &branch_id, &input)?;
    Ok(Json(package))
}

pub async fn list_packages(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(branch_id): Path<String>,
) -> Result<Json<Vec<Package>>> {
    ctx.require_any(&[], None, Some(&branch_id))?;

    let conn = state.db.get()?;
    resolve_tenant_branch(&conn, &ctx, &branch_id)?;

    Ok(Json(queries::list_branch_packages(&conn, &branch_id)?))
}

pub async fn delete_package(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(path): Path<PackagePath>,
) -> Result<Json<serde_json::Value>> {
    ctx.require_any(&[Capability::ChangeSettings], None, Some(&path.branch_id))?;

    let conn = state.db.get()?;
    resolve_tenant_branch(&conn, &ctx, &path.branch_id)?;

    let package =
        queries::get_package_by_id(&conn, &path.package_id).or_not_found(msg::PACKAGE_NOT_FOUND)?;
    if package.branch_id != path.branch_id {
        return Err(AppError::NotFound(msg::PACKAGE_NOT_FOUND.into()));
    }

    queries::delete_package(&conn, &package.id)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

// ============ Trainers ============

pub async fn create_trainer(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(branch_id): Path<String>,
    Json(input): Json<CreateTrainer>,
) -> Result<Json<Trainer>> {
    ctx.require_any(&[Capability::ChangeSettings], None, Some(&branch_id))?;
    input.validate()?;

    let conn = state.db.get()?;
    resolve_tenant_branch(&conn, &ctx, &branch_id)?;

    let trainer = queries::create_trainer(&conn, &branch_id, &input)?;
    Ok(Json(trainer))
}

pub async fn list_trainers(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(branch_id): Path<String>,
) -> Result<Json<Vec<Trainer>>> {
    ctx.require_any(&[], None, Some(&branch_id))?;

    let conn = state.db.get()?;
    resolve_tenant_branch(&conn, &ctx, &branch_id)?;

    Ok(Json(queries::list_branch_trainers(&conn, &branch_id)?))
}

pub async fn delete_trainer(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(path): Path<TrainerPath>,
) -> Result<Json<serde_json::Value>> {
    ctx.require_any(&[Capability::ChangeSettings], None, Some(&path.branch_id))?;

    let conn = state.db.get()?;
    resolve_tenant_branch(&conn, &ctx, &path.branch_id)?;

    let trainer =
        queries::get_trainer_by_id(&conn, &path.trainer_id).or_not_found(msg::TRAINER_NOT_FOUND)?;
    if trainer.branch_id != path.branch_id {
        return Err(AppError::NotFound(msg::TRAINER_NOT_FOUND.into()));
    }

    queries::delete_trainer(&conn, &trainer.id)?;
    Ok(Json(serde_json::json!({ "success": true })))
}
