use axum::extract::State;

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, Result};
use crate::extractors::{Json, Path};
use crate::id::is_valid_prefixed_id;
use crate::models::RegistrationData;

/// Data for the public self-registration page of a branch: display name,
/// package pricing and trainer names. Nothing else leaks.
pub async fn registration_data(
    State(state): State<AppState>,
    Path(branch_id): Path<String>,
) -> Result<Json<RegistrationData>> {
    if !is_valid_prefixed_id(&branch_id) {
        return Err(AppError::NotFound(msg::BRANCH_NOT_FOUND.into()));
    }

    let conn = state.db.get()?;

    let branch = queries::get_branch_by_id(&conn, &branch_id)?
        .filter(|b| b.deleted_at.is_none())
        .ok_or_else(|| AppError::NotFound(msg::BRANCH_NOT_FOUND.into()))?;

    // A branch whose gym was soft-deleted is gone from the public surface too.
    let tenant = queries::get_tenant_by_id(&conn, &branch.tenant_id)?;
    if !tenant.is_some_and(|t| !t.is_deleted()) {
        return Err(AppError::NotFound(msg::BRANCH_NOT_FOUND.into()));
    }

    let packages = queries::list_branch_packages(&conn, &branch.id)?;
    let trainers = queries::list_branch_trainers(&conn, &branch.id)?;

    Ok(Json(RegistrationData {
        branch_name: branch.name,
        packages: packages.into_iter().map(Into::into).collect(),
        trainers: trainers.into_iter().map(Into::into).collect(),
    }))
}
