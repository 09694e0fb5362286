use axum::extract::{Extension, State};

use crate::db::{queries, AppState};
use crate::error::Result;
use crate::extractors::{Json, Path};
use crate::middleware::{resolve_tenant_branch, TenantContext};
use crate::models::{Capability, CreateLedgerEntry, LedgerEntry};

pub async fn list_ledger(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(branch_id): Path<String>,
) -> Result<Json<Vec<LedgerEntry>>> {
    ctx.require_any(&[Capability::AccessLedger], Some("ledger"), Some(&branch_id))?;

    let conn = state.db.get()?;
    resolve_tenant_branch(&conn, &ctx, &branch_id)?;

    Ok(Json(queries::list_branch_ledger(&conn, &branch_id)?))
}

/// Manual income/expense entry recorded by staff; `auto_generated` stays
/// false so these stay distinguishable from entitlement-written income.
pub async fn create_ledger_entry(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(input): Json<CreateLedgerEntry>,
) -> Result<Json<LedgerEntry>> {
    ctx.require_any(
        &[Capability::AccessLedger],
        Some("ledger"),
        Some(&input.branch_id),
    )?;
    input.validate()?;

    let conn = state.db.get()?;
    resolve_tenant_branch(&conn, &ctx, &input.branch_id)?;

    let entry = queries::create_ledger_entry(
        &conn,
        &input.branch_id,
        input.entry_type,
        input.amount_paise(),
        input.description.trim(),
        false,
    )?;

    Ok(Json(entry))
}
