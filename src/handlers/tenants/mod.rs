mod branches;
mod catalog;
mod credentials;
mod ledger;
mod members;
mod payments;
mod staff;

pub use branches::*;
pub use catalog::*;
pub use credentials::*;
pub use ledger::*;
pub use members::*;
pub use payments::*;
pub use staff::*;

use axum::{
    extract::Extension,
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::db::AppState;
use crate::error::Result;
use crate::extractors::Json;
use crate::middleware::{tenant_auth, TenantContext};
use crate::models::TenantPublic;

/// The caller's own tenant, with credential presence as a boolean.
async fn get_own_tenant(Extension(ctx): Extension<TenantContext>) -> Result<Json<TenantPublic>> {
    Ok(Json(ctx.tenant.clone().into()))
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/tenant", get(get_own_tenant))
        // Branches
        .route("/tenant/branches", post(create_branch))
        .route("/tenant/branches", get(list_branches))
        .route("/tenant/branches/{branch_id}", put(update_branch))
        .route("/tenant/branches/{branch_id}", delete(delete_branch))
        // Gateway credentials (tenant and branch scope)
        .route("/tenant/credentials", get(tenant_credential_status))
        .route("/tenant/credentials", put(save_tenant_credential))
        .route("/tenant/credentials", delete(remove_tenant_credential))
        .route("/tenant/branches/{branch_id}/credentials", get(branch_credential_status))
        .route("/tenant/branches/{branch_id}/credentials", put(save_branch_credential))
        .route("/tenant/branches/{branch_id}/credentials", delete(remove_branch_credential))
        // Staff
        .route("/tenant/staff", post(create_staff))
        .route("/tenant/staff", get(list_staff))
        .route("/tenant/staff/{staff_id}", delete(delete_staff))
        .route("/tenant/staff/{staff_id}/permissions", get(get_staff_permissions))
        .route("/tenant/staff/{staff_id}/permissions", put(set_staff_permissions))
        // Members
        .route("/tenant/branches/{branch_id}/members", get(list_members))
        // Catalog
        .route("/tenant/branches/{branch_id}/packages", post(create_package))
        .route("/tenant/branches/{branch_id}/packages", get(list_packages))
        .route("/tenant/branches/{branch_id}/packages/{package_id}", delete(delete_package))
        .route("/tenant/branches/{branch_id}/trainers", post(create_trainer))
        .route("/tenant/branches/{branch_id}/trainers", get(list_trainers))
        .route("/tenant/branches/{branch_id}/trainers/{trainer_id}", delete(delete_trainer))
        // Payments and ledger
        .route("/tenant/branches/{branch_id}/payments", get(list_payments))
        .route("/tenant/payments/cash", post(record_cash_payment))
        .route("/tenant/branches/{branch_id}/ledger", get(list_ledger))
        .route("/tenant/ledger", post(create_ledger_entry))
        .layer(middleware::from_fn_with_state(state, tenant_auth))
}
