use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::authz::{evaluate, with_auth_timeout, AccessPolicy, Actor};
use crate::db::{queries, AppState};
use crate::error::{msg, AppError, Result};
use crate::models::{Capability, PermissionSet, Staff, StaffRole, Tenant};
use crate::util::extract_bearer_token;

/// Request context for tenant routes: the authenticated staff member, their
/// permission flags and the tenant they belong to.
///
/// Authentication happens here; authorization happens in the handlers via
/// the `require_*` helpers, so each route states its own policy.
#[derive(Clone)]
pub struct TenantContext {
    pub staff: Staff,
    pub permissions: PermissionSet,
    pub tenant: Tenant,
}

impl TenantContext {
    fn authorize(&self, policy: &AccessPolicy) -> Result<()> {
        let actor = Actor::Tenant {
            staff: self.staff.clone(),
            permissions: self.permissions.clone(),
            tenant: self.tenant.clone(),
        };
        evaluate(&actor, policy, Utc::now().timestamp()).map_err(Into::into)
    }

    /// Any authenticated staff member with an unexpired plan.
    pub fn require_active_plan(&self) -> Result<()> {
        self.authorize(&AccessPolicy::default())
    }

    pub fn require_owner(&self) -> Result<()> {
        self.authorize(&AccessPolicy {
            owner_only: true,
            ..Default::default()
        })
    }

    /// At least one of `capabilities`, optionally scoped to a branch and a
    /// plan module.
    pub fn require_any(
        &self,
        capabilities: &'static [Capability],
        module: Option<&'static str>,
        branch_id: Option<&str>,
    ) -> Result<()> {
        self.authorize(&AccessPolicy {
            module,
            any_capability: capabilities,
            branch_id: branch_id.map(String::from),
            ..Default::default()
        })
    }

    pub fn is_owner(&self) -> bool {
        self.staff.role == StaffRole::Owner
    }
}

pub async fn tenant_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let api_key = extract_bearer_token(request.headers())
        .ok_or(AppError::Unauthorized)?
        .to_string();

    let context = with_auth_timeout(move || {
        let conn = state.db.get()?;

        let Some(staff) = queries::get_staff_by_api_key(&conn, &api_key)? else {
            return Ok(None);
        };

        let tenant = queries::get_tenant_by_id(&conn, &staff.tenant_id)?
            .ok_or_else(|| AppError::NotFound(msg::TENANT_NOT_FOUND.into()))?;
        if tenant.is_deleted() {
            return Ok(None);
        }

        // Owners carry the full set; only staff rows have stored flags.
        let permissions = match staff.role {
            StaffRole::Owner => PermissionSet::full(),
            StaffRole::Staff => {
                queries::get_staff_permissions(&conn, &staff.id)?.unwrap_or_default()
            }
        };

        Ok(Some(TenantContext {
            staff,
            permissions,
            tenant,
        }))
    })
    .await?
    .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

/// Resolve a branch and check it belongs to the caller's tenant. Foreign
/// branches read as not-found, not forbidden.
pub fn resolve_tenant_branch(
    conn: &rusqlite::Connection,
    ctx: &TenantContext,
    branch_id: &str,
) -> Result<crate::models::Branch> {
    let branch = queries::get_branch_by_id(conn, branch_id)?
        .ok_or_else(|| AppError::NotFound(msg::BRANCH_NOT_FOUND.into()))?;
    if branch.tenant_id != ctx.tenant.id {
        return Err(AppError::NotFound(msg::BRANCH_NOT_FOUND.into()));
    }
    Ok(branch)
}
