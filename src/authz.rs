//! Access decisions for authenticated requests.
//!
//! `evaluate` is a pure function over the actor and the route's policy, so
//! the rule ordering is testable without a running server. Rules fire in a
//! fixed order and the first matching denial wins; later rules never
//! override an earlier one.

use std::time::Duration;

use crate::error::{msg, AppError, Result};
use crate::models::{Capability, PermissionSet, PlatformAdmin, Staff, StaffRole, Tenant};

/// Upper bound on any blocking store lookup made while deciding access.
/// Exceeding it is reported as a timeout, not a denial.
pub const AUTH_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Who is making the request.
#[derive(Debug, Clone)]
pub enum Actor {
    Unauthenticated,
    Platform(PlatformAdmin),
    Tenant {
        staff: Staff,
        permissions: PermissionSet,
        tenant: Tenant,
    },
}

/// What a route demands. Defaults to "any authenticated tenant actor".
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    /// Platform console routes; only platform admins pass.
    pub platform_only: bool,
    /// Tenant-owner routes (settings, staff management, credentials).
    pub owner_only: bool,
    /// Module that must be enabled on the tenant's plan.
    pub module: Option<&'static str>,
    /// Capabilities of which the staff member needs at least one.
    pub any_capability: &'static [Capability],
    /// Branch the request operates on, checked against the staff member's
    /// branch scope.
    pub branch_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    Unauthenticated,
    PlatformOnly,
    OwnerOnly,
    PlanExpired,
    ModuleNotEnabled,
    MissingCapability,
    BranchOutOfScope,
}

impl From<Denial> for AppError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Unauthenticated => AppError::Unauthorized,
            Denial::PlatformOnly => AppError::Forbidden("Platform admin access required".into()),
            Denial::OwnerOnly => AppError::Forbidden("Owner access required".into()),
            Denial::PlanExpired => AppError::Forbidden(msg::PLAN_EXPIRED.into()),
            Denial::ModuleNotEnabled => AppError::Forbidden(msg::MODULE_NOT_AVAILABLE.into()),
            Denial::MissingCapability => {
                AppError::Forbidden("You do not have permission for this action".into())
            }
            Denial::BranchOutOfScope => {
                AppError::Forbidden("You do not have access to this branch".into())
            }
        }
    }
}

/// Decide access for `actor` under `policy` as of `now` (epoch seconds).
pub fn evaluate(
    actor: &Actor,
    policy: &AccessPolicy,
    now: i64,
) -> std::result::Result<(), Denial> {
    let (staff, permissions, tenant) = match actor {
        Actor::Unauthenticated => return Err(Denial::Unauthenticated),
        // Platform admins pass every tenant-level rule.
        Actor::Platform(_) => return Ok(()),
        Actor::Tenant {
            staff,
            permissions,
            tenant,
        } => (staff, permissions, tenant),
    };

    if policy.platform_only {
        return Err(Denial::PlatformOnly);
    }

    if policy.owner_only && staff.role != StaffRole::Owner {
        return Err(Denial::OwnerOnly);
    }

    if tenant.plan_expired(now) {
        return Err(Denial::PlanExpired);
    }

    if let Some(module) = policy.module {
        if !tenant.module_enabled(module) {
            return Err(Denial::ModuleNotEnabled);
        }
    }

    // Owners hold every capability implicitly; the stored permission rows
    // only constrain the staff role.
    if staff.role != StaffRole::Owner {
        if !policy.any_capability.is_empty() && !permissions.allows_any(policy.any_capability) {
            return Err(Denial::MissingCapability);
        }

        if let Some(branch_id) = &policy.branch_id {
            if !permissions.covers_branch(branch_id) {
                return Err(Denial::BranchOutOfScope);
            }
        }
    }

    Ok(())
}

/// Run a blocking auth-critical lookup off the async runtime, bounded by
/// [`AUTH_LOOKUP_TIMEOUT`].
pub async fn with_auth_timeout<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(AUTH_LOOKUP_TIMEOUT, tokio::task::spawn_blocking(f)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(AppError::Internal(format!(
            "auth lookup task failed: {}",
            join_error
        ))),
        Err(_) => Err(AppError::Timeout),
    }
}
