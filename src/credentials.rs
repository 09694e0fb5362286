//! Gateway credential resolution.
//!
//! Precedence: branch-level credential (present and verified) → tenant-level
//! credential → platform-wide default from the environment. First match
//! wins; there is no merging and no cross-tenant fallback. An empty chain
//! is an explicit "not configured" condition, never a silent default.

use chrono::Utc;
use rusqlite::Connection;

use crate::crypto::MasterKey;
use crate::db::queries;
use crate::error::{msg, AppError, Result};
use crate::gateway::RazorpayCredential;

/// Which level of the chain supplied the credential. Callers that only need
/// the key pair use `credential()`; the tag exists so precedence is
/// observable and testable.
#[derive(Debug, Clone)]
pub enum ResolvedCredential {
    Branch(RazorpayCredential),
    Tenant(RazorpayCredential),
    Platform(RazorpayCredential),
}

impl ResolvedCredential {
    pub fn credential(&self) -> &RazorpayCredential {
        match self {
            Self::Branch(c) | Self::Tenant(c) | Self::Platform(c) => c,
        }
    }

    pub fn into_credential(self) -> RazorpayCredential {
        match self {
            Self::Branch(c) | Self::Tenant(c) | Self::Platform(c) => c,
        }
    }
}

/// Resolve the credential to use for a branch's payment operations.
///
/// The tenant-state gate runs first: a deleted branch or tenant reads as
/// not-found, an expired plan or disabled payments module refuses the
/// operation outright. Both public payment handlers resolve through here,
/// so a gym that is gone or lapsed cannot take money at any step.
///
/// Read-only; decryption happens with the server-held master key and the
/// secret never travels further than the gateway client.
pub fn resolve_for_branch(
    conn: &Connection,
    master_key: &MasterKey,
    platform_default: Option<&RazorpayCredential>,
    branch_id: &str,
) -> Result<ResolvedCredential> {
    let branch = queries::get_branch_by_id(conn, branch_id)?
        .filter(|b| b.deleted_at.is_none())
        .ok_or_else(|| AppError::NotFound(msg::BRANCH_NOT_FOUND.into()))?;

    let tenant = queries::get_tenant_by_id(conn, &branch.tenant_id)?
        .filter(|t| !t.is_deleted())
        .ok_or_else(|| AppError::NotFound(msg::BRANCH_NOT_FOUND.into()))?;

    if tenant.plan_expired(Utc::now().timestamp()) {
        return Err(AppError::Forbidden(msg::PLAN_EXPIRED.into()));
    }
    if !tenant.module_enabled("payments") {
        return Err(AppError::Forbidden(msg::MODULE_NOT_AVAILABLE.into()));
    }

    // Branch override only counts once its live test passed.
    if branch.razorpay_verified() {
        if let Some(credential) = branch.decrypt_razorpay_config(master_key)? {
            return Ok(ResolvedCredential::Branch(credential));
        }
    }

    if let Some(credential) = tenant.decrypt_razorpay_config(master_key)? {
        return Ok(ResolvedCredential::Tenant(credential));
    }

    match platform_default {
        Some(credential) => Ok(ResolvedCredential::Platform(credential.clone())),
        None => Err(AppError::GatewayNotConfigured),
    }
}
