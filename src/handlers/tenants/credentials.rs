//! Gateway credential management for tenants and branches.
//!
//! Secrets are accepted once, proven against the live gateway, encrypted
//! under the server master key and stored. Status responses carry only a
//! masked key id; the secret is never returned in any shape.

use axum::extract::{Extension, State};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, Result};
use crate::extractors::{Json, Path};
use crate::gateway::{is_valid_key_id, mask_key_id, RazorpayClient, RazorpayCredential};
use crate::middleware::{resolve_tenant_branch, TenantContext};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveCredentialRequest {
    pub key_id: String,
    pub key_secret: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStatusResponse {
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_id_masked: Option<String>,
    pub verified_at: Option<i64>,
}

/// Validate, live-test and encrypt an incoming credential pair.
///
/// The live test creates a minimal order against the real gateway, so a
/// typo in the secret is caught here instead of at a member's checkout.
async fn prepare_credential(
    state: &AppState,
    scope: &str,
    input: SaveCredentialRequest,
) -> Result<Vec<u8>> {
    if !is_valid_key_id(&input.key_id) {
        return Err(AppError::BadRequest(msg::INVALID_KEY_ID.into()));
    }
    if input.key_secret.trim().is_empty() {
        return Err(AppError::BadRequest("Key secret cannot be empty".into()));
    }

    let credential = RazorpayCredential {
        key_id: input.key_id,
        key_secret: input.key_secret,
    };

    RazorpayClient::new(&credential).test_credentials().await?;

    let json = serde_json::to_string(&credential)?;
    state.master_key.encrypt(scope, json.as_bytes())
}

// ============ Tenant scope ============

pub async fn tenant_credential_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> Result<Json<CredentialStatusResponse>> {
    ctx.require_owner()?;

    let key_id_masked = ctx
        .tenant
        .decrypt_razorpay_config(&state.master_key)?
        .map(|c| mask_key_id(&c.key_id));

    Ok(Json(CredentialStatusResponse {
        configured: ctx.tenant.has_razorpay_config(),
        key_id_masked,
        verified_at: ctx.tenant.razorpay_verified_at,
    }))
}

pub async fn save_tenant_credential(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(input): Json<SaveCredentialRequest>,
) -> Result<Json<CredentialStatusResponse>> {
    ctx.require_owner()?;

    let encrypted = prepare_credential(&state, &ctx.tenant.id, input).await?;
    let verified_at = Utc::now().timestamp();

    let conn = state.db.get()?;
    if !queries::set_tenant_razorpay_config(&conn, &ctx.tenant.id, Some(&encrypted), Some(verified_at))? {
        return Err(AppError::NotFound(msg::TENANT_NOT_FOUND.into()));
    }

    tracing::info!(tenant_id = %ctx.tenant.id, "Tenant gateway credential saved and verified");

    let tenant = queries::get_tenant_by_id(&conn, &ctx.tenant.id)?
        .ok_or_else(|| AppError::NotFound(msg::TENANT_NOT_FOUND.into()))?;
    let key_id_masked = tenant
        .decrypt_razorpay_config(&state.master_key)?
        .map(|c| mask_key_id(&c.key_id));

    Ok(Json(CredentialStatusResponse {
        configured: true,
        key_id_masked,
        verified_at: Some(verified_at),
    }))
}

pub async fn remove_tenant_credential(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> Result<Json<serde_json::Value>> {
    ctx.require_owner()?;

    let conn = state.db.get()?;
    if !queries::set_tenant_razorpay_config(&conn, &ctx.tenant.id, None, None)? {
        return Err(AppError::NotFound(msg::TENANT_NOT_FOUND.into()));
    }

    tracing::info!(tenant_id = %ctx.tenant.id, "Tenant gateway credential removed");

    Ok(Json(serde_json::json!({ "success": true })))
}

// ============ Branch scope ============

pub async fn branch_credential_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(branch_id): Path<String>,
) -> Result<Json<CredentialStatusResponse>> {
    ctx.require_owner()?;

    let conn = state.db.get()?;
    let branch = resolve_tenant_branch(&conn, &ctx, &branch_id)?;

    let key_id_masked = branch
        .decrypt_razorpay_config(&state.master_key)?
        .map(|c| mask_key_id(&c.key_id));

    Ok(Json(CredentialStatusResponse {
        configured: branch.has_razorpay_config(),
        key_id_masked,
        verified_at: branch.razorpay_verified_at,
    }))
}

pub async fn save_branch_credential(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(branch_id): Path<String>,
    Json(input): Json<SaveCredentialRequest>,
) -> Result<Json<CredentialStatusResponse>> {
    ctx.require_owner()?;

    {
        let conn = state.db.get()?;
        resolve_tenant_branch(&conn, &ctx, &branch_id)?;
    }

    let encrypted = prepare_credential(&state, &branch_id, input).await?;
    let verified_at = Utc::now().timestamp();

    let conn = state.db.get()?;
    if !queries::set_branch_razorpay_config(&conn, &branch_id, Some(&encrypted), Some(verified_at))? {
        return Err(AppError::NotFound(msg::BRANCH_NOT_FOUND.into()));
    }

    tracing::info!(
        tenant_id = %ctx.tenant.id,
        branch_id = %branch_id,
        "Branch gateway credential saved and verified"
    );

    let branch = resolve_tenant_branch(&conn, &ctx, &branch_id)?;
    let key_id_masked = branch
        .decrypt_razorpay_config(&state.master_key)?
        .map(|c| mask_key_id(&c.key_id));

    Ok(Json(CredentialStatusResponse {
        configured: true,
        key_id_masked,
        verified_at: Some(verified_at),
    }))
}

pub async fn remove_branch_credential(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(branch_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    ctx.require_owner()?;

    let conn = state.db.get()?;
    resolve_tenant_branch(&conn, &ctx, &branch_id)?;

    if !queries::set_branch_razorpay_config(&conn, &branch_id, None, None)? {
        return Err(AppError::NotFound(msg::BRANCH_NOT_FOUND.into()));
    }

    tracing::info!(tenant_id = %ctx.tenant.id, branch_id = %branch_id, "Branch gateway credential removed");

    Ok(Json(serde_json::json!({ "success": true })))
}
