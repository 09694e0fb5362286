use serde::{Deserialize, Serialize};

use crate::crypto::MasterKey;
use crate::error::{msg, AppError, Result};
use crate::gateway::RazorpayCredential;

/// A gym organization subscribing to the platform.
///
/// Tenants are soft-deleted only: `deleted_at` is set, the row stays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    /// Plan expiry (epoch seconds). None = never expires.
    pub plan_expires_at: Option<i64>,
    /// Feature modules enabled on the tenant's plan.
    /// None = all modules enabled (legacy provisioning).
    pub enabled_modules: Option<Vec<String>>,
    pub max_branches: i64,
    pub max_staff: i64,
    pub max_members: i64,
    pub max_messages: i64,
    /// Encrypted Razorpay credential (None if not configured)
    #[serde(skip)]
    pub razorpay_config_encrypted: Option<Vec<u8>>,
    pub razorpay_verified_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
}

impl Tenant {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn plan_expired(&self, now: i64) -> bool {
        matches!(self.plan_expires_at, Some(exp) if exp < now)
    }

    pub fn module_enabled(&self, module: &str) -> bool {
        match &self.enabled_modules {
            None => true,
            Some(modules) => modules.iter().any(|m| m == module),
        }
    }

    /// Decrypt and parse the stored Razorpay credential.
    pub fn decrypt_razorpay_config(
        &self,
        master_key: &MasterKey,
    ) -> Result<Option<RazorpayCredential>> {
        let Some(encrypted) = &self.razorpay_config_encrypted else {
            return Ok(None);
        };

        let decrypted = master_key.decrypt(&self.id, encrypted)?;
        let json = String::from_utf8(decrypted)
            .map_err(|_| AppError::Internal("Invalid UTF-8 in credential".into()))?;
        let credential: RazorpayCredential = serde_json::from_str(&json)?;
        Ok(Some(credential))
    }

    /// Check if a credential is stored (without decrypting).
    pub fn has_razorpay_config(&self) -> bool {
        self.razorpay_config_encrypted.is_some()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTenant {
    pub name: String,
    #[serde(default)]
    pub plan_expires_at: Option<i64>,
    #[serde(default)]
    pub enabled_modules: Option<Vec<String>>,
    #[serde(default = "default_max_branches")]
    pub max_branches: i64,
    #[serde(default = "default_max_staff")]
    pub max_staff: i64,
    #[serde(default = "default_max_members")]
    pub max_members: i64,
    #[serde(default = "default_max_messages")]
    pub max_messages: i64,
}

fn default_max_branches() -> i64 {
    1
}
fn default_max_staff() -> i64 {
    5
}
fn default_max_members() -> i64 {
    200
}
fn default_max_messages() -> i64 {
    1000
}

impl CreateTenant {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest(msg::NAME_EMPTY.into()));
        }
        if self.max_branches < 1 || self.max_staff < 1 || self.max_members < 1 {
            return Err(AppError::BadRequest("Limits must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub plan_expires_at: Option<Option<i64>>,
    pub enabled_modules: Option<Option<Vec<String>>>,
    pub max_branches: Option<i64>,
    pub max_staff: Option<i64>,
    pub max_members: Option<i64>,
    pub max_messages: Option<i64>,
}

impl UpdateTenant {
    pub fn validate(&self) -> Result<()> {
        if let Some(ref name) = self.name {
            if name.trim().is_empty() {
                return Err(AppError::BadRequest(msg::NAME_EMPTY.into()));
            }
        }
        Ok(())
    }
}

/// Tenant view for the platform console: credential presence as a boolean,
/// never the blob.
#[derive(Debug, Clone, Serialize)]
pub struct TenantPublic {
    pub id: String,
    pub name: String,
    pub plan_expires_at: Option<i64>,
    pub enabled_modules: Option<Vec<String>>,
    pub max_branches: i64,
    pub max_staff: i64,
    pub max_members: i64,
    pub max_messages: i64,
    pub has_razorpay: bool,
    pub razorpay_verified_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
}

impl From<Tenant> for TenantPublic {
    fn from(t: Tenant) -> Self {
        let has_razorpay = t.has_razorpay_config();
        Self {
            id: t.id,
            name: t.name,
            plan_expires_at: t.plan_expires_at,
            enabled_modules: t.enabled_modules,
            max_branches: t.max_branches,
            max_staff: t.max_staff,
            max_members: t.max_members,
            max_messages: t.max_messages,
            has_razorpay,
            razorpay_verified_at: t.razorpay_verified_at,
            created_at: t.created_at,
            updated_at: t.updated_at,
            deleted_at: t.deleted_at,
        }
    }
}
