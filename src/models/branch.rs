use serde::{Deserialize, Serialize};

use crate::crypto::MasterKey;
use crate::error::{msg, AppError, Result};
use crate::gateway::RazorpayCredential;

/// A physical gym location belonging to a tenant.
///
/// A branch may carry its own Razorpay credential; it overrides the
/// tenant-level one when present and verified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    #[serde(skip)]
    pub razorpay_config_encrypted: Option<Vec<u8>>,
    pub razorpay_verified_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
}

impl Branch {
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

    pub fn has_razorpay_config(&self) -> bool {
        self.razorpay_config_encrypted.is_some()
    }

    /// A branch override only takes effect once the live test has passed.
    pub fn razorpay_verified(&self) -> bool {
        self.has_razorpay_config() && self.razorpay_verified_at.is_some()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBranch {
    pub name: String,
}

impl CreateBranch {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest(msg::NAME_EMPTY.into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateBranch {
    pub name: Option<String>,
}

impl UpdateBranch {
    pub fn validate(&self) -> Result<()> {
        if let Some(ref name) = self.name {
            if name.trim().is_empty() {
                return Err(AppError::BadRequest(msg::NAME_EMPTY.into()));
            }
        }
        Ok(())
    }
}
