use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{msg, AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    /// Tenant admin. Full access within the tenant.
    Owner,
    /// Employee account; access is governed by permission flags.
    Staff,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Staff => "staff",
        }
    }
}

impl FromStr for StaffRole {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "staff" => Ok(Self::Staff),
            _ => Err(()),
        }
    }
}

/// Fixed capability set for staff accounts.
///
/// A closed enum, not a string-keyed map: adding a capability forces every
/// match site to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ManageMembers,
    AccessLedger,
    AccessPayments,
    AccessAnalytics,
    ChangeSettings,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManageMembers => "manage_members",
            Self::AccessLedger => "access_ledger",
            Self::AccessPayments => "access_payments",
            Self::AccessAnalytics => "access_analytics",
            Self::ChangeSettings => "change_settings",
        }
    }
}

/// Per-staff capability flags, optionally restricted to a set of branches
/// (empty = all branches of the tenant).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionSet {
    pub manage_members: bool,
    pub access_ledger: bool,
    pub access_payments: bool,
    pub access_analytics: bool,
    pub change_settings: bool,
    #[serde(default)]
    pub branch_ids: Vec<String>,
}

impl PermissionSet {
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::ManageMembers => self.manage_members,
            Capability::AccessLedger => self.access_ledger,
            Capability::AccessPayments => self.access_payments,
            Capability::AccessAnalytics => self.access_analytics,
            Capability::ChangeSettings => self.change_settings,
        }
    }

    /// OR semantics across a required set.
    pub fn allows_any(&self, capabilities: &[Capability]) -> bool {
        capabilities.iter().any(|c| self.allows(*c))
    }

    pub fn covers_branch(&self, branch_id: &str) -> bool {
        self.branch_ids.is_empty() || self.branch_ids.iter().any(|b| b == branch_id)
    }

    /// Everything granted; used for tenant owners.
    pub fn full() -> Self {
        Self {
            manage_members: true,
            access_ledger: true,
            access_payments: true,
            access_analytics: true,
            change_settings: true,
            branch_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub role: StaffRole,
    #[serde(skip)]
    pub api_key_hash: String,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
}

/// Super-admin console identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformAdmin {
    pub id: String,
    pub name: String,
    #[serde(skip)]
    pub api_key_hash: String,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateStaff {
    pub name: String,
    pub role: StaffRole,
    #[serde(default)]
    pub permissions: Option<PermissionSet>,
}

impl CreateStaff {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest(msg::NAME_EMPTY.into()));
        }
        Ok(())
    }
}
