//! Prefixed ID generation for gympay entities.
//!
//! All IDs use a `gy_` brand prefix to guarantee collision avoidance with
//! Razorpay's ids (`order_`, `pay_`, `rzp_` keys and so on).
//!
//! Format: `gy_{entity}_{uuid_simple}` (32 hex chars, no hyphens)

use uuid::Uuid;

/// All known entity prefixes for validation.
const ALL_PREFIXES: &[&str] = &[
    "gy_ten_",
    "gy_br_",
    "gy_stf_",
    "gy_mem_",
    "gy_sub_",
    "gy_pay_",
    "gy_led_",
    "gy_pkg_",
    "gy_trn_",
    "gy_dpu_",
    "gy_adm_",
];

/// Validate that a string is a well-formed gympay prefixed ID.
/// Cheap check to reject garbage before hitting the database.
pub fn is_valid_prefixed_id(s: &str) -> bool {
    let Some(prefix) = ALL_PREFIXES.iter().find(|p| s.starts_with(*p)) else {
        return false;
    };

    let hex_part = &s[prefix.len()..];
    hex_part.len() == 32 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

/// Entity types that have prefixed IDs.
#[derive(Debug, Clone, Copy)]
pub enum EntityType {
    Tenant,
    Branch,
    Staff,
    Member,
    Subscription,
    Payment,
    LedgerEntry,
    Package,
    Trainer,
    DailyPassUser,
    PlatformAdmin,
}

impl EntityType {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Tenant => "gy_ten",
            Self::Branch => "gy_br",
            Self::Staff => "gy_stf",
            Self::Member => "gy_mem",
            Self::Subscription => "gy_sub",
            Self::Payment => "gy_pay",
            Self::LedgerEntry => "gy_led",
            Self::Package => "gy_pkg",
            Self::Trainer => "gy_trn",
            Self::DailyPassUser => "gy_dpu",
            Self::PlatformAdmin => "gy_adm",
        }
    }

    pub fn gen_id(&self) -> String {
        format!("{}_{}", self.prefix(), Uuid::new_v4().as_simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_format() {
        let id = EntityType::Tenant.gen_id();
        assert!(id.starts_with("gy_ten_"));
        assert_eq!(id.len(), "gy_ten_".len() + 32);
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(EntityType::Member.gen_id(), EntityType::Member.gen_id());
    }

    #[test]
    fn test_is_valid_prefixed_id() {
        assert!(is_valid_prefixed_id("gy_mem_a1b2c3d4e5f6789012345678901234ab"));
        assert!(is_valid_prefixed_id(&EntityType::Branch.gen_id()));
        assert!(is_valid_prefixed_id(&EntityType::Payment.gen_id()));

        assert!(!is_valid_prefixed_id(""));
        assert!(!is_valid_prefixed_id("a1b2c3d4-e5f6-7890-1234-567890123456"));
        assert!(!is_valid_prefixed_id("gy_zzz_a1b2c3d4e5f6789012345678901234ab"));
        assert!(!is_valid_prefixed_id("gy_mem_a1b2"));
        assert!(!is_valid_prefixed_id("gy_mem_a1b2c3d4e5f6789012345678901234gg"));
    }
}
