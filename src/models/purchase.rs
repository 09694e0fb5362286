use serde::{Deserialize, Serialize};

use crate::config::{MAX_ORDER_AMOUNT_RUPEES, MAX_TRAINER_FEE_RUPEES};
use crate::error::{AppError, Result};
use crate::gateway::OrderNotes;
use crate::id::is_valid_prefixed_id;

/// Purchase request as submitted by the registration/renewal flow.
///
/// Every rule here runs before any gateway call is made, and runs again at
/// verification time against the client-echoed copy of the same fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Amount in rupees; converted to paise for the gateway call.
    pub amount: f64,
    #[serde(default)]
    pub member_id: Option<String>,
    pub member_name: String,
    pub member_phone: String,
    pub is_new_member: bool,
    #[serde(default)]
    pub months: Option<u32>,
    #[serde(default)]
    pub custom_days: Option<u32>,
    #[serde(default)]
    pub trainer_id: Option<String>,
    #[serde(default)]
    pub trainer_fee: Option<f64>,
    pub branch_id: String,
    #[serde(default)]
    pub is_daily_pass: bool,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> Result<()> {
        validate_person_name(&self.member_name)?;
        validate_phone(&self.member_phone)?;

        // Reject malformed ids before any database lookup
        if !is_valid_prefixed_id(&self.branch_id) {
            return Err(AppError::Validation("Invalid branch id".into()));
        }
        if let Some(id) = &self.member_id {
            if !is_valid_prefixed_id(id) {
                return Err(AppError::Validation("Invalid member id".into()));
            }
        }
        if let Some(id) = &self.trainer_id {
            if !is_valid_prefixed_id(id) {
                return Err(AppError::Validation("Invalid trainer id".into()));
            }
        }

        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(AppError::Validation("Amount must be positive".into()));
        }
        if self.amount > MAX_ORDER_AMOUNT_RUPEES {
            return Err(AppError::Validation("Amount exceeds the allowed limit".into()));
        }

        match (self.months, self.custom_days) {
            (Some(m), None) => {
                if !(1..=24).contains(&m) {
                    return Err(AppError::Validation(
                        "Months must be between 1 and 24".into(),
                    ));
                }
            }
            (None, Some(d)) => {
                if !(1..=365).contains(&d) {
                    return Err(AppError::Validation(
                        "Custom days must be between 1 and 365".into(),
                    ));
                }
            }
            _ => {
                return Err(AppError::Validation(
                    "Provide either months or customDays, not both".into(),
                ));
            }
        }

        if let Some(fee) = self.trainer_fee {
            if !fee.is_finite() || fee < 0.0 {
                return Err(AppError::Validation("Trainer fee cannot be negative".into()));
            }
            if fee > MAX_TRAINER_FEE_RUPEES {
                return Err(AppError::Validation(
                    "Trainer fee exceeds the allowed limit".into(),
                ));
            }
        }

        if self.is_daily_pass {
            if self.custom_days.is_none() {
                return Err(AppError::Validation(
                    "Daily pass requires customDays".into(),
                ));
            }
        } else if !self.is_new_member && self.member_id.is_none() {
            return Err(AppError::Validation(
                "memberId is required for an existing member".into(),
            ));
        }

        Ok(())
    }

    /// Gateway amount in minor currency units (×100).
    pub fn amount_paise(&self) -> i64 {
        (self.amount * 100.0).round() as i64
    }

    /// Notes payload embedded in the gateway order so the verification call
    /// can reconstruct the intended purchase.
    pub fn to_notes(&self) -> OrderNotes {
        OrderNotes {
            member_id: if self.is_new_member {
                Some("new".to_string())
            } else {
                self.member_id.clone()
            },
            member_name: self.member_name.clone(),
            member_phone: self.member_phone.clone(),
            is_new_member: self.is_new_member,
            months: self.months,
            custom_days: self.custom_days,
            trainer_id: self.trainer_id.clone(),
            trainer_fee: self.trainer_fee,
            branch_id: self.branch_id.clone(),
            is_daily_pass: self.is_daily_pass,
        }
    }
}

/// 2-100 characters, letters/spaces/dot/hyphen/apostrophe only.
pub fn validate_person_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if !(2..=100).contains(&len) {
        return Err(AppError::Validation(
            "Name must be between 2 and 100 characters".into(),
        ));
    }
    let ok = trimmed
        .chars()
        .all(|c| c.is_alphabetic() || c == ' ' || c == '.' || c == '-' || c == '\'');
    if !ok {
        return Err(AppError::Validation(
            "Name may only contain letters, spaces, dots, hyphens and apostrophes".into(),
        ));
    }
    Ok(())
}

/// Exactly 10 digits, first digit 6-9 (Indian mobile numbering).
pub fn validate_phone(phone: &str) -> Result<()> {
    let ok = phone.len() == 10
        && phone.chars().all(|c| c.is_ascii_digit())
        && matches!(phone.as_bytes()[0], b'6'..=b'9');
    if !ok {
        return Err(AppError::Validation(
            "Phone must be a 10-digit mobile number starting with 6-9".into(),
        ));
    }
    Ok(())
}

/// Razorpay checkout callback triple plus the re-submitted purchase intent.
/// The intent is untrusted and re-validated server-side.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    #[serde(flatten)]
    pub intent: CreateOrderRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    /// Public key id only; the secret never reaches a client.
    pub key_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_pass_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_daily_pass: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> CreateOrderRequest {
        CreateOrderRequest {
            amount: 1700.0,
            member_id: None,
            member_name: "Asha Rao".into(),
            member_phone: "9876543210".into(),
            is_new_member: true,
            months: Some(3),
            custom_days: None,
            trainer_id: None,
            trainer_fee: None,
            branch_id: "gy_br_a1b2c3d4e5f6789012345678901234ab".into(),
            is_daily_pass: false,
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(base_request().validate().is_ok());
    }

    #[test]
    fn amount_converts_to_paise() {
        // 500×3 + 200 joining fee
        assert_eq!(base_request().amount_paise(), 170_000);
    }

    #[test]
    fn phone_rules() {
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("6000000000").is_ok());
        assert!(validate_phone("5876543210").is_err()); // first digit out of range
        assert!(validate_phone("987654321").is_err()); // too short
        assert!(validate_phone("98765432100").is_err()); // too long
        assert!(validate_phone("98765asdfg").is_err()); // non-digits
        assert!(validate_phone("").is_err());
    }

    #[test]
    fn name_rules() {
        assert!(validate_person_name("Asha Rao").is_ok());
        assert!(validate_person_name("O'Brien-D. Souza").is_ok());
        assert!(validate_person_name("A").is_err());
        assert!(validate_person_name(&"x".repeat(101)).is_err());
        assert!(validate_person_name("Robert; DROP TABLE").is_err());
    }

    #[test]
    fn amount_ceiling() {
        let mut req = base_request();
        req.amount = 0.0;
        assert!(req.validate().is_err());
        req.amount = -5.0;
        assert!(req.validate().is_err());
        req.amount = 1_000_001.0;
        assert!(req.validate().is_err());
        req.amount = 1_000_000.0;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn duration_is_exclusive() {
        let mut req = base_request();
        req.months = Some(3);
        req.custom_days = Some(10);
        assert!(req.validate().is_err());

        req.months = None;
        req.custom_days = None;
        assert!(req.validate().is_err());

        req.custom_days = Some(90);
        assert!(req.validate().is_ok());

        req.custom_days = Some(366);
        assert!(req.validate().is_err());

        req.custom_days = None;
        req.months = Some(25);
        assert!(req.validate().is_err());
    }

    #[test]
    fn trainer_fee_ceiling() {
        let mut req = base_request();
        req.trainer_fee = Some(500_000.0);
        assert!(req.validate().is_ok());
        req.trainer_fee = Some(500_001.0);
        assert!(req.validate().is_err());
        req.trainer_fee = Some(-1.0);
        assert!(req.validate().is_err());
    }

    #[test]
    fn existing_member_requires_id() {
        let mut req = base_request();
        req.is_new_member = false;
        assert!(req.validate().is_err());
        req.member_id = Some("gy_mem_a1b2c3d4e5f6789012345678901234ab".into());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn malformed_ids_are_rejected() {
        let mut req = base_request();
        req.branch_id = "not-an-id".into();
        assert!(req.validate().is_err());

        let mut req = base_request();
        req.is_new_member = false;
        req.member_id = Some("mem_123".into());
        assert!(req.validate().is_err());

        let mut req = base_request();
        req.trainer_id = Some("'; DROP TABLE trainers; --".into());
        assert!(req.validate().is_err());
    }

    #[test]
    fn new_member_notes_use_sentinel() {
        let notes = base_request().to_notes();
        assert_eq!(notes.member_id.as_deref(), Some("new"));
    }
}
