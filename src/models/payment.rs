use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Cash,
    Online,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Online => "online",
        }
    }
}

impl FromStr for PaymentMode {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "online" => Ok(Self::Online),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            _ => Err(()),
        }
    }
}

/// A persisted payment record. Exactly one row per completed purchase;
/// online payments exist only after signature verification succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub branch_id: String,
    pub member_id: Option<String>,
    pub daily_pass_user_id: Option<String>,
    pub subscription_id: Option<String>,
    pub amount_paise: i64,
    pub mode: PaymentMode,
    pub status: PaymentStatus,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub created_at: i64,
}

/// Cash payment recorded directly by staff; no gateway involvement.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCashPayment {
    pub branch_id: String,
    pub member_id: String,
    pub amount: f64,
    #[serde(default)]
    pub months: Option<u32>,
    #[serde(default)]
    pub custom_days: Option<u32>,
}

impl CreateCashPayment {
    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(AppError::Validation("Amount must be positive".into()));
        }
        if self.amount > crate::config::MAX_ORDER_AMOUNT_RUPEES {
            return Err(AppError::Validation("Amount exceeds the allowed limit".into()));
        }
        match (self.months, self.custom_days) {
            (Some(m), None) if (1..=24).contains(&m) => Ok(()),
            (None, Some(d)) if (1..=365).contains(&d) => Ok(()),
            _ => Err(AppError::Validation(
                "Provide either months (1-24) or customDays (1-365)".into(),
            )),
        }
    }

    pub fn amount_paise(&self) -> i64 {
        (self.amount * 100.0).round() as i64
    }
}
