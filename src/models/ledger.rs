use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerEntryType {
    Income,
    Expense,
}

impl LedgerEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl FromStr for LedgerEntryType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    pub branch_id: String,
    pub entry_type: LedgerEntryType,
    pub amount_paise: i64,
    pub description: String,
    /// Set for entries written by the entitlement flow, as opposed to
    /// entries staff record by hand.
    pub auto_generated: bool,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLedgerEntry {
    pub branch_id: String,
    pub entry_type: LedgerEntryType,
    pub amount: f64,
    pub description: String,
}

impl CreateLedgerEntry {
    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(AppError::Validation("Amount must be positive".into()));
        }
        if self.description.trim().is_empty() {
            return Err(AppError::Validation("Description cannot be empty".into()));
        }
        Ok(())
    }

    pub fn amount_paise(&self) -> i64 {
        (self.amount * 100.0).round() as i64
    }
}
