use serde::{Deserialize, Serialize};

use crate::error::{msg, AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub id: String,
    pub branch_id: String,
    pub name: String,
    pub months: u32,
    pub price_paise: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trainer {
    pub id: String,
    pub branch_id: String,
    pub name: String,
    pub phone: String,
    pub specialization: Option<String>,
    pub monthly_fee_paise: i64,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePackage {
    pub name: String,
    pub months: u32,
    pub price: f64,
}

impl CreatePackage {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest(msg::NAME_EMPTY.into()));
        }
        if !(1..=24).contains(&self.months) {
            return Err(AppError::Validation("Months must be between 1 and 24".into()));
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(AppError::Validation("Price must be positive".into()));
        }
        Ok(())
    }

    pub fn price_paise(&self) -> i64 {
        (self.price * 100.0).round() as i64
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTrainer {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub specialization: Option<String>,
    pub monthly_fee: f64,
}

impl CreateTrainer {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest(msg::NAME_EMPTY.into()));
        }
        if !self.monthly_fee.is_finite() || self.monthly_fee < 0.0 {
            return Err(AppError::Validation("Monthly fee cannot be negative".into()));
        }
        Ok(())
    }

    pub fn monthly_fee_paise(&self) -> i64 {
        (self.monthly_fee * 100.0).round() as i64
    }
}

// ============ Public registration view ============
//
// Served to unauthenticated registration flows. Only non-sensitive fields:
// package pricing, trainer names, the branch display name. Phone numbers,
// specializations and financial internals are excluded on purpose.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPackage {
    pub id: String,
    pub name: String,
    pub months: u32,
    pub price_paise: i64,
}

#[derive(Debug, Serialize)]
pub struct PublicTrainer {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationData {
    pub branch_name: String,
    pub packages: Vec<PublicPackage>,
    pub trainers: Vec<PublicTrainer>,
}

impl From<Package> for PublicPackage {
    fn from(p: Package) -> Self {
        Self {
            id: p.id,
            name: p.name,
            months: p.months,
            price_paise: p.price_paise,
        }
    }
}

impl From<Trainer> for PublicTrainer {
    fn from(t: Trainer) -> Self {
        Self { id: t.id, name: t.name }
    }
}
