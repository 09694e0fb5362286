use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{msg, AppError, Result};

type HmacSha256 = Hmac<Sha256>;

const ORDERS_URL: &str = "https://api.razorpay.com/v1/orders";

/// Accepted key id prefixes published by Razorpay.
const KEY_ID_PREFIXES: &[&str] = &["rzp_test_", "rzp_live_"];

/// A key-id/key-secret pair. The secret never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RazorpayCredential {
    pub key_id: String,
    pub key_secret: String,
}

/// Check the key id against Razorpay's published prefixes before storage.
pub fn is_valid_key_id(key_id: &str) -> bool {
    KEY_ID_PREFIXES.iter().any(|p| {
        key_id.len() > p.len() && key_id.starts_with(p)
    })
}

/// Mask a key id for status responses: prefix plus last 4 characters.
pub fn mask_key_id(key_id: &str) -> String {
    let prefix = KEY_ID_PREFIXES
        .iter()
        .find(|p| key_id.starts_with(*p))
        .copied()
        .unwrap_or("");
    let tail = if key_id.len() >= 4 {
        &key_id[key_id.len() - 4..]
    } else {
        key_id
    };
    format!("{}****{}", prefix, tail)
}

/// Purchase-intent fields embedded in the gateway order so the later
/// verification call can be checked against what was actually ordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderNotes {
    pub member_id: Option<String>,
    pub member_name: String,
    pub member_phone: String,
    pub is_new_member: bool,
    pub months: Option<u32>,
    pub custom_days: Option<u32>,
    pub trainer_id: Option<String>,
    pub trainer_fee: Option<f64>,
    pub branch_id: String,
    pub is_daily_pass: bool,
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
    notes: &'a OrderNotes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct RazorpayClient {
    client: Client,
    key_id: String,
    key_secret: String,
}

impl RazorpayClient {
    pub fn new(credential: &RazorpayCredential) -> Self {
        Self {
            client: Client::new(),
            key_id: credential.key_id.clone(),
            key_secret: credential.key_secret.clone(),
        }
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Create a gateway order. `amount_paise` is in minor currency units.
    /// Non-2xx responses surface as a gateway error; never retried.
    pub async fn create_order(
        &self,
        amount_paise: i64,
        receipt: &str,
        notes: &OrderNotes,
    ) -> Result<GatewayOrder> {
        let body = CreateOrderBody {
            amount: amount_paise,
            currency: "INR",
            receipt,
            notes,
        };

        let response = self
            .client
            .post(ORDERS_URL)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("Razorpay unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!(
                "Razorpay order creation failed ({}): {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("Failed to parse Razorpay response: {}", e)))
    }

    /// Create a minimal ₹1 order to prove a credential pair works before it
    /// is persisted. Reuses the order path so a bad secret fails loudly.
    pub async fn test_credentials(&self) -> Result<()> {
        let notes = OrderNotes {
            member_id: None,
            member_name: "credential check".into(),
            member_phone: String::new(),
            is_new_member: false,
            months: None,
            custom_days: None,
            trainer_id: None,
            trainer_fee: None,
            branch_id: String::new(),
            is_daily_pass: false,
        };
        let receipt = format!("credcheck_{}", chrono::Utc::now().timestamp());
        self.create_order(100, &receipt, &notes)
            .await
            .map_err(|_| AppError::BadRequest(msg::CREDENTIAL_TEST_FAILED.into()))?;
        Ok(())
    }

    /// Verify the checkout callback signature.
    ///
    /// Razorpay signs `order_id|payment_id` with the key secret using
    /// HMAC-SHA256 and sends the hex digest. Comparison is constant-time;
    /// an attacker must not be able to discover the digest byte-by-byte
    /// from response timings.
    pub fn verify_checkout_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> bool {
        let payload = format!("{}|{}", order_id, payment_id);

        let mut mac = HmacSha256::new_from_slice(self.key_secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        let expected_bytes = expected.as_bytes();
        let provided_bytes = signature.as_bytes();

        // Length is not secret (always 64 hex chars for SHA-256)
        if expected_bytes.len() != provided_bytes.len() {
            return false;
        }

        expected_bytes.ct_eq(provided_bytes).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_id_prefix_validation() {
        assert!(is_valid_key_id("rzp_test_a1b2c3"));
        assert!(is_valid_key_id("rzp_live_a1b2c3"));
        assert!(!is_valid_key_id("rzp_test_"));
        assert!(!is_valid_key_id("sk_test_a1b2c3"));
        assert!(!is_valid_key_id(""));
    }

    #[test]
    fn masked_key_id_hides_body() {
        let masked = mask_key_id("rzp_test_a1b2c3d4e5");
        assert_eq!(masked, "rzp_test_****d4e5");
        assert!(!masked.contains("a1b2"));
    }
}
