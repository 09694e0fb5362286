use std::env;

use crate::gateway::RazorpayCredential;

/// Amount ceiling for a single order, in rupees.
pub const MAX_ORDER_AMOUNT_RUPEES: f64 = 1_000_000.0;

/// Trainer fee ceiling, in rupees.
pub const MAX_TRAINER_FEE_RUPEES: f64 = 500_000.0;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub strict_rpm: u32,
    pub standard_rpm: u32,
    pub relaxed_rpm: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// Base64-encoded 32-byte master key for credential encryption.
    pub master_key: Option<String>,
    /// Platform-wide Razorpay credential used when a tenant has none.
    pub platform_credential: Option<RazorpayCredential>,
    pub bootstrap_admin_name: Option<String>,
    pub rate_limit: RateLimitConfig,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("GYMPAY_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        // Both halves must be present for the platform default to exist;
        // a key id without a secret is treated as not configured.
        let platform_credential = match (
            env::var("RAZORPAY_KEY_ID").ok(),
            env::var("RAZORPAY_KEY_SECRET").ok(),
        ) {
            (Some(key_id), Some(key_secret)) => Some(RazorpayCredential { key_id, key_secret }),
            _ => None,
        };

        let rate_limit = RateLimitConfig {
            strict_rpm: env_u32("RATE_LIMIT_STRICT_RPM", 10),
            standard_rpm: env_u32("RATE_LIMIT_STANDARD_RPM", 30),
            relaxed_rpm: env_u32("RATE_LIMIT_RELAXED_RPM", 60),
        };

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "gympay.db".to_string()),
            master_key: env::var("MASTER_KEY").ok(),
            platform_credential,
            bootstrap_admin_name: env::var("BOOTSTRAP_ADMIN_NAME").ok(),
            rate_limit,
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
