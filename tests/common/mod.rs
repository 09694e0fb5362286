//! Test utilities and fixtures for Gympay integration tests

#![allow(dead_code)]

use axum::routing::{get, post};
use axum::Router;
use hmac::{Hmac, Mac};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;

use gympay::handlers::public::{create_order, registration_data, verify_payment};

pub use gympay::crypto::MasterKey;
pub use gympay::db::{init_db, queries, AppState};
pub use gympay::dedup::DedupCache;
pub use gympay::gateway::RazorpayCredential;
pub use gympay::models::*;

/// Create a test master key (deterministic for testing)
pub fn test_master_key() -> MasterKey {
    MasterKey::from_bytes([0u8; 32])
}

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create an AppState for testing with an in-memory database
pub fn create_test_app_state() -> AppState {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(4).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }

    AppState {
        db: pool,
        master_key: test_master_key(),
        platform_credential: None,
        dedup: Arc::new(DedupCache::new(Duration::from_secs(30), 64)),
    }
}

/// The public routes without rate-limit layers (those need per-request
/// connection info a oneshot request does not carry)
pub fn public_app(state: AppState) -> Router {
    Router::new()
        .route("/functions/create-order", post(create_order))
        .route("/functions/verify-payment", post(verify_payment))
        .route("/public/registration/{branch_id}", get(registration_data))
        .with_state(state)
}

/// Create a test tenant with generous defaults
pub fn create_test_tenant(conn: &Connection, name: &str) -> Tenant {
    let input = CreateTenant {
        name: name.to_string(),
        plan_expires_at: None,
        enabled_modules: None,
        max_branches: 5,
        max_staff: 10,
        max_members: 100,
        max_messages: 1000,
    };
    queries::create_tenant(conn, &input).expect("Failed to create test tenant")
}

/// Create a test branch
pub fn create_test_branch(conn: &Connection, tenant_id: &str, name: &str) -> Branch {
    let input = CreateBranch {
        name: name.to_string(),
    };
    queries::create_branch(conn, tenant_id, &input).expect("Failed to create test branch")
}

/// Create a test staff member; returns the record and its API key
pub fn create_test_staff(
    conn: &Connection,
    tenant_id: &str,
    name: &str,
    role: StaffRole,
    permissions: Option<PermissionSet>,
) -> (Staff, String) {
    let input = CreateStaff {
        name: name.to_string(),
        role,
        permissions,
    };
    let api_key = queries::generate_api_key();
    let staff =
        queries::create_staff(conn, tenant_id, &input, &api_key).expect("Failed to create staff");
    (staff, api_key)
}

/// Create a test member
pub fn create_test_member(conn: &Connection, branch_id: &str, name: &str, phone: &str) -> Member {
    queries::create_member(conn, branch_id, name, phone).expect("Failed to create test member")
}

pub fn test_credential(key_id: &str) -> RazorpayCredential {
    RazorpayCredential {
        key_id: key_id.to_string(),
        key_secret: format!("secret_for_{}", key_id),
    }
}

/// Encrypt and store a tenant-level gateway credential
pub fn set_tenant_credential(
    conn: &Connection,
    master_key: &MasterKey,
    tenant_id: &str,
    credential: &RazorpayCredential,
    verified: bool,
) {
    let json = serde_json::to_string(credential).expect("Failed to serialize credential");
    let encrypted = master_key
        .encrypt(tenant_id, json.as_bytes())
        .expect("Failed to encrypt credential");
    let verified_at = verified.then(now);
    queries::set_tenant_razorpay_config(conn, tenant_id, Some(&encrypted), verified_at)
        .expect("Failed to store tenant credential");
}

/// Encrypt and store a branch-level gateway credential
pub fn set_branch_credential(
    conn: &Connection,
    master_key: &MasterKey,
    branch_id: &str,
    credential: &RazorpayCredential,
    verified: bool,
) {
    let json = serde_json::to_string(credential).expect("Failed to serialize credential");
    let encrypted = master_key
        .encrypt(branch_id, json.as_bytes())
        .expect("Failed to encrypt credential");
    let verified_at = verified.then(now);
    queries::set_branch_razorpay_config(conn, branch_id, Some(&encrypted), verified_at)
        .expect("Failed to store branch credential");
}

/// Compute the signature Razorpay would send for a checkout callback
pub fn sign_checkout(key_secret: &str, order_id: &str, payment_id: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(key_secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// A valid purchase intent for a new member, 3 months
pub fn new_member_intent(branch_id: &str) -> CreateOrderRequest {
    CreateOrderRequest {
        amount: 1700.0,
        member_id: None,
        member_name: "Asha Rao".to_string(),
        member_phone: "9876543210".to_string(),
        is_new_member: true,
        months: Some(3),
        custom_days: None,
        trainer_id: None,
        trainer_fee: None,
        branch_id: branch_id.to_string(),
        is_daily_pass: false,
    }
}

/// Get the current timestamp
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Get a future timestamp (days from now)
pub fn future_timestamp(days: i64) -> i64 {
    now() + (days * 86400)
}

/// Get a past timestamp (days ago)
pub fn past_timestamp(days: i64) -> i64 {
    now() - (days * 86400)
}
