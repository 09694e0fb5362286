//! Gympay - multi-tenant payment and membership backend for gyms
//!
//! This library provides the core functionality for the Gympay platform:
//! gateway credential resolution, order creation and payment verification,
//! entitlement writes, and the tenant/platform management APIs.

pub mod authz;
pub mod checkout;
pub mod config;
pub mod credentials;
pub mod crypto;
pub mod db;
pub mod dedup;
pub mod entitlement;
pub mod error;
pub mod extractors;
pub mod gateway;
pub mod handlers;
pub mod id;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod util;
