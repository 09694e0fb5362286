pub mod platform;
pub mod public;
pub mod tenants;
