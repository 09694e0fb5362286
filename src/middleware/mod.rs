mod platform_auth;
mod tenant_auth;

pub use platform_auth::*;
pub use tenant_auth::*;
