mod schema;

pub mod from_row;
pub mod queries;

pub use schema::init_db;

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::crypto::MasterKey;
use crate::dedup::DedupCache;
use crate::gateway::RazorpayCredential;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state holding the database pool and process-wide services.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Master key for credential envelope encryption. Server-held only.
    pub master_key: MasterKey,
    /// Platform-wide gateway credential; last resort of the resolver chain.
    pub platform_credential: Option<RazorpayCredential>,
    /// In-flight request deduplication, keyed by gateway payment id.
    /// Constructed once at startup and passed by reference; not a singleton.
    pub dedup: Arc<DedupCache>,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
