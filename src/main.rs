use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gympay::config::Config;
use gympay::crypto::MasterKey;
use gympay::db::{create_pool, init_db, queries, AppState};
use gympay::dedup::DedupCache;
use gympay::handlers;
use gympay::models::{CreateBranch, CreatePackage, CreateStaff, CreateTenant, CreateTrainer, StaffRole};

#[derive(Parser, Debug)]
#[command(name = "gympay")]
#[command(about = "Multi-tenant payment and membership backend for gyms")]
struct Cli {
    /// Seed the database with dev data (tenant, owner, branch, catalog)
    #[arg(long)]
    seed: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

fn bootstrap_platform_admin(state: &AppState, name: &str) {
    let conn = state.db.get().expect("Failed to get db connection for bootstrap");

    let count = queries::count_platform_admins(&conn).expect("Failed to count platform admins");
    if count > 0 {
        tracing::info!("Platform admins already exist, skipping bootstrap");
        return;
    }

    let api_key = queries::generate_api_key();
    let admin = queries::create_platform_admin(&conn, name, &api_key)
        .expect("Failed to create bootstrap platform admin");

    tracing::info!("============================================");
    tracing::info!("BOOTSTRAP PLATFORM ADMIN CREATED");
    tracing::info!("Name: {}", admin.name);
    tracing::info!("API Key: {}", api_key);
    tracing::info!("============================================");
    tracing::info!("SAVE THIS API KEY - IT WILL NOT BE SHOWN AGAIN");
    tracing::info!("============================================");
}

/// Seeds the database with dev data for testing.
/// Creates: platform admin, tenant, owner, branch, package, and trainer.
/// Only runs in dev mode and when the database is empty.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let count = queries::count_platform_admins(&conn).expect("Failed to count platform admins");
    if count > 0 {
        tracing::info!("Database already has data, skipping seed");
        return;
    }

    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    let admin_api_key = queries::generate_api_key();
    let admin = queries::create_platform_admin(&conn, "Dev Admin", &admin_api_key)
        .expect("Failed to create dev platform admin");
    tracing::info!("Platform Admin: {}", admin.name);
    tracing::info!("Platform Admin API Key: {}", admin_api_key);

    let tenant = queries::create_tenant(
        &conn,
        &CreateTenant {
            name: "Dev Gym".to_string(),
            plan_expires_at: None,
            enabled_modules: None,
            max_branches: 3,
            max_staff: 10,
            max_members: 500,
            max_messages: 1000,
        },
    )
    .expect("Failed to create dev tenant");
    tracing::info!("Tenant: {} (id: {})", tenant.name, tenant.id);

    let owner_api_key = queries::generate_api_key();
    let owner = queries::create_staff(
        &conn,
        &tenant.id,
        &CreateStaff {
            name: "Dev Owner".to_string(),
            role: StaffRole::Owner,
            permissions: None,
        },
        &owner_api_key,
    )
    .expect("Failed to create dev owner");
    tracing::info!("Owner: {} (id: {})", owner.name, owner.id);
    tracing::info!("Owner API Key: {}", owner_api_key);

    let branch = queries::create_branch(
        &conn,
        &tenant.id,
        &CreateBranch {
            name: "Main Branch".to_string(),
        },
    )
    .expect("Failed to create dev branch");
    tracing::info!("Branch: {} (id: {})", branch.name, branch.id);

    let package = queries::create_package(
        &conn,
        &branch.id,
        &CreatePackage {
            name: "Quarterly".to_string(),
            months: 3,
            price: 1500.0,
        },
    )
    .expect("Failed to create dev package");
    tracing::info!("Package: {} (id: {})", package.name, package.id);

    let trainer = queries::create_trainer(
        &conn,
        &branch.id,
        &CreateTrainer {
            name: "Dev Trainer".to_string(),
            phone: "9876543210".to_string(),
            specialization: Some("Strength".to_string()),
            monthly_fee: 2000.0,
        },
    )
    .expect("Failed to create dev trainer");
    tracing::info!("Trainer: {} (id: {})", trainer.name, trainer.id);

    tracing::info!("============================================");
    tracing::info!("DEV DATA SEEDED SUCCESSFULLY");
    tracing::info!("============================================");

    // Copy-paste friendly output for API clients
    println!();
    println!("--- COPY FROM HERE ---");
    println!("  platform_api_key: {}", admin_api_key);
    println!("  owner_api_key: {}", owner_api_key);
    println!("  tenant_id: {}", tenant.id);
    println!("  branch_id: {}", branch.id);
    println!("--- END COPY ---");
    println!();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gympay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let master_key = match &config.master_key {
        Some(encoded) => MasterKey::from_base64(encoded).expect("Invalid MASTER_KEY"),
        None if config.dev_mode => {
            tracing::warn!(
                "MASTER_KEY not set, using an ephemeral key; stored credentials will not \
                 survive a restart"
            );
            let generated = MasterKey::generate();
            MasterKey::from_base64(&generated).expect("Generated key is valid")
        }
        None => {
            eprintln!("MASTER_KEY is required outside dev mode (set GYMPAY_ENV=dev to bypass)");
            std::process::exit(1);
        }
    };

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");

    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let state = AppState {
        db: db_pool,
        master_key,
        platform_credential: config.platform_credential.clone(),
        dedup: Arc::new(DedupCache::new(Duration::from_secs(30), 1024)),
    };

    // Seed dev data if --seed flag is passed (only in dev mode)
    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set GYMPAY_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    // Bootstrap first platform admin if configured (fallback for non-seed usage)
    if let Some(ref name) = config.bootstrap_admin_name {
        bootstrap_platform_admin(&state, name);
    }

    let app = Router::new()
        // Public endpoints (no auth, rate limited per tier)
        .merge(handlers::public::router(config.rate_limit.clone()))
        // Platform console (platform admin key auth)
        .merge(handlers::platform::router(state.clone()))
        // Tenant API (staff key auth)
        .merge(handlers::tenants::router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();
    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("Gympay server listening on {}", addr);

    // Use into_make_service_with_connect_info to enable IP-based rate limiting
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");

    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral database...");
        if let Err(e) = std::fs::remove_file(&db_path) {
            tracing::warn!("Failed to remove {}: {}", db_path, e);
        } else {
            tracing::info!("Removed {}", db_path);
        }
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
