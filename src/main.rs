use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::time::Duration;

use rebook::config::Config;
use rebook::db::{create_pool, init_db, queries, AppState};
use rebook::dispatch;
use rebook::handlers;
use rebook::models::{CreateCustomer, CreateSubscription, CreateWaitlistEntry, Plan, UserRole};
use rebook::payments::StripeClient;

#[derive(Parser, Debug)]
#[command(name = "rebook")]
#[command(about = "SMS booking-recovery backend for appointment businesses")]
struct Cli {
    /// Seed the database with dev data (tenant, customer, pending waitlist entry)
    #[arg(long)]
    seed: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

/// Seed a demo tenant so the SMS webhook and ROI dashboard have something to
/// act on. Dev mode only.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seed");

    let tenant = queries::create_tenant(&conn, "Demo Salon").expect("Failed to create demo tenant");
    queries::create_user(&conn, &tenant.id, "owner@demo.salon", UserRole::Owner)
        .expect("Failed to create demo owner");

    queries::upsert_subscription(
        &conn,
        &CreateSubscription {
            tenant_id: tenant.id.clone(),
            provider_subscription_id: "sub_dev_demo".to_string(),
            plan: Plan::Growth,
            price_cents: Plan::Growth.monthly_price_cents(),
            provider_price_id: None,
            status: "active".to_string(),
            current_period_end: None,
        },
    )
    .expect("Failed to create demo subscription");

    let customer = queries::create_customer(
        &conn,
        &CreateCustomer {
            tenant_id: tenant.id.clone(),
            phone: "+15555550123".to_string(),
            name: Some("Demo Customer".to_string()),
        },
    )
    .expect("Failed to create demo customer");

    let entry = queries::create_waitlist_entry(
        &conn,
        &CreateWaitlistEntry {
            tenant_id: tenant.id.clone(),
            customer_id: customer.id.clone(),
        },
    )
    .expect("Failed to create demo waitlist entry");

    tracing::info!("Seeded dev data:");
    tracing::info!("  tenant_id:         {}", tenant.id);
    tracing::info!("  customer phone:    {}", customer.phone);
    tracing::info!("  waitlist entry:    {} (pending)", entry.id);
    tracing::info!(
        "  try: curl -X POST localhost:8787/webhook/sms -H 'content-type: application/json' -d '{{\"from\":\"{}\",\"body\":\"YES\"}}'",
        customer.phone
    );
}

/// Purge expired and used login tokens every few minutes.
fn spawn_cleanup_task(state: AppState) {
    tokio::spawn(async move {
        let interval = Duration::from_secs(5 * 60);

        loop {
            tokio::time::sleep(interval).await;

            match state.db.get() {
                Ok(conn) => match queries::purge_stale_login_tokens(&conn) {
                    Ok(count) => {
                        if count > 0 {
                            tracing::debug!("Purged {} stale login tokens", count);
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to purge login tokens: {}", e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to get db connection for cleanup: {}", e);
                }
            }
        }
    });

    tracing::info!("Background cleanup task started (runs every 5 minutes)");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rebook=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    // Create the database pool and initialize the schema
    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let stripe = config.stripe_secret_key.as_deref().map(StripeClient::new);
    if stripe.is_none() {
        tracing::warn!("STRIPE_SECRET_KEY not set - provisioning endpoint disabled");
    }

    let state = AppState {
        db: db_pool,
        base_url: config.base_url.clone(),
        app_url: config.app_url.clone(),
        stripe,
    };

    // Seed dev data if --seed flag is passed (only in dev mode)
    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set REBOOK_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    // Background tasks: token purge and the outbound message queue
    spawn_cleanup_task(state.clone());
    dispatch::spawn_message_dispatcher(state.clone());

    // Build the application router
    let app = Router::new()
        // Public endpoints (health, provisioning)
        .merge(handlers::public::router())
        // Inbound SMS webhook
        .merge(handlers::webhooks::router())
        // Tenant API (customers, waitlist, appointments, ROI)
        .merge(handlers::api::router())
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

    tracing::info!("Rebook server listening on {}", addr);

    axum::serve(listener, app)
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
        // Also remove WAL and SHM files if they exist
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
