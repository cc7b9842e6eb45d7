//! # Taskgate Web Server
//!
//! Serves the registration, login and dashboard pages over PostgreSQL-backed
//! stores.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/taskgate ASSETS_DIR=taskgate-web/assets \
//!     cargo run -p taskgate-web
//! ```
//!
//! Set `LOG_FORMAT=json` for JSON logs and `RUST_LOG` to override the filter.

use taskgate_shared::{
    auth::session::run_reaper,
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
        Stores,
    },
};
use taskgate_web::{
    app::{build_router, AppState},
    config::Config,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "taskgate_web=debug,taskgate_shared=info,tower_http=info";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the log filter is read
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!("Taskgate web server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    let pool = match create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_migrations(&pool).await {
        tracing::error!(error = %e, "Failed to run migrations");
        std::process::exit(1);
    }

    let bind_address = config.bind_address();
    let purge_interval = std::time::Duration::from_secs(config.session.purge_interval_seconds);
    let state = AppState::new(Stores::postgres(pool.clone()), config)?;

    let shutdown = CancellationToken::new();
    let reaper = tokio::spawn(run_reaper(
        state.sessions.clone(),
        purge_interval,
        shutdown.clone(),
    ));

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown signal received, stopping background tasks...");
    shutdown.cancel();
    if let Err(e) = reaper.await {
        tracing::warn!(error = %e, "Session reaper ended abnormally");
    }
    close_pool(pool).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
