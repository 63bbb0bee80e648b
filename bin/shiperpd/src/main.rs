//! `shiperpd` — the shiperp server binary.
//!
//! Usage:
//!   shiperpd -c <config-name-or-path> [--listen <addr>]
//!
//! The config name resolves to `/etc/shiperp/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod bootstrap;
mod config;
mod routes;

use std::sync::Arc;

use clap::Parser;
use shiperp_core::Module;
use tracing::info;

use config::ServerConfig;

/// shiperp server.
#[derive(Parser, Debug)]
#[command(name = "shiperpd", about = "shiperp server")]
struct Cli {
    /// Config name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address (overrides default 0.0.0.0:8080).
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Load server configuration.
    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;

    // Verify configuration is valid.
    bootstrap::verify_config(&server_config)?;

    // Initialize storage.
    let data_dir = std::path::PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let core_config = shiperp_core::ServiceConfig {
        data_dir: Some(data_dir.clone()),
        listen: cli.listen.clone(),
        ..Default::default()
    };

    let sql: Arc<dyn shiperp_sql::SQLStore> = Arc::new(
        shiperp_sql::SqliteStore::open(&core_config.resolve_sqlite_path())
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );

    // ── Initialize modules ──

    let rates_module = shiperp_rates::RatesModule::new(shiperp_rates::service::RatesService::new(
        Arc::clone(&sql),
        bootstrap::duty_estimator(&server_config),
        bootstrap::rates_config(&server_config),
    )?);
    info!("Rates module initialized");

    let module_routes = vec![(rates_module.name(), rates_module.routes())];

    // Authentication is terminated upstream; the in-process seam allows all.
    let authenticator: Arc<dyn shiperp_core::Authenticator> = Arc::new(shiperp_core::AllowAll);

    // Build router.
    let app = routes::build_router(authenticator, module_routes);

    // Start server.
    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    info!("shiperp server listening on {}", cli.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
