//! # Sunspot Service Main Driver
//!
//! ## Purpose
//! Main entry point for the sunspot lookup server. Orchestrates initialization
//! of all system components and starts the web server for handling requests.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration files, command line arguments, environment variables
//! - **Output**: Running web server with lookup and counter endpoints
//! - **Initialization**: Builds providers and cache store, runs health checks
//!
//! ## Key Features
//! - Graceful startup and shutdown
//! - Component health monitoring
//! - Configuration validation
//! - Structured logging
//! - Signal handling for clean shutdown
//!
//! ## Architecture Flow
//! 1. Parse command line arguments and load configuration
//! 2. Initialize logging and tracing
//! 3. Build the cache store and upstream HTTP clients
//! 4. Start web API server
//! 5. Handle shutdown signals gracefully

use clap::{Arg, Command};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use sunspot_service::{
    api::ApiServer,
    config::Config,
    errors::{LookupError, Result},
    AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let matches = Command::new("sunspot-server")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Sunspot Team")
        .about("Location and date aware sunrise/sunset lookup service with caching")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Server port")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("dump-config")
                .long("dump-config")
                .help("Print the default configuration as TOML and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("check-health")
                .long("check-health")
                .help("Run health checks and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    if matches.get_flag("dump-config") {
        println!("{}", Config::default().to_toml()?);
        return Ok(());
    }

    // Load configuration
    let config_path = matches.get_one::<String>("config").ok_or_else(|| {
        LookupError::Config {
            message: "missing config path argument".to_string(),
        }
    })?;
    let mut config = Config::from_file(config_path)?;

    // Override port if specified
    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }

    // Initialize logging
    init_logging(&config)?;

    info!("Starting Sunspot Lookup Service v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", config_path);

    // Run health checks if requested
    if matches.get_flag("check-health") {
        return run_health_checks(config).await;
    }

    // Initialize application components
    let app_state = initialize_components(config).await?;

    // Start the API server
    let server = ApiServer::new(app_state.clone());
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("Server error: {}", e);
        }
    });

    info!(
        "Sunspot Lookup Service started on {}:{}",
        app_state.config.server.host, app_state.config.server.port
    );

    // Wait for shutdown signal
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = server_handle => {
            warn!("Server stopped unexpectedly");
        }
    }

    // Graceful shutdown
    shutdown_components(&app_state).await?;
    info!("Sunspot Lookup Service shut down successfully");

    Ok(())
}

/// Initialize logging and tracing
fn init_logging(config: &Config) -> Result<()> {
    let log_level: tracing::Level = config.logging.level.parse().map_err(|_| {
        LookupError::Config {
            message: format!("Invalid log level: {}", config.logging.level),
        }
    })?;
    let filter = tracing_subscriber::filter::LevelFilter::from_level(log_level);

    let fmt_layer = if config.logging.json_format {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .json()
            .with_filter(filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_filter(filter)
            .boxed()
    };

    tracing_subscriber::registry().with(fmt_layer).init();

    info!("Logging initialized with level: {}", config.logging.level);
    Ok(())
}

/// Initialize all application components
async fn initialize_components(config: Config) -> Result<AppState> {
    info!("Initializing application components...");

    let app_state = AppState::from_config(config)?;

    // A degraded cache is survivable, so a failed probe only warns.
    match app_state.store.health_check().await {
        Ok(_) => info!("✓ Cache store is healthy"),
        Err(e) => warn!("Cache store is degraded, lookups will skip it: {}", e),
    }

    info!("All components initialized successfully");
    Ok(app_state)
}

/// Run health checks against a fully built component stack
async fn run_health_checks(config: Config) -> Result<()> {
    info!("Running health checks...");

    info!("✓ Configuration is valid");

    let app_state = AppState::from_config(config)?;
    info!("✓ Components constructed");

    app_state.store.health_check().await?;
    info!("✓ Cache store is healthy");

    info!("All health checks passed!");
    Ok(())
}

/// Gracefully shutdown all components
async fn shutdown_components(app_state: &AppState) -> Result<()> {
    info!("Shutting down components...");

    app_state.store.flush().await?;

    info!("All components shut down successfully");
    Ok(())
}
