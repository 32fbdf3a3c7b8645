pub mod api;
pub mod config;
pub mod db;
pub mod entities;
pub mod services;
pub mod state;

use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
use clap::{Parser, Subcommand};
pub use config::Config;
use db::Store;
use state::SharedState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Registrar - School Administration Backend
#[derive(Parser)]
#[command(name = "registrar")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server
    #[command(alias = "-s", alias = "--serve")]
    Serve,

    /// Create default config file
    Init,

    /// Provision an administrative account from the shell
    CreateAdmin {
        username: String,
        email: String,
        password: String,

        /// Grant unrestricted visibility over admin profiles
        #[arg(long)]
        superuser: bool,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let (layer, task) = tracing_loki::builder()
            .label("app", "registrar")?
            .extra_field("env", "production")?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    if prometheus_handle.is_some() {
        info!("Prometheus metrics recorder initialized");
    }

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config, prometheus_handle).await,

        Commands::Init => {
            Config::create_default_if_missing()?;
            println!("✓ Config file created. Edit config.toml and run again.");
            Ok(())
        }

        Commands::CreateAdmin {
            username,
            email,
            password,
            superuser,
        } => cmd_create_admin(&config, &username, &email, &password, superuser).await,
    }
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!(
        "Registrar v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let shared = Arc::new(SharedState::new(config.clone()).await?);
    let api_state = api::create_app_state(shared, prometheus_handle).await?;

    let port = config.server.port;
    let app = api::router(api_state).await;
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let server_handle = tokio::spawn(async move {
        info!("🌐 API server running at http://0.0.0.0:{}", port);
        if let Err(e) = axum::serve(listener, app).await {
            error!("Web server error: {}", e);
        }
    });

    info!("Server running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    server_handle.abort();
    info!("Server stopped");

    Ok(())
}

async fn cmd_create_admin(
    config: &Config,
    username: &str,
    email: &str,
    password: &str,
    superuser: bool,
) -> anyhow::Result<()> {
    use db::NewAdminUser;
    use db::repositories::principal::hash_password_blocking;
    use services::admin_user_service::MIN_PASSWORD_LEN;

    if password.len() < MIN_PASSWORD_LEN {
        anyhow::bail!("Password must be at least {MIN_PASSWORD_LEN} characters");
    }

    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let password_hash =
        hash_password_blocking(password, Some(config.security.clone())).await?;

    let id = store
        .create_admin_user(
            NewAdminUser {
                username: username.to_string(),
                email: email.to_string(),
                first_name: String::new(),
                last_name: String::new(),
                role: if superuser { "super_admin" } else { "admin" }.to_string(),
                status: "active".to_string(),
                notes: String::new(),
                password_hash,
                is_staff: true,
                is_superuser: superuser,
            },
            None,
        )
        .await?;

    println!("✓ Created admin user '{}' (profile #{})", username, id);
    if superuser {
        println!("  Superuser: yes");
    }
    println!("  Log in via POST /api/auth/login to obtain the API key.");

    Ok(())
}
