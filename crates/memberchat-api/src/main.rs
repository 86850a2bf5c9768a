//! memberchat CLI and REST API entry point.
//!
//! Binary name: `mchat`
//!
//! Parses CLI arguments, initializes database and services, then dispatches
//! to the appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use anyhow::{Context, bail};
use clap::Parser;
use clap_complete::generate;
use memberchat_infra::config::{Secrets, load_effective_config, resolve_data_dir};
use memberchat_infra::crypto::token::MIN_SECRET_BYTES;
use memberchat_observe::tracing_setup::{Verbosity, init_tracing, shutdown_tracing};
use secrecy::ExposeSecret;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(Verbosity::from_flags(cli.verbose, cli.quiet), cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        // Shell completions don't need app state
        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            generate(shell, &mut cmd, "mchat", &mut std::io::stdout());
        }

        Commands::User { action } => {
            let state = AppState::init().await?;
            cli::user::run(&state, action, cli.json).await?;
        }

        Commands::Serve { port, host } => serve(port, host, cli.quiet).await?,
    }

    Ok(())
}

async fn serve(port: Option<u16>, host: Option<String>, quiet: bool) -> anyhow::Result<()> {
    let data_dir = resolve_data_dir();
    tokio::fs::create_dir_all(&data_dir)
        .await
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let mut config = load_effective_config(&data_dir).await;
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(host) = host {
        config.server.host = host;
    }

    let secrets = Secrets::from_env();
    match &secrets.jwt_secret {
        Some(secret) if secret.expose_secret().len() >= MIN_SECRET_BYTES => {}
        Some(_) => bail!("JWT_SECRET must be at least {MIN_SECRET_BYTES} bytes"),
        None => bail!("JWT_SECRET is not set; refusing to start without a signing secret"),
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::build(data_dir, config, secrets).await?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "memberchat API listening");

    if !quiet {
        println!(
            "  {} memberchat API listening on {}",
            console::style("⚡").bold(),
            console::style(format!("http://{addr}")).cyan()
        );
        println!("  {}", console::style("Press Ctrl+C to stop").dim());
    }

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if !quiet {
        println!("\n  Server stopped.");
    }
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
