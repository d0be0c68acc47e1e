//! GIS Worker
//!
//! `serve` (default) runs the Azure Functions custom handler; `replay` feeds
//! a directory of message files through one worker function.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

use adms_arcgis_sdk::{ArcGisPortal, PublicFeatureLayer};
use gis_worker::handlers::create_router;
use gis_worker::replay::replay_directory;
use gis_worker::{WorkerConfig, WorkerContext, WorkerFunction};

#[derive(Parser, Debug)]
#[command(name = "gis-worker")]
#[command(about = "ADMS GIS queue workers for ArcGIS Portal", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve queue invocations from the Functions host
    Serve,
    /// Process every *.json message file in a directory
    Replay {
        /// missions, tickets, ticket-updates or mission-edits
        #[arg(short, long)]
        kind: WorkerFunction,
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    adms_telemetry::init("gis-worker")?;

    let args = Args::parse();
    let config = WorkerConfig::from_env().context("Failed to load worker configuration")?;
    info!(env = %config.portal.env_sig, portal = %config.portal.portal_url, "Starting GIS Worker");

    let ctx = build_context(&config)?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(ctx, &config).await,
        Command::Replay { kind, dir } => {
            let summary = replay_directory(&ctx, kind, &dir)
                .await
                .with_context(|| format!("Failed to replay {}", dir.display()))?;
            info!(total = summary.total(), failed = summary.failed, "Replay complete");
            Ok(())
        }
    }
}

fn build_context(config: &WorkerConfig) -> Result<WorkerContext> {
    let portal = ArcGisPortal::new(config.portal.clone()).context("Failed to build HTTP client")?;
    let boundaries = PublicFeatureLayer::new(portal.rest_client(), config.portal.state_layer_url.clone());

    Ok(WorkerContext::new(
        Arc::new(portal),
        Arc::new(boundaries),
        config.portal.env_sig.clone(),
    ))
}

async fn serve(ctx: WorkerContext, config: &WorkerConfig) -> Result<()> {
    let router = create_router(ctx);
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(addr = %addr, "Custom handler listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(wait_for_shutdown())
        .await?;

    info!("GIS Worker stopped");
    Ok(())
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, gracefully stopping...");
}
