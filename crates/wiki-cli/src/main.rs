//! wiki - HTTP front end + database service on one in-process bus.
//!
//! 起動順: DB サービス -> HTTP。停止順はその逆。

mod settings;
mod web;

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use wiki_core::{BusClient, DatabaseService, EventBus};

use crate::settings::{Cli, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::resolve(Cli::parse())?;
    info!(
        db = %settings.database.url,
        queue = %settings.database.queue,
        port = settings.http.port,
        "starting wiki"
    );

    let bus = EventBus::with_config(settings.bus.clone());
    let service = DatabaseService::start(&settings.database, &bus)
        .await
        .context("database service failed to start")?;

    let client = BusClient::new(bus, settings.database.queue.clone());
    let app = web::router(client);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.http.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            service.shutdown().await;
            return Err(e).with_context(|| format!("could not bind HTTP server to {addr}"));
        }
    };
    info!(%addr, "HTTP server running");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    info!("HTTP server stopped");
    service.shutdown().await;
    served.context("HTTP server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C");
        // シグナルが取れないなら止める手段がないので待ち続ける
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
