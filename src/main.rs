use anyhow::{Context, Result};
use canvass::http::{create_router, AppState, RuntimeDeps};
use canvass::provider::{BackendStore, ProviderClient};
use canvass::transport::{AssumeGranted, WsTransportFactory};
use canvass::Config;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "canvass", about = "Live AI-voice interview session runtime")]
struct Cli {
    /// Config file (without extension)
    #[arg(short, long, default_value = "config/canvass")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let deps = RuntimeDeps {
        transport_factory: Arc::new(WsTransportFactory::new(cfg.provider.ws_endpoint.clone())),
        registrar: Arc::new(ProviderClient::new(
            cfg.provider.api_base_url.clone(),
            cfg.provider.api_key.clone(),
        )),
        store: Arc::new(BackendStore::new(cfg.backend.base_url.clone())),
        permissions: Arc::new(AssumeGranted),
    };

    let router = create_router(AppState::new(deps));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, router)
        .await
        .context("HTTP server failed")?;

    Ok(())
}
