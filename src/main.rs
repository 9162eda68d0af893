use anyhow::Context;
use clap::Parser; // for cli
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use weather_gateway::app;
use weather_gateway::config::Args;
use weather_gateway::rate_limit::AdmissionGateway;
use weather_gateway::relay::{Relay, ReqwestTransport};
use weather_gateway::state::AppState;
use weather_gateway::sweeper::Sweeper;
use weather_gateway::weather::WeatherApi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();

    if args.api_key().is_none() {
        warn!("OPENWEATHER_API_KEY is missing, downstream calls will be rejected");
    }

    let transport = ReqwestTransport::new(args.http_config())
        .context("failed to build HTTP client")?;

    let gateway = Arc::new(AdmissionGateway::new(args.rate_limit, args.rate_window()));
    let sweeper = Sweeper::start(Arc::clone(&gateway), args.rate_window());

    let state = Arc::new(AppState {
        gateway,
        relay: Relay::new(Arc::new(transport)),
        weather: WeatherApi::new(&args.api_url, args.api_key().map(str::to_string)),
        environment: args.environment.clone(),
        trust_proxy: args.trust_proxy,
    });

    let app = app::router(state, args.static_dir.as_deref());

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Gateway running on http://localhost:{}", args.port);
    info!(environment = %args.environment, "Environment");
    info!(api_url = %args.api_url, key_loaded = args.api_key().is_some(), "Forwarding to weather API");
    info!(
        "Rate limit: {} requests per {} seconds",
        args.rate_limit, args.rate_window
    );
    if let Some(dir) = &args.static_dir {
        info!(dir = %dir.display(), "Serving static files");
    }

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    sweeper.stop().await;
    info!("Gateway stopped");
    Ok(())
}

// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
