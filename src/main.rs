use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use symptom_relay::config::Config;
use symptom_relay::llm::create_provider;
use symptom_relay::routes::configure_routes;
use symptom_relay::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_logging();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            process::exit(1);
        }
    };

    let provider = match create_provider(&config.upstream) {
        Ok(provider) => provider,
        Err(e) => {
            error!(error = %e, "failed to create upstream client");
            process::exit(1);
        }
    };

    let state = AppState::new(provider, config.upstream.generation.clone(), config.relay.clone());
    let routes = configure_routes(state, &config.server.allowed_origins);

    // Bind here so a taken port is a logged error rather than a panic inside warp
    let addr = config.server.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind listen address");
            process::exit(1);
        }
    };

    info!(
        %addr,
        model = %config.upstream.model,
        origins = ?config.server.allowed_origins,
        "Starting server"
    );

    tokio::select! {
        _ = warp::serve(routes).incoming(listener).run() => {}
        signal = shutdown_signal() => info!(signal, "shutdown signal received"),
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("symptom_relay=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Panics inside session tasks are logged; the task dies, the process does not
    std::panic::set_hook(Box::new(|panic| {
        error!(%panic, "task panicked");
    }));
}
