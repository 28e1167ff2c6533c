use api::{middleware::log_request, routes::routes, state::AppState, tasks::spawn_token_sweeper};
use axum::{
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    middleware::from_fn,
};
use std::{net::SocketAddr, time::Duration};
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_appender::rolling;
use util::config::{self, AppConfig};

#[tokio::main]
async fn main() {
    // Load configuration and initialize logging
    let _log_guard = init_logging(&config::log_file(), &config::log_level());
    AppConfig::log_load_warnings();

    // Set up shared state
    let app_state = match AppState::from_config() {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Failed to initialise attendance ledger");
            std::process::exit(1);
        }
    };

    // Periodic sweep of tokens nobody redeemed
    let sweep = Duration::from_secs(config::token_sweep_seconds());
    if spawn_token_sweeper(app_state.clone(), sweep).is_some() {
        info!(period_secs = sweep.as_secs(), "Token sweeper started");
    }

    // Configure middleware
    let cors = CorsLayer::very_permissive().expose_headers([CONTENT_DISPOSITION, CONTENT_TYPE]);

    // Build app router
    let app = routes(app_state).layer(from_fn(log_request)).layer(cors);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config::host(), config::port())
        .parse()
        .expect("Invalid address");

    info!(
        "Starting {} [{}] on http://{}:{} (single process; tokens and attendance live in memory)",
        config::project_name(),
        config::env(),
        config::host(),
        config::port()
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server crashed");

    info!("Server shut down");
}

fn init_logging(log_file: &str, log_level: &str) -> tracing_appender::non_blocking::WorkerGuard {
    use std::fs;
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    fs::create_dir_all("logs").ok();

    let file_appender = rolling::daily("logs", log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    let stdout_layer = config::log_to_stdout().then(|| {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(true)
            .with_target(true)
            .with_thread_ids(true)
    });

    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("api=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    guard
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
