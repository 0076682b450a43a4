use milan_core::server::{build_router, AppState, Config};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        port = config.port,
        reference_body = %config.reference_body,
        text_service = config.api_key.is_some(),
        "starting vedic compatibility api"
    );

    let state = AppState::from_config(&config);
    let app = build_router(state);

    let listener = match TcpListener::bind(("0.0.0.0", config.port)).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(port = config.port, error = %e, "failed to bind listener");
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server terminated");
        std::process::exit(1);
    }
}
