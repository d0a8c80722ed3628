use anyhow::Context;
use axum::http::HeaderValue;
use settings_loader::ServiceSettings;

use crate::{handlers::AppState, router::create_router};

/// Run the API server
pub async fn run_server(state: AppState, settings: &ServiceSettings) -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "forecast_api=debug,forecast_engine=debug,backend_client=debug,tower_http=debug".into()
            }),
        )
        .init();

    let client_origin = HeaderValue::from_str(&settings.client_origin)
        .with_context(|| format!("Invalid CLIENT_ORIGIN: {}", settings.client_origin))?;
    let app = create_router(state, client_origin);

    let listener = tokio::net::TcpListener::bind((settings.host.as_str(), settings.port))
        .await
        .with_context(|| format!("Binding {}:{}", settings.host, settings.port))?;
    tracing::info!(
        upstream = %settings.api_base,
        debug = settings.debug,
        "Starting forecast service on http://{}",
        listener.local_addr()?
    );

    axum::serve(listener, app).await?;

    Ok(())
}
