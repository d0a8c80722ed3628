use anyhow::Context;
use forecast_api::{run_server, AppState, ForecastOptions, HttpFinanceRepository};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A local .env is optional; real environment variables win over it
    dotenvy::dotenv().ok();

    let settings = settings_loader::load_service_settings().context("Loading forecast settings")?;

    println!("Forecast Service");
    println!("================");
    println!("Upstream API: {}", settings.api_base);
    println!("Client origin: {}", settings.client_origin);
    println!("Request timeout: {}s", settings.request_timeout_secs);
    println!("Debug responses: {}", settings.debug);
    println!("Listening on: {}:{}", settings.host, settings.port);
    println!();

    let repo = Arc::new(HttpFinanceRepository::from_settings(&settings)?);
    let state = AppState::new(repo, ForecastOptions::from(&settings));

    run_server(state, &settings).await?;

    Ok(())
}
