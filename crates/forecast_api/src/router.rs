use axum::{http::HeaderValue, routing::get, Router};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{self, AppState};

/// Create the main application router with all API endpoints
pub fn create_router(state: AppState, client_origin: HeaderValue) -> Router {
    // Only the web client may call us, with its cookies/credentials
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::exact(client_origin))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request());

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Forecast endpoints
        .route("/forecast", get(handlers::get_spending_forecast))
        .route("/forecast/savings", get(handlers::get_savings_forecast))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
