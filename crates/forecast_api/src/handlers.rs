use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use backend_client::UpstreamError;
use chrono::Utc;
use forecast_engine::{savings_report, spending_report};
use models::{SavingsForecastBody, SpendingForecastResponse};
use settings_loader::ServiceSettings;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    error::{ApiError, SAVINGS_FETCH_FAILED, SPENDING_FETCH_FAILED},
    repository::FinanceRepository,
    Result,
};

pub type RepositoryState = Arc<dyn FinanceRepository>;

/// Per-process options the handlers read on every request.
#[derive(Debug, Clone)]
pub struct ForecastOptions {
    pub debug: bool,
    pub currency_symbol: String,
}

impl From<&ServiceSettings> for ForecastOptions {
    fn from(settings: &ServiceSettings) -> Self {
        Self {
            debug: settings.debug,
            currency_symbol: settings.currency_symbol.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub options: Arc<ForecastOptions>,
}

impl AppState {
    pub fn new(repo: RepositoryState, options: ForecastOptions) -> Self {
        Self {
            repo,
            options: Arc::new(options),
        }
    }
}

/// Authorization header of the incoming request, forwarded verbatim upstream
fn forwarded_auth(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

/// GET /forecast
/// Returns next month's expected spending, or a "not enough data" message
pub async fn get_spending_forecast(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SpendingForecastResponse>> {
    let expenses = state
        .repo
        .fetch_expenses(forwarded_auth(&headers))
        .await
        .map_err(|err| {
            warn!(error = %err, "Fetching expenses failed");
            ApiError::upstream(SPENDING_FETCH_FAILED, err, state.options.debug)
        })?;

    debug!(records = expenses.len(), "Forecasting spending");
    Ok(Json(spending_report(&expenses, &state.options.currency_symbol)))
}

/// GET /forecast/savings
/// Returns a completion projection for every savings goal
pub async fn get_savings_forecast(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SavingsForecastBody>> {
    let auth = forwarded_auth(&headers);
    let upstream_failed = |err: UpstreamError| {
        warn!(error = %err, "Fetching savings data failed");
        ApiError::upstream(SAVINGS_FETCH_FAILED, err, state.options.debug)
    };

    let goals = state
        .repo
        .fetch_goal_progress(auth)
        .await
        .map_err(upstream_failed)?;
    let contributions = state
        .repo
        .fetch_contributions(auth)
        .await
        .map_err(upstream_failed)?;

    debug!(
        goals = goals.len(),
        contributions = contributions.len(),
        "Projecting savings goals"
    );
    let today = Utc::now().date_naive();
    Ok(Json(savings_report(goals, &contributions, today)))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "forecast-service"
    }))
}
