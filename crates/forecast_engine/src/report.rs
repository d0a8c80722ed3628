use chrono::NaiveDate;
use models::{
    Contribution, Goal, GoalForecastEntry, SavingsForecastBody, SpendingForecastResponse,
    TransactionRecord,
};
use tracing::debug;

use crate::goals::project_goals;
use crate::trend::forecast_spending;

/// Response body for the spending forecast. Insufficient data becomes the
/// "Not enough data to forecast." message rather than an error.
pub fn spending_report(records: &[TransactionRecord], currency_symbol: &str) -> SpendingForecastResponse {
    match forecast_spending(records, currency_symbol) {
        Ok(result) => SpendingForecastResponse::Forecast(result.into()),
        Err(reason) => {
            debug!(%reason, records = records.len(), "spending forecast skipped");
            SpendingForecastResponse::not_enough_data()
        }
    }
}

/// Response body for the savings forecast: each goal echoed next to its projection.
pub fn savings_report(goals: Vec<Goal>, contributions: &[Contribution], today: NaiveDate) -> SavingsForecastBody {
    let forecasts = project_goals(&goals, contributions, today);
    SavingsForecastBody {
        goals: goals
            .into_iter()
            .zip(forecasts)
            .map(|(goal, forecast)| GoalForecastEntry {
                goal,
                forecast: forecast.into(),
            })
            .collect(),
    }
}
