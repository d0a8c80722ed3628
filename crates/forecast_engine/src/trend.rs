use models::{ForecastResult, MonthlySeries, TransactionRecord};

use crate::aggregate::aggregate;
use crate::amount::round2;
use crate::error::ForecastError;
use crate::narrative::spending_narrative;

/// Months averaged on each side of the comparison: three once half a year of
/// history exists, otherwise half the history (at least one).
pub fn window_size(months: usize) -> usize {
    if months >= 6 {
        3
    } else {
        (months / 2).max(1)
    }
}

/// Forecasts next month's spending from raw expense records.
pub fn forecast_spending(
    records: &[TransactionRecord],
    currency_symbol: &str,
) -> Result<ForecastResult, ForecastError> {
    if records.len() < 2 {
        return Err(ForecastError::TooFewRecords {
            records: records.len(),
        });
    }
    forecast(&aggregate(records), currency_symbol)
}

/// Extrapolates the next month from the growth between the two most recent windows.
///
/// `growth = (recent_avg - previous_avg) / previous_avg` and the estimate is
/// `recent_avg * (1 + growth)`, floored at zero and rounded to cents.
pub fn forecast(series: &MonthlySeries, currency_symbol: &str) -> Result<ForecastResult, ForecastError> {
    let values = series.values();
    let n = values.len();
    if n < 2 {
        return Err(ForecastError::TooFewMonths { months: n });
    }

    let window = window_size(n);
    let recent = &values[n - window..];
    let previous = &values[n.saturating_sub(2 * window)..n - window];
    if previous.is_empty() || recent.is_empty() {
        return Err(ForecastError::EmptyWindow);
    }

    let previous_avg = mean(previous);
    let recent_avg = mean(recent);
    if previous_avg == 0.0 {
        return Err(ForecastError::ZeroBaseline);
    }

    let growth_rate = (recent_avg - previous_avg) / previous_avg;
    let base_value = if recent_avg > 0.0 {
        recent_avg
    } else {
        values.last().copied().unwrap_or(0.0)
    };
    let estimate = (base_value * (1.0 + growth_rate)).max(0.0);
    if !growth_rate.is_finite() || !estimate.is_finite() {
        return Err(ForecastError::Overflow);
    }
    let next_period_estimate = round2(estimate);

    Ok(ForecastResult {
        next_period_estimate,
        growth_rate,
        narrative: spending_narrative(next_period_estimate, growth_rate, currency_symbol),
        series: series.points(),
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
