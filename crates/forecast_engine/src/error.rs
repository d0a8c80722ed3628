use thiserror::Error;

/// Reasons a spending forecast could not be produced. Every variant means
/// "not enough data"; the detail is kept for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ForecastError {
    #[error("not enough data to forecast: {records} record(s), need at least 2")]
    TooFewRecords { records: usize },

    #[error("not enough data to forecast: {months} month(s), need at least 2")]
    TooFewMonths { months: usize },

    #[error("not enough data to forecast: comparison window is empty")]
    EmptyWindow,

    #[error("not enough data to forecast: previous window averages to zero")]
    ZeroBaseline,

    #[error("not enough data to forecast: amounts are too large to extrapolate")]
    Overflow,
}
