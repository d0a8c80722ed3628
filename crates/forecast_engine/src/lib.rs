//! Forecasting core: monthly aggregation, trend extrapolation and savings goal projection.
//!
//! Every function here is a pure computation over already fetched records. Anomalies in
//! the input (bad amounts, short dates, flat baselines) degrade to explicit results and
//! never panic or propagate past this crate.

pub mod aggregate;
pub mod amount;
pub mod calendar;
pub mod error;
pub mod goals;
pub mod narrative;
pub mod report;
pub mod trend;

pub use aggregate::{aggregate, aggregate_by_goal, MonthlyEntry};
pub use amount::{parse_amount, round2};
pub use error::ForecastError;
pub use goals::{project_goal, project_goals};
pub use report::{savings_report, spending_report};
pub use trend::{forecast, forecast_spending};
