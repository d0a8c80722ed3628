use chrono::{Datelike, NaiveDate};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const NOT_ENOUGH_DATA_MESSAGE: &str = "Not enough data to forecast.";

// Calendar month keys
/// A calendar month, rendered as `YYYY-MM`.
///
/// Ordering is chronological, which for four digit years is the same as the
/// lexicographic order of the rendered key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
	year: i32,
	month: u32,
}

impl MonthKey {
	pub fn new(year: i32, month: u32) -> Option<Self> {
		if (0..=9999).contains(&year) && (1..=12).contains(&month) {
			Some(Self { year, month })
		} else {
			None
		}
	}

	/// Month containing `date`.
	pub fn containing(date: NaiveDate) -> Self {
		Self {
			year: date.year(),
			month: date.month(),
		}
	}

	/// Reads the month out of the first seven characters of an ISO-like date
	/// (`2024-03-15`, `2024-03-15T10:00:00Z`, `2024-03`).
	pub fn from_date_prefix(date: &str) -> Option<Self> {
		date.get(..7)?.parse().ok()
	}

	pub fn year(&self) -> i32 {
		self.year
	}

	pub fn month(&self) -> u32 {
		self.month
	}

	pub fn first_day(&self) -> Option<NaiveDate> {
		NaiveDate::from_ymd_opt(self.year, self.month, 1)
	}
}

impl fmt::Display for MonthKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:04}-{:02}", self.year, self.month)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMonthKeyError(String);

impl fmt::Display for ParseMonthKeyError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "invalid month key '{}', expected YYYY-MM", self.0)
	}
}

impl std::error::Error for ParseMonthKeyError {}

impl FromStr for MonthKey {
	type Err = ParseMonthKeyError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let err = || ParseMonthKeyError(s.to_string());
		let bytes = s.as_bytes();
		if bytes.len() != 7 || bytes[4] != b'-' {
			return Err(err());
		}
		let (year, month) = (&s[..4], &s[5..]);
		if !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
			return Err(err());
		}
		let year: i32 = year.parse().map_err(|_| err())?;
		let month: u32 = month.parse().map_err(|_| err())?;
		MonthKey::new(year, month).ok_or_else(err)
	}
}

impl Serialize for MonthKey {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for MonthKey {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;
		raw.parse().map_err(de::Error::custom)
	}
}

// Monthly series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyPoint {
	pub month: MonthKey,
	pub value: f64,
}

/// Totals per calendar month, kept in chronological order with one entry per month.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlySeries(BTreeMap<MonthKey, f64>);

impl MonthlySeries {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `amount` to the bucket for `month`, creating it if needed.
	pub fn add(&mut self, month: MonthKey, amount: f64) {
		let total = self.0.entry(month).or_insert(0.0);
		// Saturate instead of overflowing to infinity, which JSON cannot carry.
		*total = (*total + amount).clamp(f64::MIN, f64::MAX);
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn get(&self, month: &MonthKey) -> Option<f64> {
		self.0.get(month).copied()
	}

	pub fn months(&self) -> impl Iterator<Item = MonthKey> + '_ {
		self.0.keys().copied()
	}

	pub fn values(&self) -> Vec<f64> {
		self.0.values().copied().collect()
	}

	pub fn last_month(&self) -> Option<MonthKey> {
		self.0.keys().next_back().copied()
	}

	pub fn points(&self) -> Vec<MonthlyPoint> {
		self.0
			.iter()
			.map(|(month, value)| MonthlyPoint {
				month: *month,
				value: *value,
			})
			.collect()
	}
}

impl FromIterator<(MonthKey, f64)> for MonthlySeries {
	fn from_iter<I: IntoIterator<Item = (MonthKey, f64)>>(iter: I) -> Self {
		let mut series = MonthlySeries::new();
		for (month, amount) in iter {
			series.add(month, amount);
		}
		series
	}
}

// Raw upstream records
/// An expense row as served by the upstream API. `amount` is kept raw so a
/// malformed value can be coerced explicitly by the forecasting code.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionRecord {
	#[serde(default)]
	pub amount: Value,
	#[serde(default, deserialize_with = "lenient_text")]
	pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Contribution {
	#[serde(default, deserialize_with = "lenient_id")]
	pub goal_id: Option<String>,
	#[serde(default)]
	pub amount: Value,
	#[serde(default, deserialize_with = "lenient_text")]
	pub date: Option<String>,
}

/// A savings goal with its progress so far. Fields the forecast does not read
/// are kept in `extra` so the goal can be echoed back unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Goal {
	#[serde(default)]
	pub id: Value,
	#[serde(default)]
	pub target_amount: Value,
	#[serde(default)]
	pub current_savings: Value,
	#[serde(default)]
	pub target_date: Value,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Goal {
	pub fn goal_id(&self) -> Option<String> {
		id_from_value(&self.id)
	}

	pub fn target_date_text(&self) -> Option<&str> {
		self.target_date.as_str().filter(|s| !s.is_empty())
	}
}

/// Normalizes a numeric or string identifier. Null, empty and structured values have no id.
pub fn id_from_value(value: &Value) -> Option<String> {
	match value {
		Value::String(s) if !s.is_empty() => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		_ => None,
	}
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	let value = Value::deserialize(deserializer)?;
	Ok(match value {
		Value::String(s) => Some(s),
		Value::Number(n) => Some(n.to_string()),
		_ => None,
	})
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	let value = Value::deserialize(deserializer)?;
	Ok(id_from_value(&value))
}

// Forecast results
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
	pub next_period_estimate: f64,
	pub growth_rate: f64,
	pub narrative: String,
	pub series: Vec<MonthlyPoint>,
}

/// Projected time to reach a goal. A goal nobody contributes to never
/// completes, which is not the same as completing in zero months.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MonthsNeeded {
	Finite(f64),
	Unbounded,
}

impl MonthsNeeded {
	pub fn as_finite(&self) -> Option<f64> {
		match self {
			MonthsNeeded::Finite(months) => Some(*months),
			MonthsNeeded::Unbounded => None,
		}
	}

	pub fn is_unbounded(&self) -> bool {
		matches!(self, MonthsNeeded::Unbounded)
	}
}

impl Serialize for MonthsNeeded {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			MonthsNeeded::Finite(months) => serializer.serialize_f64(*months),
			MonthsNeeded::Unbounded => serializer.serialize_str("infinite"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
	OnTrack,
	SlightlyBehind,
	Behind,
	Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoalForecast {
	/// The goal's `id` exactly as upstream sent it (number or string).
	pub goal_id: Value,
	pub avg_monthly_rate: f64,
	/// `None` when there was nothing to project from.
	pub months_needed: Option<MonthsNeeded>,
	pub estimated_completion_date: Option<NaiveDate>,
	pub status: GoalStatus,
	pub required_per_month: f64,
	pub completion_probability: f64,
	pub series: Vec<MonthlyPoint>,
	pub not_enough_data: bool,
}

// Response bodies
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthlyExpense {
	pub month: MonthKey,
	pub expense: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SpendingForecastBody {
	pub forecast_next_month: f64,
	pub growth_rate: f64,
	pub message: String,
	pub monthly: Vec<MonthlyExpense>,
}

impl From<ForecastResult> for SpendingForecastBody {
	fn from(result: ForecastResult) -> Self {
		Self {
			forecast_next_month: result.next_period_estimate,
			growth_rate: result.growth_rate,
			message: result.narrative,
			monthly: result
				.series
				.into_iter()
				.map(|p| MonthlyExpense {
					month: p.month,
					expense: p.value,
				})
				.collect(),
		}
	}
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MessageBody {
	pub message: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum SpendingForecastResponse {
	Forecast(SpendingForecastBody),
	NotEnoughData(MessageBody),
}

impl SpendingForecastResponse {
	pub fn not_enough_data() -> Self {
		SpendingForecastResponse::NotEnoughData(MessageBody {
			message: NOT_ENOUGH_DATA_MESSAGE.to_string(),
		})
	}
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthlyContribution {
	pub month: MonthKey,
	pub amount: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GoalForecastBody {
	pub goal_id: Value,
	pub avg_monthly: f64,
	pub months_needed: Option<MonthsNeeded>,
	/// Empty when no completion date could be projected.
	pub estimated_completion_date: String,
	pub status: GoalStatus,
	pub required_per_month: f64,
	pub completion_probability: f64,
	pub series: Vec<MonthlyContribution>,
	#[serde(skip_serializing_if = "std::ops::Not::not")]
	pub not_enough_data: bool,
}

impl From<GoalForecast> for GoalForecastBody {
	fn from(forecast: GoalForecast) -> Self {
		Self {
			goal_id: forecast.goal_id,
			avg_monthly: forecast.avg_monthly_rate,
			months_needed: forecast.months_needed,
			estimated_completion_date: forecast
				.estimated_completion_date
				.map(|d| d.format("%Y-%m-%d").to_string())
				.unwrap_or_default(),
			status: forecast.status,
			required_per_month: forecast.required_per_month,
			completion_probability: forecast.completion_probability,
			series: forecast
				.series
				.into_iter()
				.map(|p| MonthlyContribution {
					month: p.month,
					amount: p.value,
				})
				.collect(),
			not_enough_data: forecast.not_enough_data,
		}
	}
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GoalForecastEntry {
	pub goal: Goal,
	pub forecast: GoalForecastBody,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SavingsForecastBody {
	pub goals: Vec<GoalForecastEntry>,
}
