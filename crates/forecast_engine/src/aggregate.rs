use std::collections::BTreeMap;

use models::{Contribution, MonthKey, MonthlySeries, TransactionRecord};
use tracing::trace;

use crate::amount::parse_amount;

/// A dated, amount-bearing record that can be bucketed by calendar month.
pub trait MonthlyEntry {
    /// Amount with malformed values already coerced to 0.
    fn amount(&self) -> f64;
    /// Month taken from the date prefix, `None` when the date is too short or malformed.
    fn month(&self) -> Option<MonthKey>;
}

impl MonthlyEntry for TransactionRecord {
    fn amount(&self) -> f64 {
        parse_amount(&self.amount)
    }

    fn month(&self) -> Option<MonthKey> {
        self.date.as_deref().and_then(MonthKey::from_date_prefix)
    }
}

impl MonthlyEntry for Contribution {
    fn amount(&self) -> f64 {
        parse_amount(&self.amount)
    }

    fn month(&self) -> Option<MonthKey> {
        self.date.as_deref().and_then(MonthKey::from_date_prefix)
    }
}

/// Sums record amounts per calendar month.
///
/// Records without a usable month are dropped entirely rather than counted as zero.
pub fn aggregate<T: MonthlyEntry>(records: &[T]) -> MonthlySeries {
    let mut series = MonthlySeries::new();
    for record in records {
        match record.month() {
            Some(month) => series.add(month, record.amount()),
            None => trace!("skipping record without a valid month prefix"),
        }
    }
    series
}

/// Same as [`aggregate`], partitioned by goal id. Contributions missing a goal id are dropped.
pub fn aggregate_by_goal(contributions: &[Contribution]) -> BTreeMap<String, MonthlySeries> {
    let mut per_goal: BTreeMap<String, MonthlySeries> = BTreeMap::new();
    for contribution in contributions {
        let (Some(goal_id), Some(month)) = (contribution.goal_id.as_ref(), contribution.month())
        else {
            trace!(goal_id = ?contribution.goal_id, "skipping contribution without goal id or month");
            continue;
        };
        per_goal
            .entry(goal_id.clone())
            .or_default()
            .add(month, contribution.amount());
    }
    per_goal
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn record(amount: Value, date: &str) -> TransactionRecord {
        TransactionRecord {
            amount,
            date: Some(date.to_string()),
        }
    }

    fn contribution(goal_id: Option<&str>, amount: f64, date: &str) -> Contribution {
        Contribution {
            goal_id: goal_id.map(str::to_string),
            amount: json!(amount),
            date: Some(date.to_string()),
        }
    }

    fn rendered(series: &MonthlySeries) -> Vec<(String, f64)> {
        series
            .points()
            .into_iter()
            .map(|p| (p.month.to_string(), p.value))
            .collect()
    }

    #[test]
    fn test_aggregate_empty() {
        let records: Vec<TransactionRecord> = vec![];
        assert!(aggregate(&records).is_empty());
    }

    #[test]
    fn test_aggregate_sums_per_month_sorted() {
        let records = vec![
            record(json!(50), "2024-03-10"),
            record(json!(20.5), "2024-01-31T12:00:00.000Z"),
            record(json!("30"), "2024-03-01"),
            record(json!(10), "2024-01-02"),
        ];
        assert_eq!(
            rendered(&aggregate(&records)),
            vec![("2024-01".to_string(), 30.5), ("2024-03".to_string(), 80.0)]
        );
    }

    #[test]
    fn test_aggregate_malformed_amount_counts_as_zero() {
        let records = vec![
            record(json!("n/a"), "2024-02-10"),
            record(Value::Null, "2024-02-11"),
        ];
        assert_eq!(
            rendered(&aggregate(&records)),
            vec![("2024-02".to_string(), 0.0)]
        );
    }

    #[test]
    fn test_aggregate_drops_short_or_missing_dates() {
        let records = vec![
            record(json!(10), "2024-0"),
            record(json!(10), ""),
            record(json!(10), "yesterday"),
            TransactionRecord {
                amount: json!(10),
                date: None,
            },
        ];
        assert!(aggregate(&records).is_empty());
    }

    #[test]
    fn test_aggregate_keys_are_well_formed() {
        let records = vec![
            record(json!(1), "2023-12-31"),
            record(json!(2), "2024-01"),
            record(json!(3), "2024-1-5"),
            record(json!(4), "2024-01-05"),
        ];
        let series = aggregate(&records);
        let months: Vec<String> = series.months().map(|m| m.to_string()).collect();
        assert_eq!(months, vec!["2023-12", "2024-01"]);
        assert!(months.iter().all(|m| m.len() == 7));
    }

    #[test]
    fn test_aggregate_is_order_independent() {
        let mut records = vec![
            record(json!(12.5), "2024-04-01"),
            record(json!(7.25), "2024-05-01"),
            record(json!(100), "2024-04-20"),
            record(json!(-3), "2024-05-09"),
        ];
        let forward = aggregate(&records);
        records.reverse();
        assert_eq!(aggregate(&records), forward);
    }

    #[test]
    fn test_aggregate_by_goal_partitions() {
        let contributions = vec![
            contribution(Some("1"), 100.0, "2024-01-05"),
            contribution(Some("2"), 40.0, "2024-01-06"),
            contribution(Some("1"), 50.0, "2024-01-20"),
            contribution(Some("1"), 25.0, "2024-02-01"),
            contribution(None, 999.0, "2024-02-01"),
            contribution(Some("2"), 999.0, "bad"),
        ];
        let per_goal = aggregate_by_goal(&contributions);
        assert_eq!(per_goal.len(), 2);
        assert_eq!(
            rendered(&per_goal["1"]),
            vec![("2024-01".to_string(), 150.0), ("2024-02".to_string(), 25.0)]
        );
        assert_eq!(rendered(&per_goal["2"]), vec![("2024-01".to_string(), 40.0)]);
    }
}
