use chrono::NaiveDate;
use models::{Contribution, Goal, GoalForecast, GoalStatus, MonthKey, MonthlySeries, MonthsNeeded};

use crate::aggregate::aggregate_by_goal;
use crate::amount::{parse_amount, round2};
use crate::calendar::{months_between, parse_target_date, project_completion_date};

/// Most recent contribution months averaged into the run-rate.
const RUN_RATE_MONTHS: usize = 6;

/// Months past the target date still reported as "slightly behind".
const SLIGHTLY_BEHIND_MONTHS: f64 = 2.0;

/// Projects one goal from its monthly contribution series.
///
/// `today` anchors the target-date comparison and, when there is no
/// contribution history, the completion-date base month.
pub fn project_goal(goal: &Goal, series: &MonthlySeries, today: NaiveDate) -> GoalForecast {
    let target_amount = parse_amount(&goal.target_amount);
    let current = parse_amount(&goal.current_savings);
    // A gap wider than f64 can hold is capped so every derived figure stays a number.
    let remaining = (target_amount - current).clamp(0.0, f64::MAX);

    if series.is_empty() && current <= 0.0 {
        return GoalForecast {
            goal_id: goal.id.clone(),
            avg_monthly_rate: 0.0,
            months_needed: None,
            estimated_completion_date: None,
            status: GoalStatus::Unknown,
            required_per_month: round2(remaining),
            completion_probability: 0.0,
            series: vec![],
            not_enough_data: true,
        };
    }

    let avg_monthly = average_run_rate(series);
    let months_needed = match remaining / avg_monthly {
        months if avg_monthly > 0.0 && months.is_finite() => MonthsNeeded::Finite(months),
        _ => MonthsNeeded::Unbounded,
    };

    let base_month = series
        .last_month()
        .unwrap_or_else(|| MonthKey::containing(today));
    let estimated_completion_date = months_needed
        .as_finite()
        .and_then(|months| project_completion_date(base_month, months));

    let target = goal.target_date_text().and_then(parse_target_date);
    let required_per_month = required_per_month(remaining, target, today);

    GoalForecast {
        goal_id: goal.id.clone(),
        avg_monthly_rate: round2(avg_monthly),
        months_needed: Some(match months_needed {
            MonthsNeeded::Finite(months) => MonthsNeeded::Finite(round2(months)),
            MonthsNeeded::Unbounded => MonthsNeeded::Unbounded,
        }),
        estimated_completion_date,
        status: target_status(months_needed, target, today),
        required_per_month: round2(required_per_month),
        completion_probability: round2(completion_probability(avg_monthly, required_per_month)),
        series: series.points(),
        not_enough_data: false,
    }
}

/// Projects every goal against its own contributions, in the order the goals were given.
pub fn project_goals(
    goals: &[Goal],
    contributions: &[Contribution],
    today: NaiveDate,
) -> Vec<GoalForecast> {
    let per_goal = aggregate_by_goal(contributions);
    let no_history = MonthlySeries::new();
    goals
        .iter()
        .map(|goal| {
            let series = goal
                .goal_id()
                .and_then(|id| per_goal.get(&id))
                .unwrap_or(&no_history);
            project_goal(goal, series, today)
        })
        .collect()
}

/// Mean of the last six months of contributions (fewer if the history is shorter).
pub fn average_run_rate(series: &MonthlySeries) -> f64 {
    let values = series.values();
    if values.is_empty() {
        return 0.0;
    }
    let window = values.len().min(RUN_RATE_MONTHS);
    let mean = values[values.len() - window..].iter().sum::<f64>() / window as f64;
    mean.clamp(f64::MIN, f64::MAX)
}

/// Classifies `months_needed - months_left`.
pub fn classify_gap(diff: f64) -> GoalStatus {
    if diff <= 0.0 {
        GoalStatus::OnTrack
    } else if diff <= SLIGHTLY_BEHIND_MONTHS {
        GoalStatus::SlightlyBehind
    } else {
        GoalStatus::Behind
    }
}

fn target_status(months_needed: MonthsNeeded, target: Option<NaiveDate>, today: NaiveDate) -> GoalStatus {
    let Some(target) = target else {
        return GoalStatus::Unknown;
    };
    match months_needed {
        MonthsNeeded::Unbounded => GoalStatus::Behind,
        MonthsNeeded::Finite(months) => {
            let months_left = months_between(MonthKey::containing(today), MonthKey::containing(target));
            classify_gap(months - months_left as f64)
        }
    }
}

/// Monthly amount needed to hit the target date. Without a target the whole
/// remainder is treated as due now.
pub fn required_per_month(remaining: f64, target: Option<NaiveDate>, today: NaiveDate) -> f64 {
    match target {
        Some(target) => {
            let months_left =
                months_between(MonthKey::containing(today), MonthKey::containing(target)).max(1);
            remaining / months_left as f64
        }
        None => remaining,
    }
}

/// Heuristic likelihood (0-100) of finishing on time: the ratio of the actual
/// run-rate to the required one, capped at 100%. Not a statistical estimate.
pub fn completion_probability(avg_monthly: f64, required_per_month: f64) -> f64 {
    if required_per_month > 0.0 {
        let ratio = avg_monthly / required_per_month;
        if !ratio.is_finite() {
            return 0.0;
        }
        ratio.clamp(0.0, 1.0) * 100.0
    } else {
        100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::id_from_value;
    use serde_json::{json, Value};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn goal(id: Value, target: f64, current: f64, target_date: Option<&str>) -> Goal {
        Goal {
            id,
            target_amount: json!(target),
            current_savings: json!(current),
            target_date: target_date.map(|d| json!(d)).unwrap_or(Value::Null),
            ..Goal::default()
        }
    }

    /// Consecutive months starting at `start` holding `values`.
    fn series_from(start: &str, values: &[f64]) -> MonthlySeries {
        let start: MonthKey = start.parse().unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (crate::calendar::add_months(start, i as u32).unwrap(), *v))
            .collect()
    }

    #[test]
    fn test_projects_steady_saver() {
        let g = goal(json!(1), 1200.0, 0.0, Some("2025-12-31"));
        let series = series_from("2024-01", &[100.0; 6]);
        let f = project_goal(&g, &series, date("2024-07-01"));

        assert_eq!(f.goal_id, json!(1));
        assert_eq!(f.avg_monthly_rate, 100.0);
        assert_eq!(f.months_needed, Some(MonthsNeeded::Finite(12.0)));
        assert_eq!(f.estimated_completion_date, Some(date("2025-06-01")));
        // 17 months left, 12 needed
        assert_eq!(f.status, GoalStatus::OnTrack);
        assert_eq!(f.required_per_month, 70.59);
        assert_eq!(f.completion_probability, 100.0);
        assert_eq!(f.series.len(), 6);
        assert!(!f.not_enough_data);
    }

    #[test]
    fn test_no_history_and_no_savings_is_not_enough_data() {
        let g = goal(json!("abc"), 500.0, 0.0, Some("2025-01-01"));
        let f = project_goal(&g, &MonthlySeries::new(), date("2024-07-01"));

        assert!(f.not_enough_data);
        assert_eq!(f.goal_id, json!("abc"));
        assert_eq!(f.avg_monthly_rate, 0.0);
        assert_eq!(f.months_needed, None);
        assert_eq!(f.estimated_completion_date, None);
        assert_eq!(f.status, GoalStatus::Unknown);
        assert_eq!(f.required_per_month, 500.0);
        assert_eq!(f.completion_probability, 0.0);
        assert!(f.series.is_empty());
    }

    #[test]
    fn test_savings_without_history_never_completes() {
        let g = goal(json!(2), 1000.0, 500.0, Some("2025-01-15"));
        let f = project_goal(&g, &MonthlySeries::new(), date("2024-07-01"));

        assert!(!f.not_enough_data);
        assert_eq!(f.months_needed, Some(MonthsNeeded::Unbounded));
        assert_eq!(f.estimated_completion_date, None);
        assert_eq!(f.status, GoalStatus::Behind);
        // 6 months left
        assert_eq!(f.required_per_month, 83.33);
        assert_eq!(f.completion_probability, 0.0);
    }

    #[test]
    fn test_without_target_date_status_unknown_and_all_due_now() {
        let g = goal(json!(3), 1000.0, 200.0, None);
        let series = series_from("2024-03", &[200.0, 200.0]);
        let f = project_goal(&g, &series, date("2024-05-10"));

        assert_eq!(f.status, GoalStatus::Unknown);
        assert_eq!(f.months_needed, Some(MonthsNeeded::Finite(4.0)));
        assert_eq!(f.estimated_completion_date, Some(date("2024-08-01")));
        assert_eq!(f.required_per_month, 800.0);
        assert_eq!(f.completion_probability, 25.0);
    }

    #[test]
    fn test_unparseable_target_date_falls_back() {
        let g = goal(json!(4), 1000.0, 0.0, Some("someday"));
        let series = series_from("2024-03", &[100.0]);
        let f = project_goal(&g, &series, date("2024-04-01"));

        assert_eq!(f.status, GoalStatus::Unknown);
        assert_eq!(f.required_per_month, 1000.0);
        assert_eq!(f.completion_probability, 10.0);
    }

    #[test]
    fn test_slightly_behind_and_behind() {
        // 10 months needed
        let series = series_from("2023-10", &[100.0; 3]);
        let slightly = goal(json!(5), 1000.0, 0.0, Some("2024-10-01"));
        let f = project_goal(&slightly, &series, date("2024-01-15"));
        assert_eq!(f.status, GoalStatus::SlightlyBehind);
        assert_eq!(f.required_per_month, 111.11);
        assert_eq!(f.completion_probability, 90.0);

        let behind = goal(json!(6), 1000.0, 0.0, Some("2024-06-30"));
        let f = project_goal(&behind, &series, date("2024-01-15"));
        assert_eq!(f.status, GoalStatus::Behind);
    }

    #[test]
    fn test_past_target_date_requires_everything_in_one_month() {
        let g = goal(json!(7), 900.0, 300.0, Some("2023-01-01"));
        let series = series_from("2024-01", &[50.0, 50.0]);
        let f = project_goal(&g, &series, date("2024-03-01"));

        assert_eq!(f.status, GoalStatus::Behind);
        assert_eq!(f.required_per_month, 600.0);
        assert_eq!(f.months_needed, Some(MonthsNeeded::Finite(12.0)));
    }

    #[test]
    fn test_completed_goal() {
        let g = goal(json!(8), 1000.0, 1200.0, Some("2025-01-01"));
        let series = series_from("2024-01", &[100.0, 100.0]);
        let f = project_goal(&g, &series, date("2024-03-01"));

        assert_eq!(f.months_needed, Some(MonthsNeeded::Finite(0.0)));
        assert_eq!(f.estimated_completion_date, Some(date("2024-02-01")));
        assert_eq!(f.status, GoalStatus::OnTrack);
        assert_eq!(f.required_per_month, 0.0);
        assert_eq!(f.completion_probability, 100.0);
    }

    #[test]
    fn test_fractional_months_round_to_days() {
        // 250 remaining at 100/month = 2.5 months from 2024-11
        let g = goal(json!(9), 250.0, 0.0, None);
        let series = series_from("2024-11", &[100.0]);
        let f = project_goal(&g, &series, date("2024-11-20"));
        assert_eq!(f.months_needed, Some(MonthsNeeded::Finite(2.5)));
        assert_eq!(f.estimated_completion_date, Some(date("2025-01-16")));
    }

    #[test]
    fn test_average_run_rate_uses_last_six_months() {
        assert_eq!(average_run_rate(&MonthlySeries::new()), 0.0);
        let series = series_from("2024-01", &[1000.0, 1000.0, 60.0, 60.0, 60.0, 60.0, 60.0, 60.0]);
        assert_eq!(average_run_rate(&series), 60.0);
        let short = series_from("2024-01", &[10.0, 20.0, 30.0]);
        assert_eq!(average_run_rate(&short), 20.0);
    }

    #[test]
    fn test_classify_gap_boundaries() {
        assert_eq!(classify_gap(-3.0), GoalStatus::OnTrack);
        assert_eq!(classify_gap(0.0), GoalStatus::OnTrack);
        assert_eq!(classify_gap(0.01), GoalStatus::SlightlyBehind);
        assert_eq!(classify_gap(2.0), GoalStatus::SlightlyBehind);
        assert_eq!(classify_gap(2.01), GoalStatus::Behind);
        assert_eq!(classify_gap(40.0), GoalStatus::Behind);
    }

    #[test]
    fn test_classify_gap_is_monotonic() {
        let rank = |s: GoalStatus| match s {
            GoalStatus::OnTrack => 0,
            GoalStatus::SlightlyBehind => 1,
            GoalStatus::Behind => 2,
            GoalStatus::Unknown => unreachable!(),
        };
        let mut previous = rank(classify_gap(-10.0));
        for step in -100..=100 {
            let current = rank(classify_gap(step as f64 * 0.1));
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn test_completion_probability_is_clamped() {
        assert_eq!(completion_probability(500.0, 100.0), 100.0);
        assert_eq!(completion_probability(-50.0, 100.0), 0.0);
        assert_eq!(completion_probability(25.0, 100.0), 25.0);
        assert_eq!(completion_probability(0.0, 0.0), 100.0);
        assert_eq!(completion_probability(f64::INFINITY, 1.0), 0.0);
    }

    #[test]
    fn test_required_per_month_floor_of_one_month() {
        let today = date("2024-06-15");
        assert_eq!(required_per_month(600.0, Some(date("2024-06-30")), today), 600.0);
        assert_eq!(required_per_month(600.0, Some(date("2024-12-01")), today), 100.0);
        assert_eq!(required_per_month(600.0, None, today), 600.0);
    }

    #[test]
    fn test_project_goals_matches_contributions_by_id() {
        let goals = vec![
            goal(json!(1), 600.0, 100.0, None),
            goal(json!("2"), 600.0, 0.0, None),
        ];
        let contributions = vec![
            Contribution {
                goal_id: id_from_value(&json!(1)),
                amount: json!(50),
                date: Some("2024-01-10".to_string()),
            },
            Contribution {
                goal_id: Some("1".to_string()),
                amount: json!("50"),
                date: Some("2024-01-25".to_string()),
            },
        ];
        let forecasts = project_goals(&goals, &contributions, date("2024-02-01"));

        assert_eq!(forecasts.len(), 2);
        assert_eq!(forecasts[0].avg_monthly_rate, 100.0);
        assert_eq!(forecasts[0].months_needed, Some(MonthsNeeded::Finite(5.0)));
        assert!(forecasts[1].not_enough_data);
    }

    #[test]
    fn test_tiny_run_rate_is_unbounded() {
        let g = goal(json!(5), 1000.0, 0.0, Some("2025-01-01"));
        let series = series_from("2024-05", &[5e-324]);
        let f = project_goal(&g, &series, date("2024-06-01"));

        assert_eq!(f.months_needed, Some(MonthsNeeded::Unbounded));
        assert_eq!(f.estimated_completion_date, None);
        assert_eq!(f.status, GoalStatus::Behind);
        let body = serde_json::to_value(models::GoalForecastBody::from(f)).unwrap();
        assert_eq!(body["months_needed"], json!("infinite"));
    }

    #[test]
    fn test_huge_gap_stays_numeric() {
        let g = goal(json!(6), 1e308, -1e308, Some("2025-01-01"));
        let series = series_from("2024-05", &[100.0]);
        let f = project_goal(&g, &series, date("2024-06-01"));

        assert!(f.months_needed.and_then(|m| m.as_finite()).is_some_and(f64::is_finite));
        assert_eq!(f.estimated_completion_date, None);
        assert_eq!(f.status, GoalStatus::Behind);
        assert!(f.required_per_month.is_finite());
        let body = serde_json::to_value(models::GoalForecastBody::from(f)).unwrap();
        assert!(body["months_needed"].is_number());
        assert!(body["required_per_month"].is_number());
        assert!(body["completion_probability"].is_number());
    }

    #[test]
    fn test_run_rate_overflow_is_capped() {
        let series = series_from("2024-01", &[f64::MAX, f64::MAX]);
        assert_eq!(average_run_rate(&series), f64::MAX);
    }
}
