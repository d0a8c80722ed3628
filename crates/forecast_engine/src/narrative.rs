use crate::amount::round2;

/// Sentence shown next to the spending forecast, e.g.
/// `Your next month’s expenses are expected to be ₹1,250 (+4.17% from last month).`
///
/// The estimate is truncated to whole currency units for display.
pub fn spending_narrative(estimate: f64, growth_rate: f64, currency_symbol: &str) -> String {
    let sign = if growth_rate >= 0.0 { "+" } else { "" };
    let pct = round2(growth_rate * 100.0);
    format!(
        "Your next month’s expenses are expected to be {currency_symbol}{} ({sign}{pct:.2}% from last month).",
        group_thousands(estimate)
    )
}

/// Renders the whole part of `value` with comma thousands separators.
pub fn group_thousands(value: f64) -> String {
    let whole = value.trunc();
    let digits = format!("{:.0}", whole.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if whole < 0.0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
