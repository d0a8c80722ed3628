use serde_json::Value;

/// Reads a monetary amount from an upstream JSON value.
///
/// Numbers are taken as-is and numeric strings are parsed. Anything else
/// (null, objects, text that is not a number, non-finite values) counts as 0.
pub fn parse_amount(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Rounds to cents. Magnitudes too large to scale by 100 have no fractional
/// part left and are returned as they are.
pub fn round2(v: f64) -> f64 {
    let cents = v * 100.0;
    if cents.is_finite() {
        cents.round() / 100.0
    } else {
        v
    }
}
