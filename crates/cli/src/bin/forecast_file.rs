use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use forecast_engine::{savings_report, spending_report};
use models::{Contribution, Goal, TransactionRecord};
use serde::Deserialize;
use serde_json::{Value, json};
use std::{fs, path::PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "forecast-file",
    about = "Run the spending and savings forecasts over a JSON export instead of the live API."
)]
struct Args {
    /// Export file with optional `expenses`, `progress` and `contributions` arrays
    #[arg(short, long)]
    input: PathBuf,

    /// Date the goal status is measured from (YYYY-MM-DD); defaults to today (UTC)
    #[arg(long)]
    today: Option<String>,

    /// Currency symbol used in the spending message
    #[arg(long, default_value = "₹")]
    currency: String,

    /// Pretty-print the JSON output
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

/// Same payloads the upstream API serves, bundled in one document.
#[derive(Debug, Default, Deserialize)]
struct Export {
    #[serde(default)]
    expenses: Vec<TransactionRecord>,
    #[serde(default)]
    progress: Vec<Goal>,
    #[serde(default)]
    contributions: Vec<Contribution>,
}

fn run_export(export: Export, today: NaiveDate, currency: &str) -> Result<Value> {
    let spending = spending_report(&export.expenses, currency);
    let savings = savings_report(export.progress, &export.contributions, today);
    Ok(json!({
        "spending": serde_json::to_value(spending)?,
        "savings": serde_json::to_value(savings)?,
    }))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let txt = fs::read_to_string(&args.input).with_context(|| format!("reading {}", args.input.display()))?;
    let export: Export = serde_json::from_str(&txt).with_context(|| format!("parsing {}", args.input.display()))?;

    let today = match args.today.as_deref() {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| anyhow!("invalid --today '{}', expected YYYY-MM-DD", raw))?,
        None => Utc::now().date_naive(),
    };

    let out = run_export(export, today, &args.currency)?;
    let rendered = if args.pretty { serde_json::to_string_pretty(&out)? } else { serde_json::to_string(&out)? };
    println!("{}", rendered);
    Ok(())
}
