//! # Settings Loader
//!
//! Centralized configuration for the forecast service. Settings are resolved in three
//! layers, each overriding the previous one:
//!
//! 1. Built-in defaults ([`ServiceSettings::default`])
//! 2. An optional JSON settings file (any subset of keys)
//! 3. Environment variables
//!
//! | key | env var | default |
//! |---|---|---|
//! | `api_base` | `NODE_API_BASE` | `http://localhost:5000/api` |
//! | `client_origin` | `CLIENT_ORIGIN` | `http://localhost:3000` |
//! | `debug` | `DEBUG` | `false` |
//! | `host` | `FORECAST_HOST` | `0.0.0.0` |
//! | `port` | `FORECAST_PORT` | `8000` |
//! | `request_timeout_secs` | `FORECAST_TIMEOUT_SECS` | `10` |
//! | `currency_symbol` | `FORECAST_CURRENCY` | `₹` |
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! // Defaults, then ./forecast_settings.json or $FORECAST_SETTINGS, then env vars
//! let settings = settings_loader::load_service_settings()?;
//! println!("upstream: {}", settings.api_base);
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Settings file picked up from the working directory when `FORECAST_SETTINGS` is unset.
pub const DEFAULT_SETTINGS_FILE: &str = "forecast_settings.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Base URL of the upstream finance API, without a trailing slash.
    pub api_base: String,
    /// The only origin allowed by CORS.
    pub client_origin: String,
    /// Adds upstream diagnostics to error responses.
    pub debug: bool,
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub currency_symbol: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:5000/api".to_string(),
            client_origin: "http://localhost:3000".to_string(),
            debug: false,
            host: "0.0.0.0".to_string(),
            port: 8000,
            request_timeout_secs: 10,
            currency_symbol: "₹".to_string(),
        }
    }
}

impl ServiceSettings {
    /// Applies overrides read through `lookup` (normally `std::env::var`).
    ///
    /// Values that fail to parse leave the current setting untouched.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("NODE_API_BASE") {
            self.api_base = v;
        }
        if let Some(v) = lookup("CLIENT_ORIGIN") {
            self.client_origin = v;
        }
        if let Some(v) = lookup("DEBUG") {
            self.debug = v.trim().eq_ignore_ascii_case("true");
        }
        if let Some(v) = lookup("FORECAST_HOST") {
            self.host = v;
        }
        override_parsed(&mut self.port, lookup("FORECAST_PORT"));
        override_parsed(&mut self.request_timeout_secs, lookup("FORECAST_TIMEOUT_SECS"));
        if let Some(v) = lookup("FORECAST_CURRENCY") {
            self.currency_symbol = v;
        }
        self.api_base = self.api_base.trim_end_matches('/').to_string();
        self
    }
}

fn override_parsed<T: FromStr>(slot: &mut T, raw: Option<String>) {
    if let Some(parsed) = raw.and_then(|v| v.trim().parse().ok()) {
        *slot = parsed;
    }
}

/// Loads settings from a JSON file. Missing keys keep their defaults.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<ServiceSettings> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Reading settings file: {}", path.display()))?;
    let settings: ServiceSettings = serde_json::from_str(&raw)
        .with_context(|| format!("Parsing settings JSON in {}", path.display()))?;
    Ok(settings)
}

/// Loads settings from an optional path, returning the defaults if no path is provided
pub fn load_optional_settings(path: Option<&PathBuf>) -> Result<ServiceSettings> {
    match path {
        Some(settings_path) => load_settings(settings_path),
        None => Ok(ServiceSettings::default()),
    }
}

/// Resolves the full settings stack for the running process.
///
/// An explicit `FORECAST_SETTINGS` path must exist; the default file is only used if present.
pub fn load_service_settings() -> Result<ServiceSettings> {
    let explicit = env::var("FORECAST_SETTINGS").ok().map(PathBuf::from);
    let path = explicit.or_else(|| {
        let default = PathBuf::from(DEFAULT_SETTINGS_FILE);
        settings_file_exists(&default).then_some(default)
    });
    let settings = load_optional_settings(path.as_ref())?;
    Ok(settings.with_overrides(|key| env::var(key).ok()))
}

/// Checks if a settings file exists at the given path
pub fn settings_file_exists<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().exists() && path.as_ref().is_file()
}
