use std::time::Duration;

use models::{Contribution, Goal, TransactionRecord};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::debug;

pub const EXPENSES_PATH: &str = "expenses";
pub const GOAL_PROGRESS_PATH: &str = "goals/progress";
pub const GOAL_CONTRIBUTIONS_PATH: &str = "goals/contributions";

/// Connection settings for the upstream finance API.
#[derive(Debug, Clone)]
pub struct BackendClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl BackendClientConfig {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
        }
    }
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("GET {which} failed: {source}")]
    Transport {
        which: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("GET {which} returned status {status}")]
    Status {
        which: &'static str,
        status: u16,
        body: String,
    },

    #[error("Failed to parse JSON response from {which}: {source}")]
    Decode {
        which: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl UpstreamError {
    /// Upstream path the failure came from, if a request was made.
    pub fn which(&self) -> Option<&'static str> {
        match self {
            UpstreamError::Client(_) => None,
            UpstreamError::Transport { which, .. }
            | UpstreamError::Status { which, .. }
            | UpstreamError::Decode { which, .. } => Some(*which),
        }
    }
}

/// Async client for the finance API endpoints the forecasts read from.
///
/// Each call forwards the caller's `Authorization` header unchanged.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: BackendClientConfig) -> Result<Self, UpstreamError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(UpstreamError::Client)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `GET /expenses`, served either as a bare list or wrapped as `{"expenses": [...]}`.
    pub async fn expenses(&self, auth: Option<&str>) -> Result<Vec<TransactionRecord>, UpstreamError> {
        let payload: ExpensesPayload = self.get_json(EXPENSES_PATH, auth).await?;
        Ok(payload.into_records())
    }

    /// `GET /goals/progress`
    pub async fn goal_progress(&self, auth: Option<&str>) -> Result<Vec<Goal>, UpstreamError> {
        let payload: ProgressPayload = self.get_json(GOAL_PROGRESS_PATH, auth).await?;
        Ok(payload.progress)
    }

    /// `GET /goals/contributions`
    pub async fn goal_contributions(&self, auth: Option<&str>) -> Result<Vec<Contribution>, UpstreamError> {
        let payload: ContributionsPayload = self.get_json(GOAL_CONTRIBUTIONS_PATH, auth).await?;
        Ok(payload.contributions)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        which: &'static str,
        auth: Option<&str>,
    ) -> Result<T, UpstreamError> {
        let url = self.endpoint(which);
        debug!(%url, forwarded_auth = auth.is_some(), "fetching upstream data");

        let mut request = self.http.get(&url);
        if let Some(auth) = auth {
            request = request.header(AUTHORIZATION, auth);
        }

        let response = request
            .send()
            .await
            .map_err(|source| UpstreamError::Transport { which, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                which,
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| UpstreamError::Decode { which, source })
    }
}

/// Upstream sends `null` for lists it has nothing in; read that as empty.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ExpensesPayload {
    List(Vec<TransactionRecord>),
    Wrapped {
        #[serde(default, deserialize_with = "null_as_empty")]
        expenses: Vec<TransactionRecord>,
    },
    Null(()),
}

impl ExpensesPayload {
    pub fn into_records(self) -> Vec<TransactionRecord> {
        match self {
            ExpensesPayload::List(records) => records,
            ExpensesPayload::Wrapped { expenses } => expenses,
            ExpensesPayload::Null(()) => Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProgressPayload {
    #[serde(default, deserialize_with = "null_as_empty")]
    progress: Vec<Goal>,
}

#[derive(Debug, Deserialize)]
struct ContributionsPayload {
    #[serde(default, deserialize_with = "null_as_empty")]
    contributions: Vec<Contribution>,
}
