use async_trait::async_trait;
use backend_client::{BackendClient, BackendClientConfig, UpstreamError};
use models::{Contribution, Goal, TransactionRecord};
use settings_loader::ServiceSettings;
use std::time::Duration;

/// Source of the records the forecasts are computed from.
/// This abstraction allows swapping the HTTP upstream for an in-memory source in tests.
#[async_trait]
pub trait FinanceRepository: Send + Sync {
    async fn fetch_expenses(&self, auth: Option<&str>) -> Result<Vec<TransactionRecord>, UpstreamError>;
    async fn fetch_goal_progress(&self, auth: Option<&str>) -> Result<Vec<Goal>, UpstreamError>;
    async fn fetch_contributions(&self, auth: Option<&str>) -> Result<Vec<Contribution>, UpstreamError>;
}

/// Reads from the upstream finance API over HTTP
pub struct HttpFinanceRepository {
    client: BackendClient,
}

impl HttpFinanceRepository {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    pub fn from_settings(settings: &ServiceSettings) -> Result<Self, UpstreamError> {
        let client = BackendClient::new(BackendClientConfig::new(
            settings.api_base.clone(),
            Duration::from_secs(settings.request_timeout_secs),
        ))?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl FinanceRepository for HttpFinanceRepository {
    async fn fetch_expenses(&self, auth: Option<&str>) -> Result<Vec<TransactionRecord>, UpstreamError> {
        self.client.expenses(auth).await
    }

    async fn fetch_goal_progress(&self, auth: Option<&str>) -> Result<Vec<Goal>, UpstreamError> {
        self.client.goal_progress(auth).await
    }

    async fn fetch_contributions(&self, auth: Option<&str>) -> Result<Vec<Contribution>, UpstreamError> {
        self.client.goal_contributions(auth).await
    }
}
