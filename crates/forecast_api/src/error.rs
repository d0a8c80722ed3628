use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use backend_client::UpstreamError;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

pub const SPENDING_FETCH_FAILED: &str = "Unable to fetch data from backend for forecasting.";
pub const SAVINGS_FETCH_FAILED: &str = "Unable to fetch data for savings forecast.";

#[derive(Debug, Error)]
pub enum ApiError {
    /// An upstream fetch failed. `debug` adds the upstream diagnostics to the response body.
    #[error("{message}")]
    Upstream {
        message: &'static str,
        #[source]
        source: UpstreamError,
        debug: bool,
    },
}

impl ApiError {
    pub fn upstream(message: &'static str, source: UpstreamError, debug: bool) -> Self {
        ApiError::Upstream {
            message,
            source,
            debug,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Upstream {
                message,
                source,
                debug,
            } => {
                let mut body = json!({ "message": message });
                if debug {
                    body["detail"] = json!(source.to_string());
                    if let Some(which) = source.which() {
                        body["which"] = json!(which);
                    }
                    if let UpstreamError::Status {
                        status,
                        body: upstream_body,
                        ..
                    } = &source
                    {
                        body["status"] = json!(status);
                        body["body"] = json!(upstream_body);
                    }
                }
                (StatusCode::BAD_GATEWAY, Json(body)).into_response()
            }
        }
    }
}
