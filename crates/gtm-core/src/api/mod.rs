//! HTTP client for the GTM Synergy Suite API.
//!
//! One method per endpoint. Every call is a single request with no retry;
//! non-success statuses and malformed bodies surface as [`ApiError`].

pub mod askgtm;
pub mod dealsense;
pub mod outreachai;

use std::path::Path;

use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ApiError, Result};

pub use askgtm::{AskResponse, KnowledgeDocument, KnowledgeStats, Source};
pub use dealsense::{high_risk, DealInput, DealScore, RiskLevel};
pub use outreachai::{Channel, ChannelInfo, OutreachRequest, OutreachResult};

/// Response of `GET /`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServiceInfo {
    pub message: String,
    pub status: String,
    #[serde(default)]
    pub tools: Vec<String>,
}

/// The operations the tool sessions and the TUI drive.
///
/// [`GtmClient`] is the real implementation; tests swap in fakes.
#[async_trait]
pub trait GtmApi: Send + Sync {
    async fn service_info(&self) -> Result<ServiceInfo>;
    async fn stats(&self) -> Result<KnowledgeStats>;
    async fn ask(&self, question: &str) -> Result<AskResponse>;
    async fn reset(&self) -> Result<()>;
    async fn analyze_csv(&self, path: &Path) -> Result<Vec<DealScore>>;
    async fn generate(&self, request: &OutreachRequest) -> Result<OutreachResult>;
}

#[derive(Clone)]
pub struct GtmClient {
    client: Client,
    base_url: String,
}

impl GtmClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn service_info(&self) -> Result<ServiceInfo> {
        let response = self.client.get(self.url("/")).send().await?;
        read_json(response).await
    }

    /// Build a multipart form with a single `file` part read from disk.
    async fn file_form(path: &Path) -> Result<multipart::Form> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let part = multipart::Part::bytes(bytes).file_name(file_name);
        Ok(multipart::Form::new().part("file", part))
    }

    async fn post_file<T: DeserializeOwned>(&self, path: &str, file: &Path) -> Result<T> {
        let form = Self::file_form(file).await?;
        let url = self.url(path);
        tracing::debug!(%url, file = %file.display(), "uploading file");

        let response = self.client.post(&url).multipart(form).send().await?;
        read_json(response).await
    }
}

/// Reject non-success statuses, keeping the body for the error message.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(%status, "GTM API request failed");
        return Err(ApiError::Status { status, body });
    }
    Ok(response)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = check_status(response).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl GtmApi for GtmClient {
    async fn service_info(&self) -> Result<ServiceInfo> {
        GtmClient::service_info(self).await
    }

    async fn stats(&self) -> Result<KnowledgeStats> {
        GtmClient::stats(self).await
    }

    async fn ask(&self, question: &str) -> Result<AskResponse> {
        GtmClient::ask(self, question).await
    }

    async fn reset(&self) -> Result<()> {
        GtmClient::reset(self).await
    }

    async fn analyze_csv(&self, path: &Path) -> Result<Vec<DealScore>> {
        GtmClient::analyze_csv(self, path).await
    }

    async fn generate(&self, request: &OutreachRequest) -> Result<OutreachResult> {
        GtmClient::generate(self, request).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = GtmClient::new("http://localhost:8000//");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/askgtm/stats"), "http://localhost:8000/askgtm/stats");
    }

    #[tokio::test]
    async fn test_service_info() {
        let router = Router::new().route(
            "/",
            get(|| async {
                Json(json!({
                    "message": "GTM Synergy Suite API",
                    "status": "operational",
                    "tools": ["DealSense AI", "AskGTM AI", "OutreachAI"]
                }))
            }),
        );
        let client = GtmClient::new(&test_server::spawn(router).await);

        let info = client.service_info().await.unwrap();
        assert_eq!(info.status, "operational");
        assert_eq!(info.tools.len(), 3);
    }

    #[tokio::test]
    async fn test_error_status_keeps_body() {
        let router = Router::new().route(
            "/",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let client = GtmClient::new(&test_server::spawn(router).await);

        match client.service_info().await {
            Err(ApiError::Status { status, body }) => {
                assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "boom");
            }
            other => panic!("expected status error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let router = Router::new().route("/", get(|| async { "not json" }));
        let client = GtmClient::new(&test_server::spawn(router).await);

        assert!(matches!(client.service_info().await, Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn test_unreachable_is_http_error() {
        // Port 9 (discard) is almost never listening locally
        let client = GtmClient::new("http://127.0.0.1:9");
        assert!(matches!(client.service_info().await, Err(ApiError::Http(_))));
    }
}
