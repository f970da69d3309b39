use super::{EstimateRequest, RenderClient, RenderError, RenderResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// JSON-over-HTTP client for the rendering service.
#[derive(Debug, Clone)]
pub struct HttpRenderClient {
    http_client: Client,
    url: String,
    timeout: Duration,
}

impl HttpRenderClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RenderError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(RenderError::NotConfigured("render URL is empty".to_string()));
        }
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RenderError::NotConfigured(e.to_string()))?;
        Ok(Self {
            http_client,
            url,
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RenderClient for HttpRenderClient {
    async fn generate(&self, request: &EstimateRequest) -> Result<RenderResult, RenderError> {
        debug!(
            url = %self.url,
            products = request.estimate_data.products.len(),
            "Sending estimate to rendering service"
        );
        let start = Instant::now();

        let response = self
            .http_client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!("Rendering request timed out after {:?}", self.timeout);
                    RenderError::Timeout {
                        seconds: self.timeout.as_secs(),
                    }
                } else if e.is_connect() {
                    error!("Cannot connect to rendering service at {}", self.url);
                    RenderError::Network(format!("Connection failed: {}", e))
                } else {
                    error!("Rendering request error: {}", e);
                    RenderError::Network(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                RenderError::Timeout {
                    seconds: self.timeout.as_secs(),
                }
            } else {
                RenderError::Network(format!("Failed to read response body: {}", e))
            }
        })?;

        if status != StatusCode::OK {
            error!("Rendering service returned error status {}: {}", status, body);
            return Err(RenderError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| RenderError::InvalidResponse(format!("{}: {}", e, body)))?;
        let result = RenderResult::from_response(&value)?;

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            files = result.file_urls.len(),
            "Estimate documents rendered"
        );
        Ok(result)
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_url_rejected() {
        assert!(matches!(
            HttpRenderClient::new("", Duration::from_secs(1)),
            Err(RenderError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_keeps_url() {
        let client = HttpRenderClient::new("http://localhost:8080/create", Duration::from_secs(5)).unwrap();
        assert_eq!(client.url(), "http://localhost:8080/create");
        assert_eq!(client.name(), "http");
    }
}
