use super::{EstimateRequest, RenderClient, RenderError, RenderResult};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted rendering service that records every request body.
#[derive(Debug, Default)]
pub struct MockRenderClient {
    results: Mutex<VecDeque<Result<RenderResult, RenderError>>>,
    requests: Mutex<Vec<EstimateRequest>>,
}

impl MockRenderClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers the next call with a success listing `paths`.
    pub fn succeeding(paths: &[&str]) -> Self {
        let client = Self::new();
        client.push_success(paths);
        client
    }

    pub fn push_success(&self, paths: &[&str]) {
        self.push(Ok(RenderResult {
            status: "success".to_string(),
            estimate_gcs_path: paths.first().map(|s| s.to_string()),
            inner_gcs_path: paths.get(1).map(|s| s.to_string()),
            file_urls: paths.iter().map(|s| s.to_string()).collect(),
            message: Some("見積書・明細書が正常に生成されました".to_string()),
        }));
    }

    pub fn push(&self, result: Result<RenderResult, RenderError>) {
        if let Ok(mut queue) = self.results.lock() {
            queue.push_back(result);
        }
    }

    pub fn requests(&self) -> Vec<EstimateRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RenderClient for MockRenderClient {
    async fn generate(&self, request: &EstimateRequest) -> Result<RenderResult, RenderError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        self.results
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .unwrap_or_else(|| Err(RenderError::Network("MockRenderClient: no result queued".to_string())))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
