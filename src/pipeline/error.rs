use crate::blob::BlobError;
use crate::llm::BackendError;
use crate::render::RenderError;
use crate::store::StoreError;
use thiserror::Error;

/// Why a step could not produce its output.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("required output '{key}' does not exist yet (available keys: [{}])", .available.join(", "))]
    MissingPredecessor { key: String, available: Vec<String> },

    #[error("required input '{field}' is missing (available keys: [{}])", .available.join(", "))]
    MissingInput { field: String, available: Vec<String> },

    #[error("job document {0} not found")]
    DocumentNotFound(String),

    #[error("'{key}' could not be decoded: {message}")]
    MalformedOutput { key: String, message: String },

    #[error("step {0} does not exist; steps run from 1 to 4")]
    InvalidStep(i64),

    #[error("no organization id: pass one with the request or set input.organizationId")]
    MissingOrganization,

    #[error("{0} is not configured")]
    NotConfigured(String),

    #[error("LLM call failed: {0}")]
    Llm(#[from] BackendError),

    #[error("blob store: {0}")]
    Blob(#[from] BlobError),

    #[error("rendering: {0}")]
    Render(#[from] RenderError),

    #[error("failed to write {key}: {source}")]
    Persistence {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to read job document: {0}")]
    Store(#[source] StoreError),
}

impl StepError {
    /// Short machine-readable category.
    pub fn kind(&self) -> &'static str {
        match self {
            StepError::MissingPredecessor { .. } => "missing_predecessor",
            StepError::MissingInput { .. } | StepError::MissingOrganization => "missing_input",
            StepError::DocumentNotFound(_) => "document_not_found",
            StepError::MalformedOutput { .. } => "malformed_output",
            StepError::InvalidStep(_) => "invalid_step",
            StepError::NotConfigured(_) => "not_configured",
            StepError::Llm(_) | StepError::Blob(_) | StepError::Render(_) => "external_call",
            StepError::Persistence { .. } | StepError::Store(_) => "persistence",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_predecessor_lists_keys() {
        let err = StepError::MissingPredecessor {
            key: "step3_output".to_string(),
            available: vec!["currentStep".to_string(), "step1_output".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("step3_output"));
        assert!(message.contains("currentStep, step1_output"));
        assert_eq!(err.kind(), "missing_predecessor");
    }

    #[test]
    fn test_external_errors_are_grouped() {
        let err: StepError = RenderError::Http {
            status: 502,
            body: "bad gateway".to_string(),
        }
        .into();
        assert_eq!(err.kind(), "external_call");
        assert!(err.to_string().contains("502"));
    }
}
