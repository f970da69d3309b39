//! What callers pass into a step run and what they get back.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Optional per-invocation inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
}

impl StepRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.user_instructions = Some(instructions.into());
        self
    }

    pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    /// Instructions, if any non-blank text was given.
    pub fn instructions(&self) -> Option<&str> {
        self.user_instructions
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Error,
}

/// Tagged result of one step invocation, returned verbatim to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step: u8,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// The step a confirmed follow-up invocation should run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<u8>,
    pub run_id: String,
}

impl StepResult {
    pub fn success(step: u8, run_id: &str, message: String, data: Value, next_step: Option<u8>) -> Self {
        Self {
            step,
            status: StepStatus::Success,
            message: Some(message),
            error_message: None,
            error_kind: None,
            data: Some(data),
            next_step,
            run_id: run_id.to_string(),
        }
    }

    pub fn error(step: u8, run_id: &str, kind: &str, error_message: String) -> Self {
        Self {
            step,
            status: StepStatus::Error,
            message: None,
            error_message: Some(error_message),
            error_kind: Some(kind.to_string()),
            data: None,
            next_step: None,
            run_id: run_id.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Success
    }
}

/// Where a job currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentStepInfo {
    pub current_step: Option<i64>,
    pub label: Option<String>,
    pub all_process_completed: bool,
}
