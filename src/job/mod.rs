//! The job document: the persisted record a multi-step run reads from and
//! writes to, plus typed views over its fields.

pub mod de;
pub mod model;
pub mod outputs;
pub mod table;

use crate::analysis::AnalysisData;
use crate::pipeline::StepError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub use model::{Part, PartsBreakdownEntry, PriceSource, ProductionItem};
pub use outputs::{
    OutputStamp, PartsSummary, ProductSummary, Step1Output, Step2Output, Step3Output, Step4Output,
    STATUS_SUCCESS,
};

pub const DEFAULT_COLLECTION: &str = "agent_job";

pub const CURRENT_STEP_FIELD: &str = "currentStep";
pub const COMPLETED_FIELD: &str = "allProcessCompleted";
pub const SIGNED_URL_FIELD: &str = "tmpPdfBlueprintDlUrl";
pub const INPUT_FIELD: &str = "input";
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// Position in the step sequence. `Completed` is terminal and has no executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Acquisition,
    ProductIdentification,
    PartsBreakdown,
    DocumentGeneration,
    Completed,
}

impl StepId {
    pub const EXECUTABLE: [StepId; 4] = [
        StepId::Acquisition,
        StepId::ProductIdentification,
        StepId::PartsBreakdown,
        StepId::DocumentGeneration,
    ];

    pub fn from_number(n: i64) -> Option<Self> {
        match n {
            1 => Some(StepId::Acquisition),
            2 => Some(StepId::ProductIdentification),
            3 => Some(StepId::PartsBreakdown),
            4 => Some(StepId::DocumentGeneration),
            5 => Some(StepId::Completed),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            StepId::Acquisition => 1,
            StepId::ProductIdentification => 2,
            StepId::PartsBreakdown => 3,
            StepId::DocumentGeneration => 4,
            StepId::Completed => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StepId::Acquisition => "acquisition",
            StepId::ProductIdentification => "product_identification",
            StepId::PartsBreakdown => "parts_breakdown",
            StepId::DocumentGeneration => "document_generation",
            StepId::Completed => "completed",
        }
    }

    pub fn is_executable(self) -> bool {
        self != StepId::Completed
    }

    /// The document key holding this step's work product, `step{N}_output`.
    pub fn output_key(self) -> Option<String> {
        self.is_executable()
            .then(|| format!("step{}_output", self.number()))
    }

    pub fn predecessor(self) -> Option<StepId> {
        Self::from_number(i64::from(self.number()) - 1)
    }

    pub fn next(self) -> Option<StepId> {
        Self::from_number(i64::from(self.number()) + 1)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.number(), self.label())
    }
}

/// Addresses one job document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobRef {
    pub collection: String,
    pub document_id: String,
}

impl JobRef {
    pub fn new(collection: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            document_id: document_id.into(),
        }
    }

    pub fn in_default_collection(document_id: impl Into<String>) -> Self {
        Self::new(DEFAULT_COLLECTION, document_id)
    }
}

impl fmt::Display for JobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.document_id)
    }
}

/// The caller-supplied `input` block of a job document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInput {
    #[serde(default)]
    pub pdf_file_path: String,
    #[serde(default)]
    pub pre_analysis_json: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl JobInput {
    pub fn new(pdf_file_path: impl Into<String>, pre_analysis_json: Value) -> Self {
        Self {
            pdf_file_path: pdf_file_path.into(),
            pre_analysis_json,
            organization_id: None,
            session_id: None,
        }
    }

    pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    pub fn analysis(&self) -> Result<AnalysisData, serde_json::Error> {
        AnalysisData::from_value(&self.pre_analysis_json)
    }
}

/// Fields of a freshly created job, pointer at step 1.
pub fn new_job_fields(input: &JobInput) -> Result<Map<String, Value>, serde_json::Error> {
    let mut fields = Map::new();
    fields.insert(CURRENT_STEP_FIELD.to_string(), Value::from(1));
    fields.insert(COMPLETED_FIELD.to_string(), Value::Bool(false));
    fields.insert(INPUT_FIELD.to_string(), serde_json::to_value(input)?);
    Ok(fields)
}

/// A snapshot of a job document's top-level fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobDocument {
    fields: Map<String, Value>,
}

impl JobDocument {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Top-level keys, sorted, for error messages.
    pub fn available_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.fields.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn current_step_number(&self) -> Option<i64> {
        self.fields.get(CURRENT_STEP_FIELD).and_then(Value::as_i64)
    }

    pub fn current_step(&self) -> Option<StepId> {
        self.current_step_number().and_then(StepId::from_number)
    }

    pub fn all_process_completed(&self) -> bool {
        self.fields
            .get(COMPLETED_FIELD)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn signed_url(&self) -> Option<&str> {
        self.fields
            .get(SIGNED_URL_FIELD)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn input(&self) -> Result<JobInput, StepError> {
        let raw = self
            .fields
            .get(INPUT_FIELD)
            .filter(|v| v.is_object())
            .ok_or_else(|| StepError::MissingInput {
                field: INPUT_FIELD.to_string(),
                available: self.available_keys(),
            })?;
        let input: JobInput =
            serde_json::from_value(raw.clone()).map_err(|e| StepError::MalformedOutput {
                key: INPUT_FIELD.to_string(),
                message: e.to_string(),
            })?;
        if input.pdf_file_path.trim().is_empty() {
            return Err(StepError::MissingInput {
                field: format!("{}.pdfFilePath", INPUT_FIELD),
                available: self.input_keys(),
            });
        }
        Ok(input)
    }

    /// `input.organizationId`, read without validating the rest of `input`.
    pub fn organization_id(&self) -> Option<&str> {
        self.fields
            .get(INPUT_FIELD)
            .and_then(|input| input.get("organizationId"))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    fn input_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .fields
            .get(INPUT_FIELD)
            .and_then(Value::as_object)
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// A step's output, only when it was recorded as successful.
    pub fn output_value(&self, step: StepId) -> Option<&Value> {
        let key = step.output_key()?;
        self.fields.get(&key).filter(|v| {
            v.get("status").and_then(Value::as_str) == Some(STATUS_SUCCESS)
        })
    }

    /// The four step outputs, indexed by step number minus one.
    pub fn outputs(&self) -> [Option<&Value>; 4] {
        StepId::EXECUTABLE.map(|step| self.output_value(step))
    }

    pub fn has_output(&self, step: StepId) -> bool {
        self.output_value(step).is_some()
    }

    /// Decodes a step output, reporting absence as a missing predecessor.
    pub fn output<T: DeserializeOwned>(&self, step: StepId) -> Result<T, StepError> {
        let key = step
            .output_key()
            .ok_or(StepError::InvalidStep(i64::from(step.number())))?;
        let value = self
            .output_value(step)
            .ok_or_else(|| StepError::MissingPredecessor {
                key: key.clone(),
                available: self.available_keys(),
            })?;
        serde_json::from_value(value.clone()).map_err(|e| StepError::MalformedOutput {
            key,
            message: e.to_string(),
        })
    }
}
