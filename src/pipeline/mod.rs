pub mod config;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod result;
pub mod step_trait;
pub mod steps;

pub use config::PipelineConfig;
pub use context::PipelineContext;
pub use error::StepError;
pub use orchestrator::StepOrchestrator;
pub use result::{CurrentStepInfo, StepRequest, StepResult, StepStatus};
pub use step_trait::{StepExecutor, StepOutcome};
