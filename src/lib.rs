//! blueprint-estimator - step-by-step cost estimation for CAD blueprints
//!
//! A job document names a blueprint file and its pre-analysis. Four steps,
//! each run by a separate call once a human has confirmed the previous one,
//! turn it into a priced estimate:
//!
//! 1. **Acquisition**: download the blueprint, sniff its format and describe
//!    the pre-analysis.
//! 2. **Product identification**: ask the LLM which products the blueprint
//!    shows, falling back to quantity callouts in the analysis text.
//! 3. **Parts breakdown**: ask the LLM for parts and unit prices, then correct
//!    prices against the pricing database.
//! 4. **Document generation**: send the estimate to the rendering service.
//!
//! Every step output is persisted on the job document under `stepN_output`,
//! and `currentStep` records which step ran last.
//!
//! # Example Usage
//!
//! ```ignore
//! use blueprint_estimator::blob::MemoryBlobStore;
//! use blueprint_estimator::job::JobRef;
//! use blueprint_estimator::llm::MockLLMClient;
//! use blueprint_estimator::pipeline::{PipelineConfig, PipelineContext, StepOrchestrator, StepRequest};
//! use blueprint_estimator::store::MemoryDocumentStore;
//! use std::sync::Arc;
//!
//! async fn run_first_step(store: Arc<MemoryDocumentStore>, blobs: Arc<MemoryBlobStore>) {
//!     let ctx = PipelineContext::new(store, blobs, Arc::new(MockLLMClient::new()), PipelineConfig::default());
//!     let orchestrator = StepOrchestrator::new(ctx);
//!
//!     let result = orchestrator
//!         .run_step(&JobRef::in_default_collection("job-1"), 1, &StepRequest::new())
//!         .await;
//!     println!("{:?}: {:?}", result.status, result.message);
//! }
//! ```
//!
//! # Project Structure
//!
//! - [`pipeline`]: orchestrator and step executors
//! - [`parser`]: LLM response parsing and fallbacks
//! - [`pricing`]: pricing database, unit price estimation and correction
//! - [`store`], [`blob`], [`llm`], [`render`]: external collaborators behind traits

pub mod analysis;
pub mod blob;
pub mod cli;
pub mod config;
pub mod job;
pub mod llm;
pub mod parser;
pub mod pipeline;
pub mod pricing;
pub mod progress;
pub mod render;
pub mod store;
pub mod util;

pub use config::{ConfigError, EstimatorConfig};
pub use job::{JobDocument, JobInput, JobRef, StepId};
pub use llm::{BackendError, LLMClient};
pub use pipeline::{
    PipelineConfig, PipelineContext, StepError, StepOrchestrator, StepRequest, StepResult,
    StepStatus,
};
pub use pricing::{PricingDatabase, UnitPriceEstimator};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
