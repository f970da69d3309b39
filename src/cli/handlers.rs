//! Command handlers. Each returns the process exit code.

use super::commands::{ConfigArgs, InitArgs, OutputArgs, PriceArgs, RunArgs, StatusArgs};
use super::output::OutputFormatter;
use crate::blob::{normalize_path, LocalBlobStore};
use crate::config::EstimatorConfig;
use crate::job::{new_job_fields, JobInput, JobRef};
use crate::llm::{provider_has_credentials, ExchangeLog, GenAIClient};
use crate::pipeline::{PipelineContext, StepOrchestrator, StepRequest};
use crate::pricing::UnitPriceEstimator;
use crate::progress::LoggingHandler;
use crate::render::HttpRenderClient;
use crate::store::{DocumentStore, JsonFileStore};
use anyhow::{Context, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;

fn report(result: Result<i32>) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_FAILURE
        }
    }
}

fn load_config() -> Result<EstimatorConfig> {
    let config = EstimatorConfig::default();
    config.validate().context("Invalid configuration")?;
    debug!("{}", config);
    Ok(config)
}

fn job_ref(config: &EstimatorConfig, collection: &Option<String>, document: &str) -> JobRef {
    let collection = collection
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(&config.collection);
    JobRef::new(collection, document)
}

fn print(output: String) {
    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }
}

/// An orchestrator over the on-disk store and blob directory, with the
/// configured LLM and, when a URL is set, the HTTP rendering client.
fn build_orchestrator(config: &EstimatorConfig) -> Result<StepOrchestrator> {
    let provider = config.adapter_kind()?;
    if !provider_has_credentials(provider) {
        warn!(
            provider = provider.as_str(),
            "No API key found for provider; LLM steps will fail"
        );
    }
    let llm = GenAIClient::new(provider, config.model.clone(), config.llm_timeout())
        .context("Failed to create LLM client")?;

    let mut ctx = PipelineContext::new(
        Arc::new(JsonFileStore::new(&config.store_dir)),
        Arc::new(LocalBlobStore::new(&config.blob_dir, config.url_signing_key.clone())),
        Arc::new(llm),
        config.pipeline_config(),
    )
    .with_exchange_log(ExchangeLog::new(config.exchange_log.clone()))
    .with_progress_handler(Arc::new(LoggingHandler));

    match &config.render_url {
        Some(url) => {
            let render = HttpRenderClient::new(url.clone(), config.render_timeout())
                .context("Failed to create rendering client")?;
            ctx = ctx.with_render_client(Arc::new(render));
        }
        None => debug!("ESTIMATOR_RENDER_URL not set; step 4 is unavailable"),
    }

    Ok(StepOrchestrator::new(ctx))
}

pub async fn handle_init(args: &InitArgs) -> i32 {
    report(init(args).await)
}

async fn init(args: &InitArgs) -> Result<i32> {
    let config = load_config()?;
    let job = job_ref(&config, &args.collection, &args.document);

    let raw = tokio::fs::read_to_string(&args.analysis)
        .await
        .with_context(|| format!("Failed to read {}", args.analysis.display()))?;
    let analysis: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", args.analysis.display()))?;

    if let Some(source) = &args.upload {
        let key = normalize_path(&args.pdf)?;
        let target = config.blob_dir.join(&key);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::copy(source, &target)
            .await
            .with_context(|| format!("Failed to copy {} to {}", source.display(), target.display()))?;
        info!(blob = %key, "Uploaded blueprint");
    }

    let mut input = JobInput::new(args.pdf.clone(), analysis);
    if let Some(org) = args.organization.as_deref().filter(|o| !o.trim().is_empty()) {
        input = input.with_organization(org);
    }

    let store = JsonFileStore::new(&config.store_dir);
    store
        .create(&job, new_job_fields(&input)?)
        .await
        .with_context(|| format!("Failed to create job {}", job))?;

    println!("Created job {} at step 1", job);
    Ok(EXIT_SUCCESS)
}

pub async fn handle_run(args: &RunArgs) -> i32 {
    report(run(args).await)
}

async fn run(args: &RunArgs) -> Result<i32> {
    let mut config = load_config()?;
    if let Some(provider) = args.provider {
        config.provider = provider.as_str().to_lowercase();
    }
    if let Some(model) = &args.model {
        config.model = model.clone();
    }

    let job = job_ref(&config, &args.collection, &args.document);
    let orchestrator = build_orchestrator(&config)?;

    let mut request = StepRequest::new();
    if let Some(instructions) = &args.instructions {
        request = request.with_user_instructions(instructions.clone());
    }
    if let Some(org) = &args.organization {
        request = request.with_organization(org.clone());
    }

    let result = orchestrator.run_step(&job, args.step, &request).await;
    let formatter = OutputFormatter::new(args.format.into());
    print(formatter.format_step_result(&result)?);

    Ok(if result.is_success() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    })
}

pub async fn handle_status(args: &StatusArgs) -> i32 {
    report(status(args).await)
}

async fn status(args: &StatusArgs) -> Result<i32> {
    let config = load_config()?;
    let job = job_ref(&config, &args.collection, &args.document);
    let info = build_orchestrator(&config)?.current_step(&job).await?;
    print(OutputFormatter::new(args.format.into()).format_status(&info)?);
    Ok(EXIT_SUCCESS)
}

pub async fn handle_output(args: &OutputArgs) -> i32 {
    report(output(args).await)
}

async fn output(args: &OutputArgs) -> Result<i32> {
    let config = load_config()?;
    let job = job_ref(&config, &args.collection, &args.document);
    let value = build_orchestrator(&config)?
        .step_output(&job, args.step)
        .await?;
    print(OutputFormatter::new(args.format.into()).format_value(&value)?);
    Ok(EXIT_SUCCESS)
}

pub fn handle_price(args: &PriceArgs) -> i32 {
    let estimate = UnitPriceEstimator::default().estimate_traced(
        &args.name,
        &args.category,
        &args.material,
        &args.description,
    );
    report(
        OutputFormatter::new(args.format.into())
            .format_price(&args.name, &estimate)
            .map(|out| {
                print(out);
                EXIT_SUCCESS
            }),
    )
}

pub fn handle_config(args: &ConfigArgs) -> i32 {
    report(load_config().and_then(|config| {
        print(OutputFormatter::new(args.format.into()).format_config(&config)?);
        Ok(EXIT_SUCCESS)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_job_ref_falls_back_to_configured_collection() {
        env::remove_var("ESTIMATOR_COLLECTION");
        let config = EstimatorConfig::default();
        assert_eq!(job_ref(&config, &None, "d").collection, config.collection);
        assert_eq!(
            job_ref(&config, &Some("jobs".to_string()), "d").collection,
            "jobs"
        );
        assert_eq!(
            job_ref(&config, &Some("  ".to_string()), "d").collection,
            config.collection
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_init_then_status_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        env::set_var("ESTIMATOR_STORE_DIR", dir.path().join("store"));
        env::set_var("ESTIMATOR_BLOB_DIR", dir.path().join("blobs"));

        let analysis = dir.path().join("analysis.json");
        std::fs::write(&analysis, r#"{"pages": []}"#).unwrap();
        let pdf = dir.path().join("drawing.pdf");
        std::fs::write(&pdf, b"%PDF-1.4\n").unwrap();

        let args = InitArgs {
            document: "job-1".to_string(),
            pdf: "blueprints/job-1.pdf".to_string(),
            analysis,
            upload: Some(pdf),
            organization: Some("org-42".to_string()),
            collection: None,
        };
        assert_eq!(handle_init(&args).await, EXIT_SUCCESS);
        assert!(dir.path().join("blobs/blueprints/job-1.pdf").exists());

        // A second init of the same id is refused.
        assert_eq!(handle_init(&args).await, EXIT_FAILURE);

        let config = EstimatorConfig::default();
        let store = JsonFileStore::new(&config.store_dir);
        let document = store
            .get(&job_ref(&config, &None, "job-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(document.current_step_number(), Some(1));
        assert_eq!(document.organization_id(), Some("org-42"));

        env::remove_var("ESTIMATOR_STORE_DIR");
        env::remove_var("ESTIMATOR_BLOB_DIR");
    }
}
