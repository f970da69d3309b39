use crate::llm::{parse_provider, AdapterKind};
use crate::pricing::FALLBACK_CATEGORY;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Step-by-step cost estimation for CAD blueprints
#[derive(Parser, Debug)]
#[command(
    name = "blueprint-estimator",
    about = "Step-by-step cost estimation for CAD blueprints",
    version,
    author,
    long_about = "blueprint-estimator turns a CAD blueprint and its pre-analysis into a priced \
                  estimate in four confirmed steps: blueprint acquisition, product \
                  identification, parts breakdown and estimate document generation. Each \
                  invocation runs exactly one step and persists its output on the job document."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - only log errors"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Create a job document",
        long_about = "Creates a job document pointing at a blueprint and its pre-analysis JSON. \
                      The job starts at step 1.\n\n\
                      Examples:\n  \
                      blueprint-estimator init --document job-1 --pdf blueprints/job-1.pdf --analysis analysis.json\n  \
                      blueprint-estimator init --document job-1 --pdf blueprints/job-1.pdf --analysis analysis.json \\\n      \
                      --upload ./drawing.pdf --organization org-42"
    )]
    Init(InitArgs),

    #[command(
        about = "Run one pipeline step",
        long_about = "Runs exactly one step of a job. The next step is only run by a separate \
                      invocation, after the previous result has been reviewed.\n\n\
                      Examples:\n  \
                      blueprint-estimator run --step 1 --document job-1\n  \
                      blueprint-estimator run --step 3 --document job-1 --instructions \"金属部品は大型で見積もる\"\n  \
                      blueprint-estimator run --step 2 --document job-1 --provider openai --model gpt-4o --format json"
    )]
    Run(RunArgs),

    #[command(
        about = "Show where a job stands",
        long_about = "Prints the job's current step pointer and completion flag.\n\n\
                      Examples:\n  \
                      blueprint-estimator status --document job-1"
    )]
    Status(StatusArgs),

    #[command(
        about = "Print a persisted step output",
        long_about = "Prints the output a step persisted on the job document.\n\n\
                      Examples:\n  \
                      blueprint-estimator output --step 3 --document job-1 --format yaml"
    )]
    Output(OutputArgs),

    #[command(
        about = "Look up a unit price",
        long_about = "Looks up the unit price the pricing database gives a part, with the \
                      category, part type and size tier that produced it. No job or LLM is \
                      involved.\n\n\
                      Examples:\n  \
                      blueprint-estimator price --name フレーム --category 金属部品\n  \
                      blueprint-estimator price --name アクリル板 --category ガラス・アクリル --material 厚い"
    )]
    Price(PriceArgs),

    #[command(
        about = "Show the effective configuration",
        long_about = "Prints the configuration resolved from ESTIMATOR_* environment variables \
                      and defaults, after validation.\n\n\
                      Examples:\n  \
                      blueprint-estimator config --format yaml"
    )]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    #[arg(short = 'd', long, value_name = "ID", help = "Job document id")]
    pub document: String,

    #[arg(long, value_name = "PATH", help = "Blueprint path in the blob store")]
    pub pdf: String,

    #[arg(long, value_name = "FILE", help = "Pre-analysis JSON file")]
    pub analysis: PathBuf,

    #[arg(
        long,
        value_name = "FILE",
        help = "Copy a local blueprint file into the blob store at --pdf"
    )]
    pub upload: Option<PathBuf>,

    #[arg(long, value_name = "ORG", help = "Organization the estimate belongs to")]
    pub organization: Option<String>,

    #[arg(
        short = 'c',
        long,
        value_name = "COLLECTION",
        help = "Job collection (defaults to ESTIMATOR_COLLECTION)"
    )]
    pub collection: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    #[arg(short = 's', long, value_name = "N", help = "Step to run (1-4)")]
    pub step: i64,

    #[arg(short = 'd', long, value_name = "ID", help = "Job document id")]
    pub document: String,

    #[arg(
        short = 'c',
        long,
        value_name = "COLLECTION",
        help = "Job collection (defaults to ESTIMATOR_COLLECTION)"
    )]
    pub collection: Option<String>,

    #[arg(
        short = 'i',
        long,
        value_name = "TEXT",
        help = "Free-text instructions for the LLM prompt"
    )]
    pub instructions: Option<String>,

    #[arg(
        long,
        value_name = "ORG",
        help = "Organization for step 4 (overrides input.organizationId)"
    )]
    pub organization: Option<String>,

    #[arg(
        short = 'p',
        long,
        value_parser = parse_adapter_kind,
        help = "LLM provider (overrides ESTIMATOR_PROVIDER)"
    )]
    pub provider: Option<AdapterKind>,

    #[arg(
        short = 'm',
        long,
        value_name = "MODEL",
        help = "Model name (overrides ESTIMATOR_MODEL)"
    )]
    pub model: Option<String>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct StatusArgs {
    #[arg(short = 'd', long, value_name = "ID", help = "Job document id")]
    pub document: String,

    #[arg(short = 'c', long, value_name = "COLLECTION", help = "Job collection")]
    pub collection: Option<String>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct OutputArgs {
    #[arg(short = 's', long, value_name = "N", help = "Step whose output to print (1-4)")]
    pub step: i64,

    #[arg(short = 'd', long, value_name = "ID", help = "Job document id")]
    pub document: String,

    #[arg(short = 'c', long, value_name = "COLLECTION", help = "Job collection")]
    pub collection: Option<String>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "json",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct PriceArgs {
    #[arg(short = 'n', long, value_name = "NAME", help = "Part name")]
    pub name: String,

    #[arg(long, value_name = "CATEGORY", default_value = FALLBACK_CATEGORY, help = "Part category")]
    pub category: String,

    #[arg(long, value_name = "MATERIAL", default_value = "", help = "Material")]
    pub material: String,

    #[arg(long, value_name = "TEXT", default_value = "", help = "Free-text description")]
    pub description: String,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

fn parse_adapter_kind(s: &str) -> Result<AdapterKind, String> {
    parse_provider(s).ok_or_else(|| {
        format!(
            "Invalid provider: {}. Valid options: gemini, openai, anthropic, ollama, xai, groq",
            s
        )
    })
}
