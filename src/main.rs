use blueprint_estimator::cli::commands::{CliArgs, Commands};
use blueprint_estimator::cli::handlers::{
    handle_config, handle_init, handle_output, handle_price, handle_run, handle_status,
};
use blueprint_estimator::util::logging::{init_logging, parse_level, LoggingConfig};
use blueprint_estimator::VERSION;

use clap::Parser;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("blueprint-estimator v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Init(init_args) => handle_init(init_args).await,
        Commands::Run(run_args) => handle_run(run_args).await,
        Commands::Status(status_args) => handle_status(status_args).await,
        Commands::Output(output_args) => handle_output(output_args).await,
        Commands::Price(price_args) => handle_price(price_args),
        Commands::Config(config_args) => handle_config(config_args),
    };

    std::process::exit(exit_code);
}

/// `--log-level` wins, then `-v`, then `-q`, then `ESTIMATOR_LOG_LEVEL`.
fn init_logging_from_args(args: &CliArgs) {
    let mut config = LoggingConfig::from_env();
    config.level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        config.level
    };
    init_logging(config);
}
