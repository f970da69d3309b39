pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{
    CliArgs, Commands, ConfigArgs, InitArgs, OutputArgs, PriceArgs, RunArgs, StatusArgs,
};
pub use output::{OutputFormat, OutputFormatter};
