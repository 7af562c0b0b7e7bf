//! DBO dataset validator CLI.

use clap::{ColorChoice, Parser};
use dbo_cli::logging::{LogConfig, LogFormat, init_logging};
use serde_json::json;
use std::io::{self, IsTerminal};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{run_interpret, run_validate};
use crate::summary::{print_interpretation, print_validation};
use dbo_validate::ValidationStatus;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match &cli.command {
        Command::Interpret(args) => match run_interpret(args) {
            Ok(output) => {
                if args.json {
                    let payload = json!({
                        "rules": output.outcome.descriptors,
                        "conflicts": output.outcome.conflicts,
                    });
                    println!("{}", serde_json::to_string_pretty(&payload).expect("serialize rules"));
                } else {
                    print_interpretation(&output);
                }
                0
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
        Command::Validate(args) => match run_validate(args) {
            Ok(output) => {
                if args.json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&output.report).expect("serialize report")
                    );
                } else {
                    print_validation(&output.report);
                }
                match output.report.status {
                    ValidationStatus::Pass => 0,
                    ValidationStatus::Fail => 1,
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
    };
    std::process::exit(exit_code);
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
