mod assembler;
mod chart;
mod cli;
mod commands;
mod config;
mod error;
mod format;
mod mcp;
mod normalize;
mod output;
mod palette;
mod refresh;
mod series;
mod source;

use clap::Parser;
use tracing_subscriber::{EnvFilter, util::SubscriberInitExt};

use cli::{Cli, Commands};
use commands::render::{Overrides, run_render};
use config::Config;
use error::StatsError;
use format::{format_bytes, format_duration};
use mcp::server::run_mcp_server;
use output::print_dashboard;
use refresh::Dashboard;

/// Environment variable holding the log filter, e.g. `MEDIASTATS_LOG=debug`.
const LOG_ENV: &str = "MEDIASTATS_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish()
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if cli.mcp {
        run_mcp_server();
        return;
    }

    let result = match cli.command {
        Some(Commands::Render {
            directory,
            json,
            seed,
            config,
            percentages,
            codec_top,
            keep_duplicates,
        }) => {
            let overrides = Overrides {
                percentage_labels: percentages,
                codec_top_n: codec_top,
                keep_duplicates,
            };
            render(&directory, json, seed, config.as_deref(), &overrides)
        }

        Some(Commands::Bytes { bytes, decimals }) => {
            format_bytes(bytes, decimals).map(|text| println!("{text}"))
        }

        Some(Commands::Duration { ms }) => {
            println!("{}", format_duration(ms));
            Ok(())
        }

        None => {
            eprintln!("No command specified. Use --help for usage information.");
            std::process::exit(1);
        }
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn render(
    directory: &str,
    json: bool,
    seed: Option<u64>,
    config_path: Option<&std::path::Path>,
    overrides: &Overrides,
) -> Result<(), StatsError> {
    let mut config = Config::load(config_path)?;
    overrides.apply(&mut config);

    let mut dashboard = Dashboard::new();
    run_render(&mut dashboard, directory, &config, seed)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
    } else {
        print_dashboard(&dashboard);
    }
    Ok(())
}
