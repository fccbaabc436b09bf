mod agents;
mod catalog;
mod cli;
mod config;
mod error;
mod utils;
mod workflow;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use config::Config;
use error::Result;
use std::process;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use workflow::UpdateOptions;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Update {
            root,
            filter,
            platform_version,
            fail_fast,
        } => {
            let mut options = UpdateOptions::from_config(&config);
            if let Some(root) = root {
                options.plugin_root = shellexpand::tilde(&root).into_owned().into();
            }
            if let Some(filter) = filter {
                options.directory_filter = filter;
            }
            options.platform_version = platform_version
                .as_deref()
                .map(catalog::Version::parse)
                .transpose()?;
            options.fail_fast = fail_fast;

            workflow::execute_update(&config, &options)
        }
        Commands::Latest => workflow::execute_latest(&config),
        Commands::NextVersion {
            plugin,
            current_platform,
            new_platform,
        } => workflow::execute_next_version(&plugin, &current_platform, &new_platform),
    }
}
