use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ij-bump",
    about = "Upgrade IntelliJ platform plugin projects to the latest IntelliJ release",
    version,
    author
)]
pub struct Cli {
    /// Configuration file (defaults to ./ij-bump.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Update every matching plugin project to the newest platform release
    Update {
        /// Directory containing the plugin projects (overrides plugin_root)
        #[arg(short, long, value_name = "DIR")]
        root: Option<String>,

        /// Only update subdirectories whose name contains this text
        #[arg(short, long, value_name = "TEXT")]
        filter: Option<String>,

        /// Target this platform version instead of querying JetBrains
        #[arg(long, value_name = "VERSION")]
        platform_version: Option<String>,

        /// Stop at the first project that fails
        #[arg(long)]
        fail_fast: bool,
    },

    /// Print the newest platform release published by JetBrains
    Latest,

    /// Compute the next plugin version for a platform change
    NextVersion {
        /// Current plugin version (e.g. 0.2.6)
        plugin: String,

        /// Platform version the plugin currently targets
        current_platform: String,

        /// Platform version to move to
        new_platform: String,
    },
}
