// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ephemera::output::OutputMode;
use ephemera::types::{PrNumber, RepoSlug};

#[derive(Parser)]
#[command(name = "ephemera")]
#[command(about = "Ephemeral per-pull-request preview environments for Kubernetes")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print only the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Emit JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new ephemera.yml configuration file
    Init {
        /// Registry namespace images are pushed under
        #[arg(short, long)]
        registry: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the build plans for a local checkout without building anything
    Plan {
        /// Checkout to classify
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Repository the checkout belongs to (owner/name)
        #[arg(long, value_parser = RepoSlug::parse)]
        repo: RepoSlug,

        /// Pull request number used for image tags
        #[arg(long)]
        pr: PrNumber,
    },

    /// Build and deploy a preview environment for a pull request
    Create {
        /// Repository URL (https://host/owner/name)
        repo_url: String,

        /// Pull request number
        #[arg(long)]
        pr: PrNumber,

        /// Access token for private repositories, overrides the configured token
        #[arg(long, env = "EPHEMERA_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Remove every preview environment of a pull request
    Delete {
        /// Pull request number
        #[arg(long)]
        pr: PrNumber,
    },
}
