//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use multiver::TargetVersionKey;

/// Multiver - build one project against many host platform versions
#[derive(Parser)]
#[command(name = "multiver")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to Multiver.toml (defaults to searching upward from the current directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub manifest_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a single target
    Build(BuildArgs),

    /// Reset, then build every registered target in registry order
    BuildAll(BuildAllArgs),

    /// Remove all build state and multi-target output
    Clean(CleanArgs),

    /// List registered targets
    Targets(TargetsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Target version to build
    #[arg(long, short)]
    pub target: TargetVersionKey,

    /// Override the mapping id for this build
    #[arg(long)]
    pub mapping_id: Option<String>,

    /// Override the companion framework version for this build
    #[arg(long)]
    pub companion_version: Option<String>,

    #[command(flatten)]
    pub optional: OptionalDepArgs,

    /// Print the build plan as JSON (no build)
    #[arg(long)]
    pub plan: bool,
}

#[derive(Args)]
pub struct BuildAllArgs {
    /// Keep building remaining targets after a failure
    #[arg(long, overrides_with = "fail_fast")]
    pub continue_on_error: bool,

    /// Stop at the first failed target, even if configured otherwise
    #[arg(long, overrides_with = "continue_on_error")]
    pub fail_fast: bool,

    #[command(flatten)]
    pub optional: OptionalDepArgs,

    /// Output format for build events
    #[arg(long, value_enum)]
    pub message_format: Option<MessageFormat>,
}

/// Optional companion dependency flags.
#[derive(Args)]
pub struct OptionalDepArgs {
    /// Explicit path to the optional dependency
    #[arg(long, value_name = "PATH")]
    pub optional_dep: Option<PathBuf>,

    /// Link the optional dependency at run time on compatible targets
    #[arg(long, overrides_with = "no_runtime_link")]
    pub runtime_link: bool,

    /// Never link the optional dependency at run time, even if configured
    #[arg(long, overrides_with = "runtime_link")]
    pub no_runtime_link: bool,
}

impl OptionalDepArgs {
    /// Runtime-link choice from the flags, if one was made.
    pub fn runtime_link(&self) -> Option<bool> {
        if self.runtime_link {
            Some(true)
        } else if self.no_runtime_link {
            Some(false)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    Human,
    Json,
}

#[derive(Args)]
pub struct CleanArgs {}

#[derive(Args)]
pub struct TargetsArgs {
    /// Print the registry as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
