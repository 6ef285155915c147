//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::error::TopologyError;
use crate::topology::AvailabilityZone;

/// vpcplan - Deterministic VPC topology planner.
#[derive(Parser, Debug)]
#[command(name = "vpcplan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true, env = "VPCPLAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Target environment (development, staging, production).
    ///
    /// Without this flag, `ENV_NAME` is read from the process environment
    /// and then from the project's `.env`.
    #[arg(short, long, global = true, env = "ENV_NAME")]
    pub env: Option<String>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new vpcplan project.
    Init {
        /// Directory to initialize (defaults to current directory).
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Force overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },

    /// Validate the planner configuration.
    Validate {
        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },

    /// Compute and display the topology plan.
    Plan {
        /// Planner input overrides.
        #[command(flatten)]
        inputs: PlanInputs,

        /// Record the plan in the state backend.
        #[arg(short, long)]
        save: bool,

        /// Show route tables, gateways and endpoints as well as subnets.
        #[arg(short, long)]
        detailed: bool,
    },

    /// Compare the recorded plan with a freshly computed one.
    Diff {
        /// Planner input overrides.
        #[command(flatten)]
        inputs: PlanInputs,
    },

    /// List the stack exports of the plan.
    Outputs {
        /// Stack identifier used in export names.
        #[arg(long, default_value = "VpcStack")]
        stack_id: String,

        /// Planner input overrides.
        #[command(flatten)]
        inputs: PlanInputs,
    },

    /// Manage the state backend.
    State {
        /// State subcommand.
        #[command(subcommand)]
        command: StateCommands,
    },
}

/// Overrides applied on top of the configuration for one run.
#[derive(Args, Debug, Default, Clone)]
pub struct PlanInputs {
    /// Plan the NAT-routed protected tier regardless of configuration.
    #[arg(long)]
    pub protected: bool,

    /// Comma-separated zone suffixes, e.g. `a,c,d`.
    #[arg(long)]
    pub zones: Option<String>,
}

/// State management subcommands.
#[derive(Subcommand, Debug)]
pub enum StateCommands {
    /// Show current state.
    Show,

    /// Lock the state.
    Lock {
        /// Lock holder identifier.
        #[arg(long)]
        holder: Option<String>,
    },

    /// Unlock the state.
    Unlock {
        /// Lock ID to unlock.
        #[arg(long)]
        lock_id: Option<String>,

        /// Remove the lock whoever holds it.
        #[arg(long)]
        force: bool,
    },

    /// Discard the recorded plan, keeping the history.
    Discard,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl PlanInputs {
    /// Parses the `--zones` override, if given.
    ///
    /// # Errors
    ///
    /// Returns an error if any entry is not a valid zone suffix.
    pub fn zones(&self) -> Result<Option<Vec<AvailabilityZone>>, TopologyError> {
        self.zones
            .as_deref()
            .map(AvailabilityZone::parse_list)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plan_command() {
        let cli = Cli::try_parse_from([
            "vpcplan", "--env", "staging", "plan", "--save", "--protected", "--zones", "a,c",
        ])
        .expect("valid args");

        assert_eq!(cli.env.as_deref(), Some("staging"));
        match cli.command {
            Commands::Plan { inputs, save, detailed } => {
                assert!(save);
                assert!(!detailed);
                assert!(inputs.protected);
                let zones = inputs.zones().expect("zones").expect("override");
                assert_eq!(zones.len(), 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_env_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["vpcplan", "diff", "--env", "production"]).expect("valid args");
        assert_eq!(cli.env.as_deref(), Some("production"));
    }

    #[test]
    fn test_outputs_default_stack_id() {
        let cli = Cli::try_parse_from(["vpcplan", "outputs"]).expect("valid args");
        match cli.command {
            Commands::Outputs { stack_id, inputs } => {
                assert_eq!(stack_id, "VpcStack");
                assert!(inputs.zones().expect("zones").is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
