//! CLI module for the vpcplan tool.
//!
//! This module provides the command-line interface for computing,
//! recording and comparing topology plans.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat, PlanInputs, StateCommands};
pub use output::OutputFormatter;
