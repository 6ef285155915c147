// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # vpcplan
//!
//! A deterministic planner for tiered VPC network topologies.
//!
//! ## Overview
//!
//! Given an environment, a list of availability zones and whether a
//! NAT-routed protected tier is wanted, vpcplan computes the complete network
//! layout before anything is provisioned:
//!
//! - A `/19` VPC block at a fixed, per-environment offset
//! - One `/24` subnet per (tier, zone), allocated sequentially
//! - Route tables, the internet gateway, a NAT gateway and its elastic IP
//! - `DynamoDB` and `S3` gateway endpoints on the non-private subnets
//!
//! The same inputs always produce the same plan, so a plan can be recorded,
//! fingerprinted and diffed against later runs.
//!
//! ## Modules
//!
//! - [`topology`]: Planner, allocation, naming, fingerprints and diffs
//! - [`network`]: IPv4 address blocks
//! - [`config`]: Configuration parsing and validation
//! - [`state`]: Recorded plan storage backends (local, S3)
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```
//! use vpcplan::topology::{plan, AvailabilityZone, Environment};
//!
//! let zones = AvailabilityZone::parse_list("a,c,d")?;
//! let plan = plan(Environment::Development, &zones, false)?;
//!
//! assert_eq!(plan.vpc_block.to_string(), "10.1.64.0/19");
//! assert_eq!(plan.subnet_count(), 6);
//! # Ok::<(), vpcplan::VpcPlanError>(())
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod error;
pub mod network;
pub mod state;
pub mod topology;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, ConfigValidator, PlannerConfig, Project};
pub use error::{Result, TopologyError, VpcPlanError};
pub use network::AddressBlock;
pub use state::{LocalStateStore, PlanState, S3StateStore, StateStore};
pub use topology::{
    plan, DiffEngine, Environment, PlanHasher, ResourceNamer, StackOutputs, TopologyPlan,
    TopologyPlanner,
};
