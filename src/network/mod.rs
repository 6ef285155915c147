//! Network primitives shared by the planner.
//!
//! This module provides the IPv4 CIDR value type used for every VPC and
//! subnet block the planner hands out.

mod block;

pub use block::{AddressBlock, MAX_PREFIX_LEN};
