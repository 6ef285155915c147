//! Topology planning module.
//!
//! This module turns an environment, a zone list and the protected-tier flag
//! into a [`TopologyPlan`]: the VPC block, tiered subnets, route tables,
//! gateways and gateway endpoints. It also derives resource names, stack
//! exports, plan fingerprints and diffs between two plans.

mod allocator;
mod diff;
mod environment;
mod hash;
mod naming;
mod plan;
mod planner;
mod types;

pub use allocator::{vpc_block, SubnetCursor, NETWORK_PREFIX, SUBNET_PREFIX_LEN, VPC_PREFIX_LEN};
pub use diff::{DiffDetail, DiffEngine, DiffResult, DiffType, ResourceDiff};
pub use environment::{Environment, EnvironmentParams};
pub use hash::PlanHasher;
pub use naming::{ExportRecord, NamedResource, ResourceNamer, StackOutputs};
pub use plan::{PrivateTier, ProtectedTier, PublicTier, Tiers, TopologyPlan};
pub use planner::{plan, TopologyPlanner};
pub use types::{
    AvailabilityZone, DefaultRoute, ElasticIpRecord, EndpointService, GatewayEndpointRecord,
    InternetGatewayRecord, LogicalId, NatGatewayRecord, RouteTableRecord, RouteTarget,
    SubnetRecord, SubnetTier,
};
