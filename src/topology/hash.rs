//! Plan fingerprinting for change detection.
//!
//! A fingerprint covers every field that affects provisioning, fed to the
//! hasher in allocation order, so two plans share a fingerprint exactly when
//! they would provision the same topology.

use sha2::{Digest, Sha256};

use super::plan::TopologyPlan;
use super::types::{RouteTableRecord, RouteTarget};

/// Hasher for computing plan fingerprints.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlanHasher;

impl PlanHasher {
    /// Creates a new plan hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the hex-encoded SHA-256 fingerprint of a plan.
    #[must_use]
    pub fn fingerprint(&self, plan: &TopologyPlan) -> String {
        let mut hasher = Sha256::new();

        hasher.update(plan.environment.name().as_bytes());
        hasher.update([plan.params.base_offset]);
        hasher.update(plan.vpc_block.to_string().as_bytes());

        for zone in &plan.zones {
            hasher.update(zone.as_str().as_bytes());
            hasher.update([0u8]);
        }

        for subnet in plan.subnets() {
            hasher.update(subnet.id.as_str().as_bytes());
            hasher.update(subnet.block.to_string().as_bytes());
            hasher.update(subnet.route_table.as_str().as_bytes());
        }

        for table in plan.route_tables() {
            Self::hash_route_table(&mut hasher, table);
        }

        if let Some(nat) = plan.nat_gateway() {
            hasher.update(nat.id.as_str().as_bytes());
            hasher.update(nat.subnet.as_str().as_bytes());
            hasher.update(nat.elastic_ip.as_str().as_bytes());
        }

        for endpoint in &plan.endpoints {
            hasher.update(endpoint.id.as_str().as_bytes());
            for subnet in &endpoint.subnets {
                hasher.update(subnet.as_str().as_bytes());
            }
        }

        hex::encode(hasher.finalize())
    }

    fn hash_route_table(hasher: &mut Sha256, table: &RouteTableRecord) {
        hasher.update(table.id.as_str().as_bytes());
        match table.default_route.as_ref().map(|r| &r.target) {
            Some(RouteTarget::InternetGateway(id)) => {
                hasher.update(b"igw");
                hasher.update(id.as_str().as_bytes());
            }
            Some(RouteTarget::NatGateway(id)) => {
                hasher.update(b"nat");
                hasher.update(id.as_str().as_bytes());
            }
            None => hasher.update(b"isolated"),
        }
    }

    /// Computes a short hash (first 8 characters) for display purposes.
    #[must_use]
    pub fn short_hash(&self, hash: &str) -> String {
        hash.chars().take(8).collect()
    }
}
