//! The finished topology plan handed to the provisioning layer.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::network::AddressBlock;

use super::environment::{Environment, EnvironmentParams};
use super::types::{
    AvailabilityZone, ElasticIpRecord, GatewayEndpointRecord, InternetGatewayRecord, LogicalId,
    NatGatewayRecord, RouteTableRecord, SubnetRecord, SubnetTier,
};

/// A complete, immutable topology plan for one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyPlan {
    /// Environment the plan was computed for.
    pub environment: Environment,
    /// Parameters used for the computation.
    pub params: EnvironmentParams,
    /// Zones in input order.
    pub zones: Vec<AvailabilityZone>,
    /// The VPC's `/19` block.
    pub vpc_block: AddressBlock,
    /// Per-tier records.
    pub tiers: Tiers,
    /// Gateway endpoints.
    pub endpoints: Vec<GatewayEndpointRecord>,
}

/// Per-tier records. The protected tier is `None` when it was not requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tiers {
    /// Public tier.
    pub public: PublicTier,
    /// Protected tier, if requested.
    pub protected: Option<ProtectedTier>,
    /// Private tier.
    pub private: PrivateTier,
}

/// Public subnets routed to the internet gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicTier {
    /// The internet gateway.
    pub internet_gateway: InternetGatewayRecord,
    /// The single public route table.
    pub route_table: RouteTableRecord,
    /// One subnet per zone.
    pub subnets: Vec<SubnetRecord>,
}

/// Protected subnets routed to the shared NAT gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedTier {
    /// Elastic IP of the NAT gateway.
    pub elastic_ip: ElasticIpRecord,
    /// The NAT gateway, anchored in the first zone's public subnet.
    pub nat_gateway: NatGatewayRecord,
    /// One route table per zone.
    pub route_tables: Vec<RouteTableRecord>,
    /// One subnet per zone.
    pub subnets: Vec<SubnetRecord>,
}

/// Private subnets without a default route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateTier {
    /// The single private route table.
    pub route_table: RouteTableRecord,
    /// One subnet per zone.
    pub subnets: Vec<SubnetRecord>,
}

impl TopologyPlan {
    /// Returns every subnet in allocation order.
    pub fn subnets(&self) -> impl Iterator<Item = &SubnetRecord> + '_ {
        let protected = self
            .tiers
            .protected
            .iter()
            .flat_map(|tier| tier.subnets.iter());

        self.tiers
            .public
            .subnets
            .iter()
            .chain(protected)
            .chain(self.tiers.private.subnets.iter())
    }

    /// Returns every route table, public first.
    pub fn route_tables(&self) -> impl Iterator<Item = &RouteTableRecord> + '_ {
        let protected = self
            .tiers
            .protected
            .iter()
            .flat_map(|tier| tier.route_tables.iter());

        std::iter::once(&self.tiers.public.route_table)
            .chain(protected)
            .chain(std::iter::once(&self.tiers.private.route_table))
    }

    /// Returns the subnets of one tier (empty for an absent protected tier).
    #[must_use]
    pub fn tier_subnets(&self, tier: SubnetTier) -> &[SubnetRecord] {
        match tier {
            SubnetTier::Public => &self.tiers.public.subnets,
            SubnetTier::Protected => self
                .tiers
                .protected
                .as_ref()
                .map_or(&[][..], |t| t.subnets.as_slice()),
            SubnetTier::Private => &self.tiers.private.subnets,
        }
    }

    /// Looks up the subnet for a (tier, zone) pair.
    #[must_use]
    pub fn subnet(&self, tier: SubnetTier, zone: &AvailabilityZone) -> Option<&SubnetRecord> {
        self.tier_subnets(tier).iter().find(|s| &s.zone == zone)
    }

    /// Looks up a route table by logical id.
    #[must_use]
    pub fn route_table(&self, id: &LogicalId) -> Option<&RouteTableRecord> {
        self.route_tables().find(|rt| &rt.id == id)
    }

    /// Returns the NAT gateway, if the protected tier exists.
    #[must_use]
    pub fn nat_gateway(&self) -> Option<&NatGatewayRecord> {
        self.tiers.protected.as_ref().map(|t| &t.nat_gateway)
    }

    /// Returns true if the protected tier was planned.
    #[must_use]
    pub const fn has_protected_tier(&self) -> bool {
        self.tiers.protected.is_some()
    }

    /// Returns the number of planned subnets.
    #[must_use]
    pub fn subnet_count(&self) -> usize {
        self.subnets().count()
    }
}

impl fmt::Display for TopologyPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Topology Plan ({}, VPC {}, {} subnets):",
            self.environment,
            self.vpc_block,
            self.subnet_count()
        )?;
        for subnet in self.subnets() {
            writeln!(
                f,
                "  {} {} {} -> {}",
                subnet.id, subnet.zone, subnet.block, subnet.route_table
            )?;
        }
        for table in self.route_tables() {
            match &table.default_route {
                Some(route) => writeln!(f, "  {} {} -> {}", table.id, route.destination, route.target)?,
                None => writeln!(f, "  {} (no default route)", table.id)?,
            }
        }
        Ok(())
    }
}
