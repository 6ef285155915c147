//! The topology planner.
//!
//! Planning walks the tiers in a fixed order (public, protected, private) and
//! within each tier the zones in input order, handing out one `/24` per
//! (tier, zone) pair from a single running [`SubnetCursor`]. Because the cursor
//! only moves forward, no two subnets of a plan can share a block.

use std::collections::HashSet;
use tracing::{debug, info};

use crate::error::{Result, TopologyError};
use crate::network::AddressBlock;

use super::allocator::{vpc_block, SubnetCursor};
use super::environment::{Environment, EnvironmentParams};
use super::plan::{PrivateTier, ProtectedTier, PublicTier, Tiers, TopologyPlan};
use super::types::{
    AvailabilityZone, DefaultRoute, ElasticIpRecord, EndpointService, GatewayEndpointRecord,
    InternetGatewayRecord, LogicalId, NatGatewayRecord, RouteTableRecord, RouteTarget,
    SubnetRecord, SubnetTier,
};

/// Computes topology plans for one environment.
#[derive(Debug, Clone, Copy)]
pub struct TopologyPlanner {
    environment: Environment,
    params: EnvironmentParams,
}

/// Plans a topology with the reference parameters of `environment`.
///
/// # Errors
///
/// Returns [`TopologyError::InvalidTopologyInput`] if `zones` is empty,
/// contains duplicates, or needs more subnets than the VPC block holds.
pub fn plan(
    environment: Environment,
    zones: &[AvailabilityZone],
    create_protected_tier: bool,
) -> Result<TopologyPlan> {
    TopologyPlanner::new(environment).plan(zones, create_protected_tier)
}

impl TopologyPlanner {
    /// Creates a planner using the environment's reference parameters.
    #[must_use]
    pub const fn new(environment: Environment) -> Self {
        Self {
            environment,
            params: environment.params(),
        }
    }

    /// Creates a planner with explicit parameters.
    #[must_use]
    pub const fn with_params(environment: Environment, params: EnvironmentParams) -> Self {
        Self {
            environment,
            params,
        }
    }

    /// Returns the parameters this planner uses.
    #[must_use]
    pub const fn params(&self) -> EnvironmentParams {
        self.params
    }

    /// Computes the full plan. Nothing is returned unless every record fits.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvalidTopologyInput`] if `zones` is empty,
    /// contains duplicates, or needs more subnets than the VPC block holds.
    pub fn plan(
        &self,
        zones: &[AvailabilityZone],
        create_protected_tier: bool,
    ) -> Result<TopologyPlan> {
        validate_zones(zones)?;

        let vpc = vpc_block(self.params.base_offset)?;
        let cursor = SubnetCursor::start(self.params.base_offset);
        debug!(
            "Planning {} topology in {vpc} across {} zones (protected tier: {create_protected_tier})",
            self.environment,
            zones.len()
        );

        let (public, cursor) = plan_public_tier(zones, &vpc, cursor)?;

        let (protected, cursor) = if create_protected_tier {
            let (tier, cursor) = plan_protected_tier(zones, &public, &vpc, cursor)?;
            (Some(tier), cursor)
        } else {
            (None, cursor)
        };

        let (private, cursor) = plan_private_tier(zones, &vpc, cursor)?;
        let endpoints = plan_endpoints(&public, protected.as_ref());

        info!(
            "Planned {} subnets for {} in {vpc}",
            cursor.allocated(),
            self.environment
        );

        Ok(TopologyPlan {
            environment: self.environment,
            params: self.params,
            zones: zones.to_vec(),
            vpc_block: vpc,
            tiers: Tiers {
                public,
                protected,
                private,
            },
            endpoints,
        })
    }
}

/// Rejects zone lists that cannot yield one record per (tier, zone) pair.
fn validate_zones(zones: &[AvailabilityZone]) -> std::result::Result<(), TopologyError> {
    if zones.is_empty() {
        return Err(TopologyError::invalid_input(
            "at least one availability zone is required",
        ));
    }

    let mut seen = HashSet::with_capacity(zones.len());
    for zone in zones {
        if !seen.insert(zone) {
            return Err(TopologyError::invalid_input(format!(
                "availability zone '{zone}' is listed more than once"
            )));
        }
    }

    Ok(())
}

/// Allocates one subnet per zone for `tier`, advancing the cursor.
fn allocate_subnets(
    tier: SubnetTier,
    zones: &[AvailabilityZone],
    vpc: &AddressBlock,
    mut cursor: SubnetCursor,
    route_table: impl Fn(&AvailabilityZone) -> LogicalId,
) -> std::result::Result<(Vec<SubnetRecord>, SubnetCursor), TopologyError> {
    let mut subnets = Vec::with_capacity(zones.len());

    for zone in zones {
        let (block, next) = cursor.allocate(vpc)?;
        cursor = next;

        debug!("Allocated {block} to {tier} subnet in zone {zone}");
        subnets.push(SubnetRecord {
            id: LogicalId::subnet(tier, zone),
            tier,
            zone: zone.clone(),
            block,
            route_table: route_table(zone),
        });
    }

    Ok((subnets, cursor))
}

fn plan_public_tier(
    zones: &[AvailabilityZone],
    vpc: &AddressBlock,
    cursor: SubnetCursor,
) -> std::result::Result<(PublicTier, SubnetCursor), TopologyError> {
    let internet_gateway = InternetGatewayRecord {
        id: LogicalId::internet_gateway(),
    };
    let route_table = RouteTableRecord {
        id: LogicalId::route_table(SubnetTier::Public, None),
        tier: SubnetTier::Public,
        zone: None,
        default_route: Some(DefaultRoute::to(RouteTarget::InternetGateway(
            internet_gateway.id.clone(),
        ))),
    };

    let (subnets, cursor) =
        allocate_subnets(SubnetTier::Public, zones, vpc, cursor, |_| route_table.id.clone())?;

    Ok((
        PublicTier {
            internet_gateway,
            route_table,
            subnets,
        },
        cursor,
    ))
}

/// Plans the protected tier around a single NAT gateway.
///
/// The gateway sits in the first zone's public subnet; every zone still gets
/// its own route table so per-zone gateways can be introduced without
/// re-associating subnets.
fn plan_protected_tier(
    zones: &[AvailabilityZone],
    public: &PublicTier,
    vpc: &AddressBlock,
    cursor: SubnetCursor,
) -> std::result::Result<(ProtectedTier, SubnetCursor), TopologyError> {
    let anchor = public.subnets.first().ok_or_else(|| {
        TopologyError::invalid_input("protected tier requires a public subnet to host the NAT gateway")
    })?;

    let elastic_ip = ElasticIpRecord {
        id: LogicalId::nat_elastic_ip(&anchor.zone),
        zone: anchor.zone.clone(),
    };
    let nat_gateway = NatGatewayRecord {
        id: LogicalId::nat_gateway(&anchor.zone),
        zone: anchor.zone.clone(),
        subnet: anchor.id.clone(),
        elastic_ip: elastic_ip.id.clone(),
    };

    let route_tables = zones
        .iter()
        .map(|zone| RouteTableRecord {
            id: LogicalId::route_table(SubnetTier::Protected, Some(zone)),
            tier: SubnetTier::Protected,
            zone: Some(zone.clone()),
            default_route: Some(DefaultRoute::to(RouteTarget::NatGateway(
                nat_gateway.id.clone(),
            ))),
        })
        .collect();

    let (subnets, cursor) = allocate_subnets(SubnetTier::Protected, zones, vpc, cursor, |zone| {
        LogicalId::route_table(SubnetTier::Protected, Some(zone))
    })?;

    Ok((
        ProtectedTier {
            elastic_ip,
            nat_gateway,
            route_tables,
            subnets,
        },
        cursor,
    ))
}

fn plan_private_tier(
    zones: &[AvailabilityZone],
    vpc: &AddressBlock,
    cursor: SubnetCursor,
) -> std::result::Result<(PrivateTier, SubnetCursor), TopologyError> {
    let route_table = RouteTableRecord {
        id: LogicalId::route_table(SubnetTier::Private, None),
        tier: SubnetTier::Private,
        zone: None,
        default_route: None,
    };

    let (subnets, cursor) =
        allocate_subnets(SubnetTier::Private, zones, vpc, cursor, |_| route_table.id.clone())?;

    Ok((
        PrivateTier {
            route_table,
            subnets,
        },
        cursor,
    ))
}

/// Associates each gateway endpoint with the public and protected subnets.
fn plan_endpoints(
    public: &PublicTier,
    protected: Option<&ProtectedTier>,
) -> Vec<GatewayEndpointRecord> {
    let associated: Vec<LogicalId> = public
        .subnets
        .iter()
        .chain(protected.into_iter().flat_map(|tier| tier.subnets.iter()))
        .map(|subnet| subnet.id.clone())
        .collect();

    EndpointService::ALL
        .into_iter()
        .map(|service| GatewayEndpointRecord {
            id: LogicalId::gateway_endpoint(service),
            service,
            subnets: associated.clone(),
        })
        .collect()
}
