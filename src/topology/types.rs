//! Record types produced by a planning pass.
//!
//! Every record is created exactly once while planning and never mutated
//! afterwards. Records reference each other through [`LogicalId`]s, which the
//! provisioning layer maps onto real resource identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TopologyError;
use crate::network::AddressBlock;

/// An availability zone suffix such as `a`, `c` or `d`.
///
/// The suffix is opaque to the planner; only its position in the zone list
/// matters for address numbering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AvailabilityZone(String);

/// Subnet tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubnetTier {
    /// Internet-routable through the internet gateway.
    Public,
    /// Outbound-only through the NAT gateway.
    Protected,
    /// No internet route.
    Private,
}

/// Stable logical identifier of a planned resource (e.g. `SubnetPublicA`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicalId(String);

/// A planned subnet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetRecord {
    /// Logical identifier.
    pub id: LogicalId,
    /// Tier the subnet belongs to.
    pub tier: SubnetTier,
    /// Availability zone.
    pub zone: AvailabilityZone,
    /// Assigned `/24` block.
    pub block: AddressBlock,
    /// Route table the subnet is associated with.
    pub route_table: LogicalId,
}

/// Where a default route sends traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "gateway", rename_all = "snake_case")]
pub enum RouteTarget {
    /// The VPC's internet gateway.
    InternetGateway(LogicalId),
    /// A NAT gateway.
    NatGateway(LogicalId),
}

/// A `0.0.0.0/0` route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultRoute {
    /// Destination block, always [`AddressBlock::ANY`].
    pub destination: AddressBlock,
    /// Gateway the route points at.
    pub target: RouteTarget,
}

/// A planned route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTableRecord {
    /// Logical identifier.
    pub id: LogicalId,
    /// Tier served by this table.
    pub tier: SubnetTier,
    /// Zone, for per-zone tables.
    pub zone: Option<AvailabilityZone>,
    /// Default route, `None` for isolated tables.
    pub default_route: Option<DefaultRoute>,
}

/// The VPC's internet gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternetGatewayRecord {
    /// Logical identifier.
    pub id: LogicalId,
}

/// Elastic IP backing a NAT gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElasticIpRecord {
    /// Logical identifier.
    pub id: LogicalId,
    /// Zone of the NAT gateway using it.
    pub zone: AvailabilityZone,
}

/// A NAT gateway placed in a public subnet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NatGatewayRecord {
    /// Logical identifier.
    pub id: LogicalId,
    /// Zone the gateway lives in.
    pub zone: AvailabilityZone,
    /// Public subnet hosting the gateway.
    pub subnet: LogicalId,
    /// Elastic IP allocation.
    pub elastic_ip: LogicalId,
}

/// Services reachable through a gateway endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndpointService {
    /// Key-value database service.
    DynamoDb,
    /// Object storage service.
    S3,
}

/// A gateway endpoint and the subnets associated with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayEndpointRecord {
    /// Logical identifier.
    pub id: LogicalId,
    /// Target service.
    pub service: EndpointService,
    /// Associated subnets.
    pub subnets: Vec<LogicalId>,
}

impl AvailabilityZone {
    /// Creates a zone suffix.
    ///
    /// # Errors
    ///
    /// Returns an error unless the suffix is non-empty lowercase ASCII
    /// alphanumeric.
    pub fn new(suffix: impl Into<String>) -> Result<Self, TopologyError> {
        let suffix = suffix.into();
        let valid = !suffix.is_empty()
            && suffix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());

        if valid {
            Ok(Self(suffix))
        } else {
            Err(TopologyError::invalid_input(format!(
                "invalid availability zone '{suffix}': expected a lowercase suffix such as 'a'"
            )))
        }
    }

    /// Parses a comma-separated zone list such as `a,c,d`.
    ///
    /// # Errors
    ///
    /// Returns an error if any entry is not a valid zone suffix.
    pub fn parse_list(list: &str) -> Result<Vec<Self>, TopologyError> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::new)
            .collect()
    }

    /// Returns the suffix.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the suffix in upper case, as used in logical ids.
    #[must_use]
    pub fn upper(&self) -> String {
        self.0.to_ascii_uppercase()
    }

    /// Returns the full zone name within a region (`ap-northeast-1` + `a`).
    #[must_use]
    pub fn qualified(&self, region: &str) -> String {
        format!("{region}{}", self.0)
    }
}

impl TryFrom<String> for AvailabilityZone {
    type Error = TopologyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<AvailabilityZone> for String {
    fn from(zone: AvailabilityZone) -> Self {
        zone.0
    }
}

impl fmt::Display for AvailabilityZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl SubnetTier {
    /// Tiers in planning order.
    pub const ORDER: [Self; 3] = [Self::Public, Self::Protected, Self::Private];

    /// Lowercase label used in resource names.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Private => "private",
        }
    }

    /// Capitalized label used in logical ids.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Public => "Public",
            Self::Protected => "Protected",
            Self::Private => "Private",
        }
    }
}

impl fmt::Display for SubnetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl LogicalId {
    /// Logical id of the VPC itself.
    #[must_use]
    pub fn vpc() -> Self {
        Self(String::from("Vpc"))
    }

    /// Logical id of a subnet.
    #[must_use]
    pub fn subnet(tier: SubnetTier, zone: &AvailabilityZone) -> Self {
        Self(format!("Subnet{}{}", tier.title(), zone.upper()))
    }

    /// Logical id of a route table, per-zone when `zone` is set.
    #[must_use]
    pub fn route_table(tier: SubnetTier, zone: Option<&AvailabilityZone>) -> Self {
        let suffix = zone.map(AvailabilityZone::upper).unwrap_or_default();
        Self(format!("RouteTable{}{suffix}", tier.title()))
    }

    /// Logical id of the internet gateway.
    #[must_use]
    pub fn internet_gateway() -> Self {
        Self(String::from("InternetGateway"))
    }

    /// Logical id of a zone's NAT gateway.
    #[must_use]
    pub fn nat_gateway(zone: &AvailabilityZone) -> Self {
        Self(format!("NatGateway{}", zone.upper()))
    }

    /// Logical id of the elastic IP for a zone's NAT gateway.
    #[must_use]
    pub fn nat_elastic_ip(zone: &AvailabilityZone) -> Self {
        Self(format!("ElasticIpNatGateway{}", zone.upper()))
    }

    /// Logical id of a gateway endpoint.
    #[must_use]
    pub fn gateway_endpoint(service: EndpointService) -> Self {
        Self(format!("GatewayEndpoint{}", service.title()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl RouteTarget {
    /// Returns the gateway referenced by the route.
    #[must_use]
    pub const fn gateway(&self) -> &LogicalId {
        match self {
            Self::InternetGateway(id) | Self::NatGateway(id) => id,
        }
    }
}

impl fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InternetGateway(id) => write!(f, "igw:{id}"),
            Self::NatGateway(id) => write!(f, "nat:{id}"),
        }
    }
}

impl DefaultRoute {
    /// Creates a `0.0.0.0/0` route to `target`.
    #[must_use]
    pub const fn to(target: RouteTarget) -> Self {
        Self {
            destination: AddressBlock::ANY,
            target,
        }
    }
}

impl EndpointService {
    /// Services that receive a gateway endpoint, in planning order.
    pub const ALL: [Self; 2] = [Self::DynamoDb, Self::S3];

    /// Capitalized label used in logical ids.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::DynamoDb => "DynamoDB",
            Self::S3 => "S3",
        }
    }
}

impl fmt::Display for EndpointService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}
