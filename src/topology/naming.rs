//! Resource tag names and stack export names.
//!
//! Tags use the `{system}-{env}` prefix; exports use `{system}-{stack}-{label}`
//! so stacks in the same account can import each other's identifiers.

use serde::Serialize;

use super::environment::Environment;
use super::plan::TopologyPlan;
use super::types::{AvailabilityZone, LogicalId, RouteTableRecord, SubnetRecord};

/// Derives human-readable resource names for one system and environment.
#[derive(Debug, Clone)]
pub struct ResourceNamer {
    system_name: String,
    environment: Environment,
    region: String,
}

/// A named resource in the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedResource {
    /// Logical id of the resource.
    pub resource: LogicalId,
    /// Value of the `Name` tag.
    pub name: String,
}

/// One stack output: an exported identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRecord {
    /// Export name, `{system}-{stack}-{label}`.
    pub export_name: String,
    /// Logical id whose identifier is exported.
    pub resource: LogicalId,
}

/// The exports of a planned network stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackOutputs {
    /// Stack identifier used in export names.
    pub stack_id: String,
    /// Exports in plan order.
    pub exports: Vec<ExportRecord>,
}

impl ResourceNamer {
    /// Creates a namer.
    #[must_use]
    pub fn new(
        system_name: impl Into<String>,
        environment: Environment,
        region: impl Into<String>,
    ) -> Self {
        Self {
            system_name: system_name.into(),
            environment,
            region: region.into(),
        }
    }

    /// Returns the tag prefix, `{system}-{env}`.
    #[must_use]
    pub fn tag_prefix(&self) -> String {
        format!("{}-{}", self.system_name, self.environment.short_name())
    }

    /// Returns the system name.
    #[must_use]
    pub fn system_name(&self) -> &str {
        &self.system_name
    }

    /// Returns the full zone name in the configured region.
    #[must_use]
    pub fn zone_name(&self, zone: &AvailabilityZone) -> String {
        zone.qualified(&self.region)
    }

    /// Name tag of the VPC.
    #[must_use]
    pub fn vpc_name(&self) -> String {
        format!("{}-vpc", self.tag_prefix())
    }

    /// Name tag of the internet gateway.
    #[must_use]
    pub fn internet_gateway_name(&self) -> String {
        format!("{}-igw", self.tag_prefix())
    }

    /// Name tag of a subnet.
    #[must_use]
    pub fn subnet_name(&self, subnet: &SubnetRecord) -> String {
        format!("{}-{}-subnet-{}", self.tag_prefix(), subnet.tier, subnet.zone)
    }

    /// Name tag of a route table.
    #[must_use]
    pub fn route_table_name(&self, table: &RouteTableRecord) -> String {
        match &table.zone {
            Some(zone) => format!("{}-{}-rtb-{zone}", self.tag_prefix(), table.tier),
            None => format!("{}-{}-rtb", self.tag_prefix(), table.tier),
        }
    }

    /// Name tag of a zone's NAT gateway.
    #[must_use]
    pub fn nat_gateway_name(&self, zone: &AvailabilityZone) -> String {
        format!("{}-nat-{zone}", self.tag_prefix())
    }

    /// Name tag of the elastic IP for a zone's NAT gateway.
    #[must_use]
    pub fn nat_elastic_ip_name(&self, zone: &AvailabilityZone) -> String {
        format!("{}-eip-nat-{zone}", self.tag_prefix())
    }

    /// Returns the `Name` tag of every taggable resource in the plan.
    #[must_use]
    pub fn name_all(&self, plan: &TopologyPlan) -> Vec<NamedResource> {
        let named = |resource: &LogicalId, name: String| NamedResource {
            resource: resource.clone(),
            name,
        };

        let mut names = vec![
            named(&LogicalId::vpc(), self.vpc_name()),
            named(
                &plan.tiers.public.internet_gateway.id,
                self.internet_gateway_name(),
            ),
        ];

        if let Some(protected) = &plan.tiers.protected {
            names.push(named(
                &protected.elastic_ip.id,
                self.nat_elastic_ip_name(&protected.elastic_ip.zone),
            ));
            names.push(named(
                &protected.nat_gateway.id,
                self.nat_gateway_name(&protected.nat_gateway.zone),
            ));
        }

        names.extend(
            plan.route_tables()
                .map(|table| named(&table.id, self.route_table_name(table))),
        );
        names.extend(
            plan.subnets()
                .map(|subnet| named(&subnet.id, self.subnet_name(subnet))),
        );

        names
    }

    /// Returns an export name for `label` within `stack_id`.
    #[must_use]
    pub fn export_name(&self, stack_id: &str, label: &str) -> String {
        format!("{}-{stack_id}-{label}", self.system_name)
    }
}

impl StackOutputs {
    /// Builds the export list for a plan.
    ///
    /// Exports cover the VPC, every subnet and every route table. Records of an
    /// absent protected tier produce no exports at all.
    #[must_use]
    pub fn from_plan(plan: &TopologyPlan, namer: &ResourceNamer, stack_id: &str) -> Self {
        let export = |resource: &LogicalId, label: &str| ExportRecord {
            export_name: namer.export_name(stack_id, label),
            resource: resource.clone(),
        };

        let vpc = LogicalId::vpc();
        let mut exports = vec![export(&vpc, "VPC")];
        exports.extend(plan.subnets().map(|s| export(&s.id, s.id.as_str())));
        exports.extend(plan.route_tables().map(|t| export(&t.id, t.id.as_str())));

        Self {
            stack_id: stack_id.to_string(),
            exports,
        }
    }

    /// Finds an export by its name.
    #[must_use]
    pub fn find(&self, export_name: &str) -> Option<&ExportRecord> {
        self.exports.iter().find(|e| e.export_name == export_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{plan, SubnetTier};

    fn namer(env: Environment) -> ResourceNamer {
        ResourceNamer::new("todo-app", env, "ap-northeast-1")
    }

    fn sample_plan(protected: bool) -> TopologyPlan {
        let zones = AvailabilityZone::parse_list("a,c,d").expect("zones");
        plan(Environment::Development, &zones, protected).expect("plan")
    }

    #[test]
    fn test_tag_prefix_uses_short_env_name() {
        assert_eq!(namer(Environment::Development).tag_prefix(), "todo-app-dev");
        assert_eq!(namer(Environment::Staging).tag_prefix(), "todo-app-stg");
        assert_eq!(namer(Environment::Production).vpc_name(), "todo-app-prod-vpc");
    }

    #[test]
    fn test_resource_names() {
        let plan = sample_plan(true);
        let namer = namer(Environment::Development);

        let zone_c = AvailabilityZone::new("c").expect("zone");
        let protected_c = plan.subnet(SubnetTier::Protected, &zone_c).expect("subnet");
        assert_eq!(namer.subnet_name(protected_c), "todo-app-dev-protected-subnet-c");
        assert_eq!(namer.zone_name(&zone_c), "ap-northeast-1c");

        let rt = plan.route_table(&protected_c.route_table).expect("route table");
        assert_eq!(namer.route_table_name(rt), "todo-app-dev-protected-rtb-c");
        assert_eq!(
            namer.route_table_name(&plan.tiers.private.route_table),
            "todo-app-dev-private-rtb"
        );

        let names = namer.name_all(&plan);
        let nat = names
            .iter()
            .find(|n| n.resource == LogicalId::nat_gateway(&AvailabilityZone::new("a").expect("zone")))
            .expect("nat name");
        assert_eq!(nat.name, "todo-app-dev-nat-a");
        // vpc + igw + eip + nat + 5 route tables + 9 subnets
        assert_eq!(names.len(), 18);
    }

    #[test]
    fn test_outputs_include_every_subnet() {
        let plan = sample_plan(true);
        let outputs = StackOutputs::from_plan(&plan, &namer(Environment::Development), "VpcStack");

        assert!(outputs.find("todo-app-VpcStack-VPC").is_some());
        assert!(outputs.find("todo-app-VpcStack-SubnetPublicA").is_some());
        assert!(outputs.find("todo-app-VpcStack-SubnetProtectedD").is_some());
        assert!(outputs.find("todo-app-VpcStack-RouteTableProtectedC").is_some());
        assert_eq!(outputs.exports.len(), 1 + 9 + 5);
    }

    #[test]
    fn test_outputs_omit_absent_protected_tier() {
        let plan = sample_plan(false);
        let outputs = StackOutputs::from_plan(&plan, &namer(Environment::Development), "VpcStack");

        assert!(
            outputs
                .exports
                .iter()
                .all(|e| !e.export_name.contains("Protected"))
        );
        assert_eq!(outputs.exports.len(), 1 + 6 + 2);
    }
}
