//! Diff engine for comparing a recorded plan with a freshly computed one.
//!
//! Every resource is reduced to a list of (field, value) attributes keyed by
//! its logical id; the diff is then a plain comparison of those lists.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use super::plan::TopologyPlan;
use super::types::LogicalId;

/// Engine for computing diffs between two plans.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiffEngine;

/// Difference for a single resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceDiff {
    /// Logical id of the resource.
    pub resource: LogicalId,
    /// Type of difference.
    pub diff_type: DiffType,
    /// Changed fields.
    pub details: Vec<DiffDetail>,
}

/// Type of difference detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffType {
    /// Resource is new in the current plan.
    Create,
    /// Resource exists in both plans with different attributes.
    Update,
    /// Resource is gone from the current plan.
    Delete,
    /// Resource is unchanged.
    NoChange,
}

/// Detail about a specific difference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffDetail {
    /// Field that differs.
    pub field: String,
    /// Recorded value.
    pub old_value: Option<String>,
    /// Planned value.
    pub new_value: Option<String>,
}

/// Complete diff result.
#[derive(Debug, Clone, Serialize)]
pub struct DiffResult {
    /// All resource diffs, current plan order first, then deletions.
    pub diffs: Vec<ResourceDiff>,
    /// Number of resources to create.
    pub creates: usize,
    /// Number of resources to update.
    pub updates: usize,
    /// Number of resources to delete.
    pub deletes: usize,
    /// Number of unchanged resources.
    pub unchanged: usize,
}

type Attributes = Vec<(&'static str, String)>;

impl DiffEngine {
    /// Creates a new diff engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the diff from `previous` (if any) to `current`.
    #[must_use]
    pub fn compute_diff(&self, previous: Option<&TopologyPlan>, current: &TopologyPlan) -> DiffResult {
        let old = previous.map(resource_attributes).unwrap_or_default();
        let new = resource_attributes(current);

        let old_by_id: HashMap<&LogicalId, &Attributes> = old.iter().map(|(id, a)| (id, a)).collect();
        let new_by_id: HashMap<&LogicalId, &Attributes> = new.iter().map(|(id, a)| (id, a)).collect();

        let mut diffs = Vec::with_capacity(new.len());

        for (id, attrs) in &new {
            let diff = match old_by_id.get(id) {
                None => {
                    debug!("{id} is new");
                    ResourceDiff {
                        resource: id.clone(),
                        diff_type: DiffType::Create,
                        details: attrs
                            .iter()
                            .map(|(field, value)| DiffDetail::added(field, value))
                            .collect(),
                    }
                }
                Some(old_attrs) => {
                    let details = compare_attributes(old_attrs, attrs);
                    let diff_type = if details.is_empty() {
                        DiffType::NoChange
                    } else {
                        debug!("{id} changed ({} fields)", details.len());
                        DiffType::Update
                    };
                    ResourceDiff {
                        resource: id.clone(),
                        diff_type,
                        details,
                    }
                }
            };
            diffs.push(diff);
        }

        for (id, attrs) in &old {
            if !new_by_id.contains_key(id) {
                debug!("{id} was removed");
                diffs.push(ResourceDiff {
                    resource: id.clone(),
                    diff_type: DiffType::Delete,
                    details: attrs
                        .iter()
                        .map(|(field, value)| DiffDetail::removed(field, value))
                        .collect(),
                });
            }
        }

        let count = |t: DiffType| diffs.iter().filter(|d| d.diff_type == t).count();
        let creates = count(DiffType::Create);
        let updates = count(DiffType::Update);
        let deletes = count(DiffType::Delete);
        let unchanged = count(DiffType::NoChange);

        DiffResult {
            diffs,
            creates,
            updates,
            deletes,
            unchanged,
        }
    }
}

/// Flattens a plan into per-resource attribute lists, in plan order.
fn resource_attributes(plan: &TopologyPlan) -> Vec<(LogicalId, Attributes)> {
    let mut resources = vec![(
        LogicalId::vpc(),
        vec![("cidr_block", plan.vpc_block.to_string())],
    )];

    resources.push((plan.tiers.public.internet_gateway.id.clone(), Vec::new()));

    if let Some(protected) = &plan.tiers.protected {
        resources.push((protected.elastic_ip.id.clone(), Vec::new()));
        resources.push((
            protected.nat_gateway.id.clone(),
            vec![("subnet", protected.nat_gateway.subnet.to_string())],
        ));
    }

    for table in plan.route_tables() {
        let route = table
            .default_route
            .as_ref()
            .map_or_else(|| String::from("none"), |r| r.target.to_string());
        resources.push((table.id.clone(), vec![("default_route", route)]));
    }

    for subnet in plan.subnets() {
        resources.push((
            subnet.id.clone(),
            vec![
                ("cidr_block", subnet.block.to_string()),
                ("route_table", subnet.route_table.to_string()),
            ],
        ));
    }

    for endpoint in &plan.endpoints {
        let subnets: Vec<&str> = endpoint.subnets.iter().map(LogicalId::as_str).collect();
        resources.push((endpoint.id.clone(), vec![("subnets", subnets.join(","))]));
    }

    resources
}

fn compare_attributes(old: &Attributes, new: &Attributes) -> Vec<DiffDetail> {
    new.iter()
        .filter_map(|(field, value)| {
            let previous = old.iter().find(|(f, _)| f == field).map(|(_, v)| v);
            (previous != Some(value)).then(|| DiffDetail {
                field: (*field).to_string(),
                old_value: previous.cloned(),
                new_value: Some(value.clone()),
            })
        })
        .collect()
}

impl DiffDetail {
    fn added(field: &str, value: &str) -> Self {
        Self {
            field: field.to_string(),
            old_value: None,
            new_value: Some(value.to_string()),
        }
    }

    fn removed(field: &str, value: &str) -> Self {
        Self {
            field: field.to_string(),
            old_value: Some(value.to_string()),
            new_value: None,
        }
    }
}

impl DiffResult {
    /// Returns true if there are any changes.
    #[must_use]
    pub const fn has_changes(&self) -> bool {
        self.creates > 0 || self.updates > 0 || self.deletes > 0
    }

    /// Returns the total number of changes.
    #[must_use]
    pub const fn total_changes(&self) -> usize {
        self.creates + self.updates + self.deletes
    }

    /// Filters to only diffs that require action.
    #[must_use]
    pub fn actionable_diffs(&self) -> Vec<&ResourceDiff> {
        self.diffs
            .iter()
            .filter(|d| d.diff_type != DiffType::NoChange)
            .collect()
    }

    /// Looks up the diff for a resource.
    #[must_use]
    pub fn get(&self, resource: &str) -> Option<&ResourceDiff> {
        self.diffs.iter().find(|d| d.resource.as_str() == resource)
    }
}

impl fmt::Display for DiffType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::NoChange => "no change",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for DiffDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let old = self.old_value.as_deref().unwrap_or("-");
        let new = self.new_value.as_deref().unwrap_or("-");
        write!(f, "{}: {old} -> {new}", self.field)
    }
}

impl fmt::Display for ResourceDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.resource, self.diff_type)?;
        if !self.details.is_empty() {
            write!(f, " (")?;
            for (i, detail) in self.details.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{detail}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{plan, AvailabilityZone, Environment};

    fn dev_plan(zones: &str, protected: bool) -> TopologyPlan {
        let zones = AvailabilityZone::parse_list(zones).expect("zones");
        plan(Environment::Development, &zones, protected).expect("plan")
    }

    #[test]
    fn test_no_previous_plan_creates_everything() {
        let current = dev_plan("a,c,d", false);
        let diff = DiffEngine::new().compute_diff(None, &current);

        // vpc + igw + 2 route tables + 6 subnets + 2 endpoints
        assert_eq!(diff.creates, 12);
        assert_eq!(diff.updates + diff.deletes + diff.unchanged, 0);
    }

    #[test]
    fn test_identical_plans_have_no_changes() {
        let current = dev_plan("a,c,d", true);
        let diff = DiffEngine::new().compute_diff(Some(&current), &current);

        assert!(!diff.has_changes());
        assert!(diff.actionable_diffs().is_empty());
        assert_eq!(diff.unchanged, diff.diffs.len());
    }

    #[test]
    fn test_enabling_protected_tier_renumbers_private_subnets() {
        let before = dev_plan("a,c,d", false);
        let after = dev_plan("a,c,d", true);
        let diff = DiffEngine::new().compute_diff(Some(&before), &after);

        let private_a = diff.get("SubnetPrivateA").expect("private a");
        assert_eq!(private_a.diff_type, DiffType::Update);
        assert_eq!(private_a.details[0].old_value.as_deref(), Some("10.1.67.0/24"));
        assert_eq!(private_a.details[0].new_value.as_deref(), Some("10.1.70.0/24"));

        assert_eq!(diff.get("SubnetPublicA").map(|d| d.diff_type), Some(DiffType::NoChange));
        assert_eq!(diff.get("NatGatewayA").map(|d| d.diff_type), Some(DiffType::Create));
        assert_eq!(
            diff.get("GatewayEndpointS3").map(|d| d.diff_type),
            Some(DiffType::Update)
        );
        assert_eq!(diff.deletes, 0);
    }

    #[test]
    fn test_removed_zone_is_deleted() {
        let before = dev_plan("a,c,d", false);
        let after = dev_plan("a,c", false);
        let diff = DiffEngine::new().compute_diff(Some(&before), &after);

        assert_eq!(diff.get("SubnetPublicD").map(|d| d.diff_type), Some(DiffType::Delete));
        assert_eq!(diff.get("SubnetPrivateD").map(|d| d.diff_type), Some(DiffType::Delete));
        assert_eq!(diff.deletes, 2);
        assert!(diff.total_changes() >= 2);
    }

    #[test]
    fn test_display() {
        let detail = DiffDetail {
            field: String::from("cidr_block"),
            old_value: Some(String::from("10.1.67.0/24")),
            new_value: Some(String::from("10.1.70.0/24")),
        };
        assert_eq!(detail.to_string(), "cidr_block: 10.1.67.0/24 -> 10.1.70.0/24");
    }
}
