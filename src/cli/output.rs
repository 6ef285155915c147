//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::state::{LockInfo, PlanState};
use crate::topology::{
    DiffResult, DiffType, LogicalId, PlanHasher, ResourceNamer, StackOutputs, SubnetTier, TopologyPlan,
};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Subnet row for table display.
#[derive(Tabled)]
struct SubnetRow {
    #[tabled(rename = "Subnet")]
    id: String,
    #[tabled(rename = "Zone")]
    zone: String,
    #[tabled(rename = "CIDR")]
    block: String,
    #[tabled(rename = "Route table")]
    route_table: String,
    #[tabled(rename = "Name")]
    name: String,
}

/// Route table row for table display.
#[derive(Tabled)]
struct RouteTableRow {
    #[tabled(rename = "Route table")]
    id: String,
    #[tabled(rename = "Default route")]
    route: String,
    #[tabled(rename = "Name")]
    name: String,
}

/// Diff row for table display.
#[derive(Tabled)]
struct DiffRow {
    #[tabled(rename = "Change")]
    change: String,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Details")]
    details: String,
}

/// Export row for table display.
#[derive(Tabled)]
struct ExportRow {
    #[tabled(rename = "Export")]
    export_name: String,
    #[tabled(rename = "Resource")]
    resource: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a topology plan for display.
    #[must_use]
    pub fn format_plan(&self, plan: &TopologyPlan, namer: &ResourceNamer, detailed: bool) -> String {
        let fingerprint = PlanHasher::new().fingerprint(plan);
        match self.format {
            OutputFormat::Json => to_json(&PlanJson {
                fingerprint,
                names: namer
                    .name_all(plan)
                    .into_iter()
                    .map(|n| (n.resource.to_string(), n.name))
                    .collect(),
                plan,
            }),
            OutputFormat::Text => Self::format_plan_text(plan, namer, &fingerprint, detailed),
        }
    }

    /// Formats a plan as text.
    fn format_plan_text(
        plan: &TopologyPlan,
        namer: &ResourceNamer,
        fingerprint: &str,
        detailed: bool,
    ) -> String {
        let mut output = String::new();

        let _ = writeln!(
            output,
            "\nTopology plan: {} ({})",
            namer.vpc_name().bold(),
            plan.environment
        );
        let _ = writeln!(output, "   VPC block:   {}", plan.vpc_block);
        let _ = writeln!(output, "   Zones:       {}", zone_list(plan, namer));
        let _ = writeln!(
            output,
            "   Fingerprint: {}\n",
            PlanHasher::new().short_hash(fingerprint)
        );

        for tier in SubnetTier::ORDER {
            let subnets = plan.tier_subnets(tier);
            if subnets.is_empty() {
                continue;
            }

            let _ = writeln!(output, "{} tier", Self::format_tier(tier));
            let rows: Vec<SubnetRow> = subnets
                .iter()
                .map(|s| SubnetRow {
                    id: s.id.to_string(),
                    zone: namer.zone_name(&s.zone),
                    block: s.block.to_string(),
                    route_table: s.route_table.to_string(),
                    name: namer.subnet_name(s),
                })
                .collect();
            output.push_str(&Table::new(rows).to_string());
            output.push_str("\n\n");
        }

        if detailed {
            let rows: Vec<RouteTableRow> = plan
                .route_tables()
                .map(|t| RouteTableRow {
                    id: t.id.to_string(),
                    route: t.default_route.as_ref().map_or_else(
                        || "none (isolated)".dimmed().to_string(),
                        |r| format!("{} -> {}", r.destination, r.target),
                    ),
                    name: namer.route_table_name(t),
                })
                .collect();
            output.push_str(&Table::new(rows).to_string());
            output.push('\n');

            if let Some(nat) = plan.nat_gateway() {
                let _ = writeln!(
                    output,
                    "\nNAT gateway {} in {} (elastic IP {})",
                    nat.id, nat.subnet, nat.elastic_ip
                );
            }

            for endpoint in &plan.endpoints {
                let subnets: Vec<&str> = endpoint.subnets.iter().map(LogicalId::as_str).collect();
                let _ = writeln!(
                    output,
                    "Gateway endpoint {} -> {}",
                    endpoint.service,
                    subnets.join(", ")
                );
            }
        }

        let _ = writeln!(
            output,
            "\nPlan: {} subnets, {} route tables, {} NAT gateway(s)",
            plan.subnet_count().to_string().green(),
            plan.route_tables().count(),
            usize::from(plan.has_protected_tier())
        );

        output
    }

    /// Formats a plan diff for display.
    #[must_use]
    pub fn format_diff(&self, diff: &DiffResult) -> String {
        match self.format {
            OutputFormat::Json => to_json(diff),
            OutputFormat::Text => {
                if !diff.has_changes() {
                    return format!(
                        "{} No changes - the recorded plan is up to date.\n",
                        "✓".green()
                    );
                }

                let rows: Vec<DiffRow> = diff
                    .actionable_diffs()
                    .into_iter()
                    .map(|d| DiffRow {
                        change: Self::format_diff_type(d.diff_type),
                        resource: d.resource.to_string(),
                        details: d
                            .details
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join("; "),
                    })
                    .collect();

                let mut output = format!("\n{}\n", Table::new(rows));
                let _ = writeln!(
                    output,
                    "\nDiff: {} to create, {} to update, {} to delete, {} unchanged",
                    diff.creates.to_string().green(),
                    diff.updates.to_string().yellow(),
                    diff.deletes.to_string().red(),
                    diff.unchanged
                );
                output
            }
        }
    }

    /// Formats stack outputs for display.
    #[must_use]
    pub fn format_outputs(&self, outputs: &StackOutputs) -> String {
        match self.format {
            OutputFormat::Json => to_json(outputs),
            OutputFormat::Text => {
                let rows: Vec<ExportRow> = outputs
                    .exports
                    .iter()
                    .map(|e| ExportRow {
                        export_name: e.export_name.clone(),
                        resource: e.resource.to_string(),
                    })
                    .collect();
                format!(
                    "\nExports of {}:\n{}\n",
                    outputs.stack_id.bold(),
                    Table::new(rows)
                )
            }
        }
    }

    /// Formats plan state.
    #[must_use]
    pub fn format_state(&self, state: &PlanState, lock: Option<&LockInfo>) -> String {
        match self.format {
            OutputFormat::Json => to_json(&StateJson { state, lock }),
            OutputFormat::Text => {
                let mut output = String::new();

                let _ = writeln!(output, "\nState: {}/{}\n", state.system, state.environment);
                let _ = writeln!(output, "   Version: {}", state.version);
                match &state.plan {
                    Some(plan) => {
                        let _ = writeln!(
                            output,
                            "   Recorded plan: {} ({} subnets in {})",
                            PlanHasher::new().short_hash(&state.fingerprint),
                            plan.subnet_count(),
                            plan.vpc_block
                        );
                    }
                    None => {
                        let _ = writeln!(output, "   Recorded plan: {}", "none".dimmed());
                    }
                }
                let _ = writeln!(output, "   Last updated: {}", state.recorded_at);

                if let Some(lock) = lock {
                    let _ = writeln!(
                        output,
                        "   Lock: {} ({}s left)",
                        lock.to_string().yellow(),
                        lock.remaining_secs()
                    );
                }

                if !state.history.is_empty() {
                    let _ = writeln!(output, "\n   Recent history ({}):", state.history.len());
                    for entry in state.history.iter().rev().take(5) {
                        let _ = writeln!(
                            output,
                            "     {} - {} {} ({} subnets)",
                            entry.timestamp.format("%Y-%m-%d %H:%M"),
                            entry.operation,
                            PlanHasher::new().short_hash(&entry.fingerprint),
                            entry.subnets
                        );
                    }
                }

                output
            }
        }
    }

    /// Formats lock information.
    #[must_use]
    pub fn format_lock(&self, lock: &LockInfo) -> String {
        match self.format {
            OutputFormat::Json => to_json(lock),
            OutputFormat::Text => format!(
                "{} Lock {} acquired by {} (expires in {}s)\n",
                "✓".green(),
                lock.lock_id,
                lock.holder,
                lock.remaining_secs()
            ),
        }
    }

    /// Formats a tier label with color.
    fn format_tier(tier: SubnetTier) -> String {
        match tier {
            SubnetTier::Public => tier.title().green().to_string(),
            SubnetTier::Protected => tier.title().yellow().to_string(),
            SubnetTier::Private => tier.title().blue().to_string(),
        }
    }

    /// Formats a diff type with color.
    fn format_diff_type(diff_type: DiffType) -> String {
        match diff_type {
            DiffType::Create => "+create".green().to_string(),
            DiffType::Update => "~update".yellow().to_string(),
            DiffType::Delete => "-delete".red().to_string(),
            DiffType::NoChange => "noop".dimmed().to_string(),
        }
    }
}

fn zone_list(plan: &TopologyPlan, namer: &ResourceNamer) -> String {
    plan.zones
        .iter()
        .map(|z| namer.zone_name(z))
        .collect::<Vec<_>>()
        .join(", ")
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

// JSON serialization helpers

#[derive(Serialize)]
struct PlanJson<'a> {
    fingerprint: String,
    names: Vec<(String, String)>,
    plan: &'a TopologyPlan,
}

#[derive(Serialize)]
struct StateJson<'a> {
    state: &'a PlanState,
    lock: Option<&'a LockInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{plan, AvailabilityZone, DiffEngine, Environment};

    fn sample() -> (TopologyPlan, ResourceNamer) {
        let zones = AvailabilityZone::parse_list("a,c,d").expect("zones");
        let plan = plan(Environment::Development, &zones, true).expect("plan");
        let namer = ResourceNamer::new("todo-app", Environment::Development, "ap-northeast-1");
        (plan, namer)
    }

    #[test]
    fn test_plan_text_lists_subnets() {
        colored::control::set_override(false);
        let (plan, namer) = sample();
        let text = OutputFormatter::new(OutputFormat::Text).format_plan(&plan, &namer, true);

        assert!(text.contains("todo-app-dev-vpc"));
        assert!(text.contains("10.1.70.0/24"));
        assert!(text.contains("todo-app-dev-protected-subnet-c"));
        assert!(text.contains("NatGatewayA"));
        assert!(text.contains("none (isolated)"));
    }

    #[test]
    fn test_plan_json_is_parseable() {
        let (plan, namer) = sample();
        let json = OutputFormatter::new(OutputFormat::Json).format_plan(&plan, &namer, false);

        let value: serde_json::Value = serde_json::from_str(&json).expect("json");
        assert_eq!(value["fingerprint"].as_str().map(str::len), Some(64));
        assert_eq!(value["plan"]["vpc_block"], "10.1.64.0/19");
    }

    #[test]
    fn test_diff_without_changes() {
        colored::control::set_override(false);
        let (plan, _) = sample();
        let diff = DiffEngine::new().compute_diff(Some(&plan), &plan);
        let text = OutputFormatter::new(OutputFormat::Text).format_diff(&diff);
        assert!(text.contains("No changes"));
    }
}
