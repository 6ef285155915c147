//! Integration tests for vpcplan
//!
//! These tests drive the public API from configuration to a recorded plan.

use vpcplan::config::{ConfigParser, ConfigValidator};
use vpcplan::state::{LocalStateStore, PlanState, StateStore};
use vpcplan::topology::{
    plan, AvailabilityZone, DiffEngine, Environment, PlanHasher, RouteTarget, SubnetTier,
    TopologyPlan, TopologyPlanner,
};
use vpcplan::{TopologyError, VpcPlanError};

fn zones(list: &str) -> Vec<AvailabilityZone> {
    AvailabilityZone::parse_list(list).expect("valid zones")
}

fn blocks(plan: &TopologyPlan, tier: SubnetTier) -> Vec<String> {
    plan.tier_subnets(tier)
        .iter()
        .map(|s| s.block.to_string())
        .collect()
}

#[test]
fn test_development_without_protected_tier() {
    let plan = plan(Environment::Development, &zones("a,c,d"), false).expect("plan");

    assert_eq!(plan.vpc_block.to_string(), "10.1.64.0/19");
    assert_eq!(
        blocks(&plan, SubnetTier::Public),
        ["10.1.64.0/24", "10.1.65.0/24", "10.1.66.0/24"]
    );
    assert!(blocks(&plan, SubnetTier::Protected).is_empty());
    assert_eq!(
        blocks(&plan, SubnetTier::Private),
        ["10.1.67.0/24", "10.1.68.0/24", "10.1.69.0/24"]
    );
    assert!(plan.nat_gateway().is_none());
    assert_eq!(plan.route_tables().count(), 2);
}

#[test]
fn test_development_with_protected_tier() {
    let plan = plan(Environment::Development, &zones("a,c,d"), true).expect("plan");

    assert_eq!(
        blocks(&plan, SubnetTier::Protected),
        ["10.1.67.0/24", "10.1.68.0/24", "10.1.69.0/24"]
    );
    assert_eq!(
        blocks(&plan, SubnetTier::Private),
        ["10.1.70.0/24", "10.1.71.0/24", "10.1.72.0/24"]
    );

    let nat = plan.nat_gateway().expect("nat gateway");
    assert_eq!(nat.zone.as_str(), "a");
    assert_eq!(nat.subnet.as_str(), "SubnetPublicA");

    for subnet in plan.tier_subnets(SubnetTier::Protected) {
        let table = plan.route_table(&subnet.route_table).expect("route table");
        assert_eq!(
            table.default_route.as_ref().map(|r| &r.target),
            Some(&RouteTarget::NatGateway(nat.id.clone()))
        );
    }
}

#[test]
fn test_every_environment_plans_disjoint_blocks() {
    let plans: Vec<TopologyPlan> = Environment::ALL
        .iter()
        .map(|env| plan(*env, &zones("a,c,d"), true).expect("plan"))
        .collect();

    for (i, a) in plans.iter().enumerate() {
        for b in &plans[i + 1..] {
            assert!(!a.vpc_block.overlaps(&b.vpc_block));
        }

        let subnets: Vec<_> = a.subnets().collect();
        for (j, s) in subnets.iter().enumerate() {
            assert!(a.vpc_block.contains(&s.block));
            for t in &subnets[j + 1..] {
                assert!(!s.block.overlaps(&t.block), "{} overlaps {}", s.id, t.id);
            }
        }
    }
}

#[test]
fn test_private_subnets_are_isolated() {
    let plan = plan(Environment::Production, &zones("a,c,d"), true).expect("plan");

    assert!(plan.tiers.private.route_table.default_route.is_none());
    for endpoint in &plan.endpoints {
        assert_eq!(endpoint.subnets.len(), 6);
        assert!(
            endpoint
                .subnets
                .iter()
                .all(|id| !id.as_str().starts_with("SubnetPrivate"))
        );
    }
}

#[test]
fn test_planning_is_deterministic() {
    let a = plan(Environment::Staging, &zones("c,a"), true).expect("plan");
    let b = plan(Environment::Staging, &zones("c,a"), true).expect("plan");

    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).expect("json"),
        serde_json::to_string(&b).expect("json")
    );
    assert_eq!(PlanHasher::new().fingerprint(&a), PlanHasher::new().fingerprint(&b));
}

#[test]
fn test_empty_zone_list_is_rejected() {
    let err = plan(Environment::Development, &[], false).expect_err("no zones");
    assert!(matches!(
        err,
        VpcPlanError::Topology(TopologyError::InvalidTopologyInput { .. })
    ));
}

#[test]
fn test_config_drives_planner() {
    let yaml = r"
network:
  zones: [b, d]
  create_protected_tier: true
  base_offsets:
    development: 128
    staging: 96
    production: 0
";
    let config = ConfigParser::new().parse_yaml(yaml, None).expect("yaml");
    ConfigValidator::new().validate(&config).expect("valid");

    let env = Environment::Development;
    let plan = TopologyPlanner::with_params(env, config.environment_params(env))
        .plan(&config.network.zones, config.network.create_protected_tier)
        .expect("plan");

    assert_eq!(plan.vpc_block.to_string(), "10.1.128.0/19");
    assert_eq!(blocks(&plan, SubnetTier::Private), ["10.1.132.0/24", "10.1.133.0/24"]);
}

#[tokio::test]
async fn test_recorded_plan_diffs_cleanly() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = LocalStateStore::with_root(dir.path(), Environment::Development);

    let first = plan(Environment::Development, &zones("a,c,d"), false).expect("plan");
    let mut state = PlanState::new("todo-app", Environment::Development);
    state.record(first.clone(), &PlanHasher::new().fingerprint(&first));
    store.save(&state).await.expect("save");

    let loaded = store.load().await.expect("load").expect("state");
    let recorded = loaded.plan.as_ref().expect("recorded plan");

    let same = DiffEngine::new().compute_diff(Some(recorded), &first);
    assert!(!same.has_changes());

    let widened = plan(Environment::Development, &zones("a,c,d"), true).expect("plan");
    let diff = DiffEngine::new().compute_diff(Some(recorded), &widened);
    assert!(diff.has_changes());
    assert_eq!(diff.deletes, 0);
    // eip, nat, 3 protected route tables, 3 protected subnets
    assert_eq!(diff.creates, 8);
}
