//! Deprecated-rule merge and one-time advisory tests

mod common;

use common::*;
use policy_registry::{
    Catalog, CheckExpression, Decision, DeprecationInfo, Enforcer, EnforcerBuilder,
    EnforcerConfig, OverrideTable, RequestContext, Rule, RuleGroup, RuleSet, ScopeType,
};
use std::sync::Arc;

fn builder(sink: Arc<RecordingSink>) -> EnforcerBuilder {
    let groups: Vec<Box<dyn RuleGroup>> = vec![Box::new(EndpointRules), Box::new(ServiceProviderRules)];
    Enforcer::builder(Catalog::from_groups(groups).unwrap())
        .with_aliases(base_aliases())
        .with_advisory_sink(sink)
}

fn legacy_admin_override() -> OverrideTable {
    OverrideTable::from_check_strings([("identity:get_endpoint", "role:admin")]).unwrap()
}

#[test]
fn test_legacy_override_is_ored_with_new_default() {
    init_tracing();
    let sink = Arc::new(RecordingSink::default());
    let enforcer = builder(sink.clone())
        .with_overrides(legacy_admin_override())
        .build()
        .unwrap();

    // Satisfies only the legacy override
    let legacy_only = RequestContext::system().with_role("admin");
    assert_eq!(
        enforcer.authorize("identity:get_endpoint", &legacy_only).unwrap(),
        Decision::Allow
    );

    // Satisfies only the new default
    let new_only = RequestContext::system().with_role("reader");
    assert_eq!(
        enforcer.authorize("identity:get_endpoint", &new_only).unwrap(),
        Decision::Allow
    );

    let neither = RequestContext::system().with_role("member");
    assert!(!enforcer
        .authorize("identity:get_endpoint", &neither)
        .unwrap()
        .is_allowed());
}

#[test]
fn test_advisory_emitted_exactly_once() {
    let sink = Arc::new(RecordingSink::default());
    let enforcer = builder(sink.clone())
        .with_overrides(legacy_admin_override())
        .build()
        .unwrap();

    assert_eq!(sink.count(), 1, "advisory is reported when the override is detected");

    let ctx = RequestContext::system().with_role("admin");
    for _ in 0..5 {
        enforcer.authorize("identity:get_endpoint", &ctx).unwrap();
    }

    assert_eq!(sink.count(), 1);
    let notices = sink.notices();
    assert_eq!(notices[0].rule, "identity:get_endpoint");
    assert_eq!(notices[0].since, stein());
    assert!(!notices[0].override_ignored);
    assert!(notices[0].message().contains("deprecated in stein"));
    assert_eq!(enforcer.advisories_emitted(), 1);
}

#[test]
fn test_advisory_emitted_for_unrequested_rule() {
    let sink = Arc::new(RecordingSink::default());
    let overrides =
        OverrideTable::from_check_strings([("identity:get_service_provider", "role:admin")]).unwrap();
    let enforcer = builder(sink.clone()).with_overrides(overrides).build().unwrap();

    assert_eq!(enforcer.metrics().total_decisions, 0);
    assert_eq!(sink.count(), 1);
    assert_eq!(sink.notices()[0].rule, "identity:get_service_provider");
}

#[test]
fn test_one_advisory_per_rule() {
    let sink = Arc::new(RecordingSink::default());
    let overrides = OverrideTable::from_check_strings([
        ("identity:get_endpoint", "role:admin"),
        ("identity:list_service_providers", "role:admin"),
    ])
    .unwrap();
    let enforcer = builder(sink.clone()).with_overrides(overrides).build().unwrap();

    let ctx = RequestContext::system().with_role("admin");
    for _ in 0..3 {
        enforcer.authorize("identity:get_endpoint", &ctx).unwrap();
        enforcer.authorize("identity:list_service_providers", &ctx).unwrap();
        enforcer.authorize("identity:list_endpoints", &ctx).unwrap();
    }

    assert_eq!(sink.count(), 2);
    let mut rules: Vec<String> = sink.notices().into_iter().map(|n| n.rule).collect();
    rules.sort();
    assert_eq!(
        rules,
        vec!["identity:get_endpoint", "identity:list_service_providers"]
    );
}

#[test]
fn test_no_advisory_without_legacy_override() {
    let sink = Arc::new(RecordingSink::default());
    let enforcer = builder(sink.clone()).build().unwrap();

    let ctx = RequestContext::system().with_role("reader");
    enforcer.authorize("identity:get_endpoint", &ctx).unwrap();
    enforcer.authorize("identity:list_endpoints", &ctx).unwrap();

    assert_eq!(sink.count(), 0);
    assert!(enforcer.deprecation_notices().is_empty());
}

#[test]
fn test_deprecation_notices_match_reported_advisories() {
    let sink = Arc::new(RecordingSink::default());
    let enforcer = builder(sink.clone())
        .with_overrides(legacy_admin_override())
        .build()
        .unwrap();

    let notices = enforcer.deprecation_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].prior_name, "identity:get_endpoint");
    assert_eq!(sink.notices(), vec![notices[0].clone()]);
}

#[test]
fn test_enforce_new_defaults_ignores_legacy_override() {
    let sink = Arc::new(RecordingSink::default());
    let enforcer = builder(sink.clone())
        .with_overrides(legacy_admin_override())
        .with_config(EnforcerConfig::default().with_enforce_new_defaults(true))
        .build()
        .unwrap();

    let legacy_only = RequestContext::system().with_role("admin");
    assert!(!enforcer
        .authorize("identity:get_endpoint", &legacy_only)
        .unwrap()
        .is_allowed());

    let new_only = RequestContext::system().with_role("reader");
    assert!(enforcer
        .authorize("identity:get_endpoint", &new_only)
        .unwrap()
        .is_allowed());

    assert_eq!(sink.count(), 1);
    assert!(sink.notices()[0].override_ignored);
    assert!(sink.notices()[0].message().contains("is ignored"));
}

fn renamed_catalog() -> Catalog {
    let rule = Rule::new(
        "identity:get_region",
        CheckExpression::parse("role:reader and system_scope:all").unwrap(),
        "Show region details.",
    )
    .with_scope_types([ScopeType::System])
    .deprecates(DeprecationInfo::new(
        "identity:show_region",
        CheckExpression::rule("admin_required"),
        stein(),
        "Renamed for consistency.",
    ));
    Catalog::from_groups([RuleSet::new("regions", vec![rule])]).unwrap()
}

#[test]
fn test_renamed_rule_legacy_override() {
    let sink = Arc::new(RecordingSink::default());
    let overrides = OverrideTable::from_check_strings([("identity:show_region", "role:operator")]).unwrap();
    let enforcer = Enforcer::builder(renamed_catalog())
        .with_aliases(base_aliases())
        .with_overrides(overrides)
        .with_advisory_sink(sink.clone())
        .build()
        .unwrap();

    let operator = RequestContext::system().with_role("operator");
    assert!(enforcer.authorize("identity:get_region", &operator).unwrap().is_allowed());

    // The deprecated name is not itself a rule
    assert!(enforcer.authorize("identity:show_region", &operator).is_err());

    let notices = sink.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].rule, "identity:get_region");
    assert_eq!(notices[0].prior_name, "identity:show_region");
}

#[test]
fn test_renamed_rule_adopted_override_wins() {
    let sink = Arc::new(RecordingSink::default());
    let overrides = OverrideTable::from_check_strings([
        ("identity:show_region", "role:operator"),
        ("identity:get_region", "role:auditor"),
    ])
    .unwrap();
    let enforcer = Enforcer::builder(renamed_catalog())
        .with_aliases(base_aliases())
        .with_overrides(overrides)
        .with_advisory_sink(sink.clone())
        .build()
        .unwrap();

    let auditor = RequestContext::system().with_role("auditor");
    let operator = RequestContext::system().with_role("operator");
    let reader = RequestContext::system().with_role("reader");

    assert!(enforcer.authorize("identity:get_region", &auditor).unwrap().is_allowed());
    assert!(!enforcer.authorize("identity:get_region", &operator).unwrap().is_allowed());
    assert!(!enforcer.authorize("identity:get_region", &reader).unwrap().is_allowed());
    assert_eq!(sink.count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_use_adds_no_advisories() {
    let sink = Arc::new(RecordingSink::default());
    let enforcer = Arc::new(
        builder(sink.clone())
            .with_overrides(legacy_admin_override())
            .build()
            .unwrap(),
    );

    let mut handles = Vec::new();
    for _ in 0..32 {
        let enforcer = Arc::clone(&enforcer);
        handles.push(tokio::spawn(async move {
            let ctx = RequestContext::system().with_role("admin");
            enforcer.authorize("identity:get_endpoint", &ctx).unwrap()
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().is_allowed());
    }

    assert_eq!(sink.count(), 1);
    assert_eq!(enforcer.metrics().total_decisions, 32);
}
