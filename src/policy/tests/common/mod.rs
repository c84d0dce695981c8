//! Shared fixtures: endpoint and service-provider rule groups

#![allow(dead_code)]

use policy_registry::{
    AdvisorySink, CheckExpression, DeprecationInfo, DeprecationNotice, Method, Release, Rule,
    RuleGroup, RuleName, ScopeType,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const IDENTITY: &str = "identity";

pub fn name(operation: &str) -> String {
    RuleName::new(IDENTITY, operation).unwrap().into()
}

pub fn stein() -> Release {
    Release::new(19, "stein")
}

pub fn system_reader() -> CheckExpression {
    CheckExpression::parse("role:reader and system_scope:all").unwrap()
}

pub fn admin_required() -> CheckExpression {
    CheckExpression::rule("admin_required")
}

/// Base rules of the surrounding identity service
pub fn base_aliases() -> Vec<(&'static str, CheckExpression)> {
    vec![
        ("admin_required", CheckExpression::role("admin")),
        ("service_role", CheckExpression::role("service")),
        (
            "service_or_admin",
            CheckExpression::parse("rule:admin_required or rule:service_role").unwrap(),
        ),
    ]
}

const ENDPOINT_REASON: &str = "
As of the Stein release, the endpoint API now understands default roles and
system-scoped tokens, making the API more granular by default without
compromising security.
";

const SERVICE_PROVIDER_REASON: &str = "
As of the Stein release, the service provider API now understands default
roles and system-scoped tokens, making the API more granular by default without
compromising security.
";

pub struct EndpointRules;

impl RuleGroup for EndpointRules {
    fn name(&self) -> &str {
        "endpoints"
    }

    fn list_rules(&self) -> Vec<Rule> {
        let deprecated = |operation: &str| {
            DeprecationInfo::new(name(operation), admin_required(), stein(), ENDPOINT_REASON)
        };

        vec![
            Rule::new(name("get_endpoint"), system_reader(), "Show endpoint details.")
                .with_scope_types([ScopeType::System])
                .with_operation(Method::Get, "/v3/endpoints/{endpoint_id}")
                .deprecates(deprecated("get_endpoint")),
            Rule::new(name("list_endpoints"), system_reader(), "List endpoints.")
                .with_scope_types([ScopeType::System])
                .with_operation(Method::Get, "/v3/endpoints")
                .deprecates(deprecated("list_endpoints")),
            Rule::new(name("create_endpoint"), admin_required(), "Create endpoint.")
                .with_scope_types([ScopeType::System])
                .with_operation(Method::Post, "/v3/endpoints"),
            Rule::new(name("update_endpoint"), admin_required(), "Update endpoint.")
                .with_scope_types([ScopeType::System])
                .with_operation(Method::Patch, "/v3/endpoints/{endpoint_id}"),
            Rule::new(name("delete_endpoint"), admin_required(), "Delete endpoint.")
                .with_scope_types([ScopeType::System])
                .with_operation(Method::Delete, "/v3/endpoints/{endpoint_id}"),
        ]
    }
}

pub struct ServiceProviderRules;

impl RuleGroup for ServiceProviderRules {
    fn name(&self) -> &str {
        "service_providers"
    }

    fn list_rules(&self) -> Vec<Rule> {
        let collection = "/v3/OS-FEDERATION/service_providers";
        let item = "/v3/OS-FEDERATION/service_providers/{service_provider_id}";
        let deprecated = |operation: &str| {
            DeprecationInfo::new(name(operation), admin_required(), stein(), SERVICE_PROVIDER_REASON)
        };

        vec![
            Rule::new(
                name("create_service_provider"),
                admin_required(),
                "Create federated service provider.",
            )
            .with_scope_types([ScopeType::System])
            .with_operation(Method::Put, item),
            Rule::new(
                name("list_service_providers"),
                system_reader(),
                "List federated service providers.",
            )
            .with_scope_types([ScopeType::System])
            .with_operation(Method::Get, collection)
            .with_operation(Method::Head, collection)
            .deprecates(deprecated("list_service_providers")),
            Rule::new(
                name("get_service_provider"),
                system_reader(),
                "Get federated service provider.",
            )
            .with_scope_types([ScopeType::System])
            .with_operation(Method::Get, item)
            .with_operation(Method::Head, item)
            .deprecates(deprecated("get_service_provider")),
            Rule::new(
                name("update_service_provider"),
                admin_required(),
                "Update federated service provider.",
            )
            .with_scope_types([ScopeType::System])
            .with_operation(Method::Patch, item),
            Rule::new(
                name("delete_service_provider"),
                admin_required(),
                "Delete federated service provider.",
            )
            .with_scope_types([ScopeType::System])
            .with_operation(Method::Delete, item),
        ]
    }
}

/// Advisory sink that records what it receives
#[derive(Default)]
pub struct RecordingSink {
    count: AtomicUsize,
    notices: Mutex<Vec<DeprecationNotice>>,
}

impl RecordingSink {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn notices(&self) -> Vec<DeprecationNotice> {
        self.notices.lock().unwrap().clone()
    }
}

impl AdvisorySink for RecordingSink {
    fn deprecated_override(&self, notice: &DeprecationNotice) {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.notices.lock().unwrap().push(notice.clone());
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("policy_registry=debug")
        .try_init();
}
