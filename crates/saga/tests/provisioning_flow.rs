//! End-to-end saga behavior against the in-memory provider stack.

use std::time::Duration;

use provisioner_domain::{
    Contact, IdpConfig, ProvisioningRequest, TenantId, TenantKey, TenantStatus, TenantTier,
};
use provisioner_saga::{ProvisioningSaga, RetryPolicy, SagaConfig};
use provisioner_testing::InMemoryProviders;

const INVERSE_OPS: [&str; 7] = [
    "delete_organization",
    "delete_user",
    "deprovision_schema",
    "deprovision_storage",
    "destroy_infrastructure",
    "rollback_deployment",
    "delete_customer",
];

fn fast_config() -> SagaConfig {
    SagaConfig::new()
        .with_step_timeout(Duration::from_secs(5))
        .with_retry(
            RetryPolicy::new()
                .with_initial_interval(Duration::from_millis(1))
                .with_max_interval(Duration::from_millis(2))
                .with_max_attempts(3),
        )
}

fn request(key: &str, tier: TenantTier, with_identity: bool) -> ProvisioningRequest {
    let mut idp = IdpConfig::default();
    if with_identity {
        idp.create_organization = true;
        idp.create_admin_user = true;
    }
    ProvisioningRequest::builder(TenantKey::new(key).unwrap(), tier)
        .with_display_name(format!("{key} Inc."))
        .with_contact(Contact::primary(format!("admin@{key}.test"), "Admin"))
        .with_idp_config(idp)
        .build()
}

fn saga(stack: &InMemoryProviders) -> ProvisioningSaga {
    ProvisioningSaga::new(stack.providers(), fast_config())
}

/// Inverse operations in the order the drain invoked them.
fn drained_ops(stack: &InMemoryProviders) -> Vec<String> {
    stack
        .log()
        .entries()
        .into_iter()
        .filter(|e| INVERSE_OPS.contains(&e.as_str()))
        .collect()
}

async fn wait_for_operation(stack: &InMemoryProviders, operation: &str) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !stack.log().contains(operation) {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {operation}"
        );
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

// --- Happy path ---

#[tokio::test]
async fn happy_path_provisions_all_resources() {
    let stack = InMemoryProviders::new();
    let result = saga(&stack).run(request("acme", TenantTier::Pooled, true)).await;

    assert!(result.success, "expected success, got {:?}", result.error);
    assert_eq!(
        result.app_url.as_deref(),
        Some("https://acme.app.example.com")
    );
    assert_eq!(result.schema_name.as_deref(), Some("tenant_acme"));
    assert!(!result.compensation_executed);
    assert_eq!(result.compensations_executed, 0);

    // identity creation strictly precedes schema and storage provisioning
    let log = stack.log();
    let org = log.position_of("create_organization").unwrap();
    assert!(org < log.position_of("provision_schema").unwrap());
    assert!(org < log.position_of("provision_storage").unwrap());

    // terminal status visible to pollers
    assert_eq!(
        stack.tenant_status(&result.tenant_id),
        Some(TenantStatus::Active)
    );
    assert!(log.contains("send_welcome_email"));
    assert!(log.contains("notify_tenant_ready"));
    assert!(drained_ops(&stack).is_empty());
}

#[tokio::test]
async fn happy_path_without_identity_skips_identity_steps() {
    let stack = InMemoryProviders::new();
    let result = saga(&stack).run(request("acme", TenantTier::Pooled, false)).await;

    assert!(result.success);
    assert!(!stack.log().contains("create_organization"));
    assert!(!stack.log().contains("create_admin_user"));
}

// --- Validation ---

#[tokio::test]
async fn nil_tenant_id_is_rejected_naming_the_field() {
    let stack = InMemoryProviders::new();
    let mut req = request("acme", TenantTier::Pooled, false);
    req.tenant_id = TenantId::from_uuid(uuid::Uuid::nil());

    let result = saga(&stack).run(req).await;

    assert!(!result.success);
    assert!(result.error.as_deref().unwrap().contains("tenant_id"));
    assert!(!result.compensation_executed);
    // nothing was invoked at all
    assert!(stack.log().entries().is_empty());
}

#[tokio::test]
async fn missing_contacts_are_rejected_naming_the_field() {
    let stack = InMemoryProviders::new();
    let mut req = request("acme", TenantTier::Pooled, false);
    req.contacts.clear();

    let result = saga(&stack).run(req).await;

    assert!(!result.success);
    assert!(result.error.as_deref().unwrap().contains("contacts"));
    assert!(!result.compensation_executed);
}

#[tokio::test]
async fn duplicate_tenant_key_is_rejected_before_any_step() {
    let stack = InMemoryProviders::new();
    stack.register_existing_key(&TenantKey::new("taken").unwrap());

    let result = saga(&stack).run(request("taken", TenantTier::Pooled, false)).await;

    assert!(!result.success);
    assert!(result.error.as_deref().unwrap().contains("already provisioned"));
    assert!(!result.compensation_executed);
    assert!(!stack.log().contains("update_tenant_status"));
    assert!(!stack.log().contains("provision_schema"));
}

// --- Tier branching ---

#[tokio::test]
async fn pooled_tier_never_touches_infrastructure() {
    let stack = InMemoryProviders::new();
    let result = saga(&stack).run(request("acme", TenantTier::Pooled, false)).await;

    assert!(result.success);
    assert_eq!(stack.log().count_of("provision_infrastructure"), 0);
}

#[tokio::test]
async fn bridge_tier_never_touches_infrastructure() {
    let stack = InMemoryProviders::new();
    let result = saga(&stack).run(request("acme", TenantTier::Bridge, false)).await;

    assert!(result.success);
    assert_eq!(stack.log().count_of("provision_infrastructure"), 0);
}

#[tokio::test]
async fn silo_tier_provisions_infrastructure_once_before_deployment() {
    let stack = InMemoryProviders::new();
    let result = saga(&stack).run(request("acme", TenantTier::Silo, false)).await;

    assert!(result.success);
    let log = stack.log();
    assert_eq!(log.count_of("provision_infrastructure"), 1);
    assert!(
        log.position_of("provision_infrastructure").unwrap()
            < log.position_of("deploy_application").unwrap()
    );
}

// --- Failure and compensation ---

#[tokio::test]
async fn failed_step_compensates_prior_steps_in_reverse_order() {
    let stack = InMemoryProviders::new();
    // billing fails terminally after identity, schema, storage,
    // infrastructure and deployment have all completed
    stack.fail_always("create_customer", false);

    let result = saga(&stack).run(request("acme", TenantTier::Silo, true)).await;

    assert!(!result.success);
    assert!(result.compensation_executed);
    assert_eq!(
        drained_ops(&stack),
        vec![
            "rollback_deployment",
            "destroy_infrastructure",
            "deprovision_storage",
            "deprovision_schema",
            "delete_user",
            "delete_organization",
        ]
    );
    // the failed step itself contributed no compensation
    assert_eq!(stack.log().count_of("delete_customer"), 0);
    assert_eq!(
        stack.tenant_status(&result.tenant_id),
        Some(TenantStatus::Failed)
    );
    assert!(stack.log().contains("send_failure_email"));
}

#[tokio::test]
async fn retryable_failure_exhausts_attempt_budget_then_compensates() {
    let stack = InMemoryProviders::new();
    stack.fail_always("provision_storage", true);

    let result = saga(&stack).run(request("acme", TenantTier::Pooled, false)).await;

    assert!(!result.success);
    // invoked exactly max_attempts times
    assert_eq!(stack.log().count_of("provision_storage"), 3);
    assert!(result.error.as_deref().unwrap().contains("after 3 attempts"));
    assert!(result.compensation_executed);
    assert_eq!(drained_ops(&stack), vec!["deprovision_schema"]);
}

#[tokio::test]
async fn transient_failure_recovers_within_budget() {
    let stack = InMemoryProviders::new();
    stack.fail_times("provision_schema", 2, true);

    let result = saga(&stack).run(request("acme", TenantTier::Pooled, false)).await;

    assert!(result.success);
    assert_eq!(stack.log().count_of("provision_schema"), 3);
    assert!(drained_ops(&stack).is_empty());
}

#[tokio::test]
async fn non_retryable_failure_aborts_on_first_attempt() {
    let stack = InMemoryProviders::new();
    stack.fail_always("deploy_application", false);

    let result = saga(&stack).run(request("acme", TenantTier::Pooled, false)).await;

    assert!(!result.success);
    assert_eq!(stack.log().count_of("deploy_application"), 1);
    assert_eq!(
        drained_ops(&stack),
        vec!["deprovision_storage", "deprovision_schema"]
    );
}

#[tokio::test]
async fn skipped_identity_steps_push_no_compensation() {
    let stack = InMemoryProviders::new();
    stack.fail_always("deploy_application", false);

    let result = saga(&stack).run(request("acme", TenantTier::Pooled, false)).await;

    assert!(!result.success);
    assert!(!stack.log().contains("delete_organization"));
    assert!(!stack.log().contains("delete_user"));
}

#[tokio::test]
async fn compensation_failure_does_not_stop_the_drain() {
    let stack = InMemoryProviders::new();
    stack.fail_always("create_customer", false);
    stack.fail_always("destroy_infrastructure", true);

    let result = saga(&stack).run(request("acme", TenantTier::Silo, false)).await;

    assert!(!result.success);
    assert!(result.compensation_executed);
    // the drain continued past the stuck teardown
    assert_eq!(
        drained_ops(&stack),
        vec![
            "rollback_deployment",
            "destroy_infrastructure",
            "deprovision_storage",
            "deprovision_schema",
        ]
    );
    assert_eq!(result.compensations_executed, 4);
}

#[tokio::test]
async fn welcome_email_failure_is_swallowed() {
    let stack = InMemoryProviders::new();
    stack.fail_always("send_welcome_email", false);

    let result = saga(&stack).run(request("acme", TenantTier::Pooled, false)).await;

    assert!(result.success);
    assert_eq!(
        stack.tenant_status(&result.tenant_id),
        Some(TenantStatus::Active)
    );
}

#[tokio::test]
async fn failure_email_failure_does_not_change_the_verdict() {
    let stack = InMemoryProviders::new();
    stack.fail_always("provision_schema", false);
    stack.fail_always("send_failure_email", true);

    let result = saga(&stack).run(request("acme", TenantTier::Pooled, false)).await;

    assert!(!result.success);
    assert!(result.compensation_executed);
    assert_eq!(
        stack.tenant_status(&result.tenant_id),
        Some(TenantStatus::Failed)
    );
}

// --- Cancellation and status ---

#[tokio::test]
async fn cancellation_takes_effect_at_the_next_step_boundary() {
    let stack = InMemoryProviders::new();
    let gate = stack.gate("provision_storage");

    let handle = saga(&stack).start(request("acme", TenantTier::Pooled, false));

    // wait until the storage call is in flight, then cancel and let the
    // in-flight step finish
    wait_for_operation(&stack, "provision_storage").await;
    handle.cancel();
    gate.notify_one();

    let result = handle.result().await;

    assert!(!result.success);
    assert!(result.error.as_deref().unwrap().contains("cancelled"));
    assert!(result.compensation_executed);
    // the storage step completed before the signal was honored, so it is
    // compensated along with everything before it
    assert_eq!(
        drained_ops(&stack),
        vec!["deprovision_storage", "deprovision_schema"]
    );
    assert!(!stack.log().contains("deploy_application"));
    assert_eq!(
        stack.tenant_status(&result.tenant_id),
        Some(TenantStatus::Failed)
    );
}

#[tokio::test]
async fn status_progress_is_monotone_and_reaches_completion() {
    let stack = InMemoryProviders::new();
    let handle = saga(&stack).start(request("acme", TenantTier::Pooled, false));

    let mut samples = vec![handle.status().progress];
    while !stack.log().contains("notify_tenant_ready") {
        samples.push(handle.status().progress);
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    let result = handle.result().await;
    assert!(result.success);

    for window in samples.windows(2) {
        assert!(
            window[1] >= window[0],
            "progress regressed: {samples:?}"
        );
    }
}

#[tokio::test]
async fn progress_reaches_one_hundred_for_every_tier() {
    // skipped steps still contribute their weight, so completion always
    // reads 100 regardless of tier branching
    for tier in [TenantTier::Pooled, TenantTier::Silo, TenantTier::Bridge] {
        let stack = InMemoryProviders::new();
        let handle = saga(&stack).start(request("acme", tier, false));

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while handle.status().progress < 100 {
            assert!(
                tokio::time::Instant::now() < deadline,
                "progress stalled at {} for tier {tier}",
                handle.status().progress
            );
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        let result = handle.result().await;
        assert!(result.success);
    }
}

#[tokio::test]
async fn status_is_queryable_before_any_step_completes() {
    let stack = InMemoryProviders::new();
    let gate = stack.gate("tenant_key_exists");

    let handle = saga(&stack).start(request("acme", TenantTier::Pooled, false));
    let snapshot = handle.status();
    assert_eq!(snapshot.step, "check_duplicate_tenant");
    assert_eq!(snapshot.progress, 0);

    gate.notify_one();
    let result = handle.result().await;
    assert!(result.success);
}
