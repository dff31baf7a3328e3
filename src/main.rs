// Demo binary: runs the provisioning saga against the in-memory provider
// stack, once on the happy path and once with an injected failure.
// Run: cargo run --bin tenant-provisioner

use anyhow::Result;
use tracing::info;

use provisioner_domain::{Contact, IdpConfig, ProvisioningRequest, TenantKey, TenantTier};
use provisioner_saga::{init_telemetry, ProvisioningSaga, SagaConfig, TelemetryConfig};
use provisioner_testing::InMemoryProviders;

fn demo_request(key: &str, tier: TenantTier) -> Result<ProvisioningRequest> {
    let idp = IdpConfig {
        provider: "auth0".to_string(),
        create_organization: true,
        create_admin_user: true,
        sso_enabled: true,
        mfa_required: false,
    };
    Ok(ProvisioningRequest::builder(TenantKey::new(key)?, tier)
        .with_display_name(format!("{key} (demo)"))
        .with_domain(format!("{key}.example.com"))
        .with_contact(Contact::primary(format!("admin@{key}.test"), "Admin"))
        .with_idp_config(idp)
        .build())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = init_telemetry(&TelemetryConfig::default());

    let config = SagaConfig::from_env();
    info!(max_attempts = config.retry.max_attempts, "starting demo provisioning run");

    // Happy path: a silo tenant with full identity setup
    let stack = InMemoryProviders::new();
    let saga = ProvisioningSaga::new(stack.providers(), config.clone());
    let handle = saga.start(demo_request("acme-corp", TenantTier::Silo)?);
    let result = handle.result().await;
    info!(
        success = result.success,
        app_url = result.app_url.as_deref().unwrap_or("-"),
        schema = result.schema_name.as_deref().unwrap_or("-"),
        "happy path finished"
    );

    // Failure path: billing rejects the tenant, everything unwinds
    let stack = InMemoryProviders::new();
    stack.fail_always("create_customer", false);
    let saga = ProvisioningSaga::new(stack.providers(), config);
    let result = saga.run(demo_request("umbrella", TenantTier::Silo)?).await;
    info!(
        success = result.success,
        error = result.error.as_deref().unwrap_or("-"),
        compensations = result.compensations_executed,
        "failure path finished"
    );

    Ok(())
}
