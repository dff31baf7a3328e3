//! # Provisioning Saga Controller
//!
//! Executes the fixed provisioning step sequence for one tenant, pushing
//! a compensation descriptor after every completed step and draining the
//! stack in reverse order on any terminal failure or cancellation.
//!
//! The controller never returns an error to its caller: every outcome is
//! folded into a [`ProvisioningResult`]. The surrounding durable-execution
//! substrate may replay `run` after a crash, so the step bodies stay
//! deterministic (no wall-clock reads, no randomness) and rely on the
//! step contracts being idempotent.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use provisioner_domain::{ProvisioningRequest, TenantId, TenantStatus};

use crate::compensation::{CompensationAction, CompensationDescriptor, CompensationStack};
use crate::config::SagaConfig;
use crate::error::ProvisioningError;
use crate::port::{OrganizationCreated, Providers};
use crate::retry::execute_with_retry;
use crate::state::ProvisioningState;

/// Fixed step names, surfaced through status snapshots and error messages.
pub mod steps {
    pub const CHECK_DUPLICATE_TENANT: &str = "check_duplicate_tenant";
    pub const MARK_TENANT_PROVISIONING: &str = "mark_tenant_provisioning";
    pub const CREATE_IDENTITY_ORGANIZATION: &str = "create_identity_organization";
    pub const CREATE_ADMIN_USER: &str = "create_admin_user";
    pub const PROVISION_SCHEMA: &str = "provision_schema";
    pub const PROVISION_STORAGE: &str = "provision_storage";
    pub const PROVISION_INFRASTRUCTURE: &str = "provision_infrastructure";
    pub const DEPLOY_APPLICATION: &str = "deploy_application";
    pub const CREATE_BILLING: &str = "create_billing";
    pub const SEND_WELCOME_NOTIFICATION: &str = "send_welcome_notification";
    pub const NOTIFY_TENANT_READY: &str = "notify_tenant_ready";
    pub const ACTIVATE_TENANT: &str = "activate_tenant";
}

/// Progress weight per step. Weights sum to 100 and are added whether the
/// step executed or was skipped for the tenant's tier/idp configuration,
/// so progress always reaches 100 on success.
mod weights {
    pub const MARK_TENANT_PROVISIONING: u8 = 5;
    pub const CREATE_IDENTITY_ORGANIZATION: u8 = 10;
    pub const CREATE_ADMIN_USER: u8 = 5;
    pub const PROVISION_SCHEMA: u8 = 15;
    pub const PROVISION_STORAGE: u8 = 10;
    pub const PROVISION_INFRASTRUCTURE: u8 = 20;
    pub const DEPLOY_APPLICATION: u8 = 15;
    pub const CREATE_BILLING: u8 = 10;
    pub const SEND_WELCOME_NOTIFICATION: u8 = 5;
    pub const NOTIFY_TENANT_READY: u8 = 5;
}

/// Terminal outcome of one saga execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningResult {
    pub success: bool,
    pub tenant_id: TenantId,
    /// Externally reachable application URL, set on success.
    pub app_url: Option<String>,
    /// Provisioned schema name, set on success.
    pub schema_name: Option<String>,
    pub error: Option<String>,
    /// Whether a compensation pass was attempted for this outcome.
    pub compensation_executed: bool,
    /// Steps that actually executed (skipped steps not counted).
    pub completed_steps: usize,
    /// Compensations attempted during unwind.
    pub compensations_executed: usize,
}

impl ProvisioningResult {
    fn completed(
        tenant_id: TenantId,
        app_url: String,
        schema_name: String,
        completed_steps: usize,
    ) -> Self {
        Self {
            success: true,
            tenant_id,
            app_url: Some(app_url),
            schema_name: Some(schema_name),
            error: None,
            compensation_executed: false,
            completed_steps,
            compensations_executed: 0,
        }
    }

    /// Failure before any step ran: validation, duplicate tenant, or a
    /// duplicate-check error. Nothing to compensate.
    fn rejected(tenant_id: TenantId, error: &ProvisioningError) -> Self {
        Self {
            success: false,
            tenant_id,
            app_url: None,
            schema_name: None,
            error: Some(error.to_string()),
            compensation_executed: false,
            completed_steps: 0,
            compensations_executed: 0,
        }
    }

    fn failed(
        tenant_id: TenantId,
        error: &ProvisioningError,
        completed_steps: usize,
        compensations_executed: usize,
    ) -> Self {
        Self {
            success: false,
            tenant_id,
            app_url: None,
            schema_name: None,
            error: Some(error.to_string()),
            compensation_executed: true,
            completed_steps,
            compensations_executed,
        }
    }

    /// Failure of the saga task itself (panic or abort in the spawned
    /// execution). Surfaced as a failed result rather than a panic in the
    /// caller.
    pub(crate) fn from_join_error(tenant_id: TenantId, message: String) -> Self {
        Self {
            success: false,
            tenant_id,
            app_url: None,
            schema_name: None,
            error: Some(message),
            compensation_executed: false,
            completed_steps: 0,
            compensations_executed: 0,
        }
    }
}

struct SagaOutputs {
    app_url: String,
    schema_name: String,
}

/// The saga controller. Cheap to clone; one instance can drive any number
/// of independent tenant executions.
#[derive(Clone)]
pub struct ProvisioningSaga {
    providers: Providers,
    config: SagaConfig,
}

impl ProvisioningSaga {
    pub fn new(providers: Providers, config: SagaConfig) -> Self {
        Self { providers, config }
    }

    pub fn config(&self) -> &SagaConfig {
        &self.config
    }

    /// Execute the full provisioning saga for one tenant.
    ///
    /// Never returns an error: validation failures, step failures,
    /// cancellation and compensation outcomes are all captured in the
    /// result.
    pub async fn run(&self, request: ProvisioningRequest) -> ProvisioningResult {
        let state = Arc::new(ProvisioningState::new(steps::CHECK_DUPLICATE_TENANT));
        self.run_with_state(state, request).await
    }

    pub(crate) async fn run_with_state(
        &self,
        state: Arc<ProvisioningState>,
        request: ProvisioningRequest,
    ) -> ProvisioningResult {
        let tenant_id = request.tenant_id;
        info!(
            tenant_id = %tenant_id,
            tenant_key = %request.tenant_key,
            tier = %request.tier,
            "tenant provisioning started"
        );

        if let Err(error) = validate_request(&request) {
            warn!(tenant_id = %tenant_id, error = %error, "provisioning request rejected");
            return ProvisioningResult::rejected(tenant_id, &error);
        }

        state.set_step(steps::CHECK_DUPLICATE_TENANT);
        match execute_with_retry(&self.config, steps::CHECK_DUPLICATE_TENANT, || {
            self.providers.registry.tenant_key_exists(&request.tenant_key)
        })
        .await
        {
            Ok(false) => {}
            Ok(true) => {
                let error = ProvisioningError::DuplicateTenant {
                    key: request.tenant_key.to_string(),
                };
                warn!(tenant_id = %tenant_id, error = %error, "provisioning request rejected");
                return ProvisioningResult::rejected(tenant_id, &error);
            }
            Err(error) => {
                warn!(tenant_id = %tenant_id, error = %error, "duplicate check failed");
                return ProvisioningResult::rejected(tenant_id, &error);
            }
        }

        let mut stack = CompensationStack::new();
        let mut completed = 0usize;
        match self
            .execute_steps(&state, &request, &mut stack, &mut completed)
            .await
        {
            Ok(outputs) => {
                info!(
                    tenant_id = %tenant_id,
                    app_url = %outputs.app_url,
                    schema_name = %outputs.schema_name,
                    completed_steps = completed,
                    "tenant provisioning completed"
                );
                ProvisioningResult::completed(
                    tenant_id,
                    outputs.app_url,
                    outputs.schema_name,
                    completed,
                )
            }
            Err(error) => self.abort(&request, stack, error, completed).await,
        }
    }

    /// The fixed step sequence. Cancellation is checked at every step
    /// boundary, never mid-step: an in-flight external call is allowed to
    /// finish before the signal is honored.
    async fn execute_steps(
        &self,
        state: &ProvisioningState,
        request: &ProvisioningRequest,
        stack: &mut CompensationStack,
        completed: &mut usize,
    ) -> Result<SagaOutputs, ProvisioningError> {
        let providers = &self.providers;
        let config = &self.config;

        enter_step(state, steps::MARK_TENANT_PROVISIONING)?;
        execute_with_retry(config, steps::MARK_TENANT_PROVISIONING, || {
            providers
                .registry
                .update_tenant_status(&request.tenant_id, TenantStatus::Provisioning)
        })
        .await?;
        *completed += 1;
        state.advance(weights::MARK_TENANT_PROVISIONING);

        // Identity steps run only when the idp config asks for them;
        // a skipped step pushes no compensation.
        let mut organization: Option<OrganizationCreated> = None;
        if request.idp_config.create_organization {
            enter_step(state, steps::CREATE_IDENTITY_ORGANIZATION)?;
            let created =
                execute_with_retry(config, steps::CREATE_IDENTITY_ORGANIZATION, || {
                    providers.identity.create_organization(&request.tenant_key)
                })
                .await?;
            stack.push(CompensationDescriptor::new(
                steps::CREATE_IDENTITY_ORGANIZATION,
                CompensationAction::DeleteOrganization {
                    org_id: created.org_id.clone(),
                },
            ));
            *completed += 1;
            organization = Some(created);
        }
        state.advance(weights::CREATE_IDENTITY_ORGANIZATION);

        if request.idp_config.create_admin_user {
            if let Some(org) = organization.as_ref() {
                enter_step(state, steps::CREATE_ADMIN_USER)?;
                let email = match request.primary_contact() {
                    Some(contact) => contact.email.clone(),
                    None => {
                        return Err(ProvisioningError::validation(
                            "contacts",
                            "admin user creation requires a primary contact",
                        ))
                    }
                };
                let created = execute_with_retry(config, steps::CREATE_ADMIN_USER, || {
                    providers.identity.create_admin_user(&email, &org.org_id)
                })
                .await?;
                stack.push(CompensationDescriptor::new(
                    steps::CREATE_ADMIN_USER,
                    CompensationAction::DeleteUser {
                        user_id: created.user_id.clone(),
                    },
                ));
                *completed += 1;
            }
        }
        state.advance(weights::CREATE_ADMIN_USER);

        enter_step(state, steps::PROVISION_SCHEMA)?;
        let schema = execute_with_retry(config, steps::PROVISION_SCHEMA, || {
            providers.schema.provision_schema(&request.tenant_key)
        })
        .await?;
        stack.push(CompensationDescriptor::new(
            steps::PROVISION_SCHEMA,
            CompensationAction::DeprovisionSchema {
                schema_name: schema.schema_name.clone(),
            },
        ));
        *completed += 1;
        state.advance(weights::PROVISION_SCHEMA);

        enter_step(state, steps::PROVISION_STORAGE)?;
        let storage = execute_with_retry(config, steps::PROVISION_STORAGE, || {
            providers.storage.provision_storage(&request.tenant_key)
        })
        .await?;
        stack.push(CompensationDescriptor::new(
            steps::PROVISION_STORAGE,
            CompensationAction::DeprovisionStorage {
                bucket_name: storage.bucket_name.clone(),
            },
        ));
        *completed += 1;
        state.advance(weights::PROVISION_STORAGE);

        // Pooled and bridge tenants share infrastructure; only silo gets
        // a dedicated stack. This is a branch, not a failure path.
        if request.tier.requires_dedicated_infrastructure() {
            enter_step(state, steps::PROVISION_INFRASTRUCTURE)?;
            let infrastructure =
                execute_with_retry(config, steps::PROVISION_INFRASTRUCTURE, || {
                    providers.infrastructure.provision_infrastructure(
                        &request.tenant_key,
                        request.tier,
                        &request.custom_variables,
                    )
                })
                .await?;
            stack.push(CompensationDescriptor::new(
                steps::PROVISION_INFRASTRUCTURE,
                CompensationAction::DestroyInfrastructure {
                    run_id: infrastructure.run_id.clone(),
                },
            ));
            *completed += 1;
            debug!(
                run_id = %infrastructure.run_id,
                resources = infrastructure.resources.len(),
                "dedicated infrastructure ready"
            );
        }
        state.advance(weights::PROVISION_INFRASTRUCTURE);

        enter_step(state, steps::DEPLOY_APPLICATION)?;
        let deployed = execute_with_retry(config, steps::DEPLOY_APPLICATION, || {
            providers.deployment.deploy_application(
                &request.tenant_key,
                &schema.schema_name,
                &storage.bucket_name,
            )
        })
        .await?;
        // Rollback is recorded before DNS: a DNS failure must still tear
        // the rollout down.
        stack.push(CompensationDescriptor::new(
            steps::DEPLOY_APPLICATION,
            CompensationAction::RollbackDeployment {
                deployment_id: deployed.deployment_id.clone(),
            },
        ));
        execute_with_retry(config, steps::DEPLOY_APPLICATION, || {
            providers
                .deployment
                .configure_dns(&request.tenant_key, &deployed.app_url)
        })
        .await?;
        *completed += 1;
        state.advance(weights::DEPLOY_APPLICATION);

        enter_step(state, steps::CREATE_BILLING)?;
        let customer = execute_with_retry(config, steps::CREATE_BILLING, || {
            providers.billing.create_customer(&request.tenant_id)
        })
        .await?;
        // Deleting the customer removes its subscriptions, so one
        // descriptor covers both billing calls.
        stack.push(CompensationDescriptor::new(
            steps::CREATE_BILLING,
            CompensationAction::DeleteBillingCustomer {
                customer_id: customer.customer_id.clone(),
            },
        ));
        execute_with_retry(config, steps::CREATE_BILLING, || {
            providers
                .billing
                .create_subscription(&customer.customer_id, &request.subscription.plan_id)
        })
        .await?;
        *completed += 1;
        state.advance(weights::CREATE_BILLING);

        enter_step(state, steps::SEND_WELCOME_NOTIFICATION)?;
        if let Err(failure) = providers
            .notification
            .send_welcome_email(&request.contacts, &deployed.app_url)
            .await
        {
            warn!(error = %failure, "welcome email delivery failed");
        }
        *completed += 1;
        state.advance(weights::SEND_WELCOME_NOTIFICATION);

        enter_step(state, steps::NOTIFY_TENANT_READY)?;
        execute_with_retry(config, steps::NOTIFY_TENANT_READY, || {
            providers
                .registry
                .notify_tenant_ready(&request.tenant_id, &deployed.app_url)
        })
        .await?;
        *completed += 1;
        state.advance(weights::NOTIFY_TENANT_READY);

        enter_step(state, steps::ACTIVATE_TENANT)?;
        execute_with_retry(config, steps::ACTIVATE_TENANT, || {
            providers
                .registry
                .update_tenant_status(&request.tenant_id, TenantStatus::Active)
        })
        .await?;

        Ok(SagaOutputs {
            app_url: deployed.app_url,
            schema_name: schema.schema_name,
        })
    }

    /// Terminal failure path: drain the compensation stack (best-effort),
    /// mark the tenant failed so pollers never see a stuck "provisioning"
    /// state, and send the failure notification.
    async fn abort(
        &self,
        request: &ProvisioningRequest,
        mut stack: CompensationStack,
        error: ProvisioningError,
        completed: usize,
    ) -> ProvisioningResult {
        error!(
            tenant_id = %request.tenant_id,
            error = %error,
            pending_compensations = stack.len(),
            "tenant provisioning aborted, unwinding"
        );

        let report = stack.drain_all(&self.providers).await;
        if !report.all_succeeded() {
            error!(
                tenant_id = %request.tenant_id,
                failed = report.failed(),
                "unresolved compensations require operator follow-up"
            );
        }

        if let Err(failure) = self
            .providers
            .registry
            .update_tenant_status(&request.tenant_id, TenantStatus::Failed)
            .await
        {
            error!(
                tenant_id = %request.tenant_id,
                error = %failure,
                "could not mark tenant as failed"
            );
        }

        if let Err(failure) = self
            .providers
            .notification
            .send_failure_email(&request.contacts, &error.to_string())
            .await
        {
            warn!(
                tenant_id = %request.tenant_id,
                error = %failure,
                "failure notification delivery failed"
            );
        }

        ProvisioningResult::failed(request.tenant_id, &error, completed, report.attempted())
    }
}

fn enter_step(
    state: &ProvisioningState,
    step: &'static str,
) -> Result<(), ProvisioningError> {
    if state.cancellation_requested() {
        info!(step, "cancellation observed at step boundary");
        return Err(ProvisioningError::Cancelled {
            step: step.to_string(),
        });
    }
    state.set_step(step);
    debug!(step, "entering step");
    Ok(())
}

/// Synchronous request validation. Failures here are non-retryable and
/// reach the caller before any step has run.
fn validate_request(request: &ProvisioningRequest) -> Result<(), ProvisioningError> {
    if request.tenant_id.is_nil() {
        return Err(ProvisioningError::validation("tenant_id", "is required"));
    }
    if request.display_name.trim().is_empty() {
        return Err(ProvisioningError::validation(
            "display_name",
            "must not be empty",
        ));
    }
    if request.contacts.is_empty() {
        return Err(ProvisioningError::validation(
            "contacts",
            "at least one contact is required",
        ));
    }
    let primaries = request.contacts.iter().filter(|c| c.primary).count();
    if primaries != 1 {
        return Err(ProvisioningError::validation(
            "contacts",
            format!("exactly one contact must be marked primary, found {primaries}"),
        ));
    }
    if request.idp_config.create_admin_user && !request.idp_config.create_organization {
        return Err(ProvisioningError::validation(
            "idp_config",
            "create_admin_user requires create_organization",
        ));
    }
    Ok(())
}
