//! In-memory implementations of every provisioning port.
//!
//! Outputs are deterministic functions of the tenant key, so assertions
//! can be written against concrete identifiers. Failure injection and
//! hang gates are keyed by operation name (the port method name).

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Notify;

use provisioner_domain::{Contact, TenantId, TenantKey, TenantRecord, TenantStatus, TenantTier};
use provisioner_saga::port::{
    AdminUserCreated, ApplicationDeployed, BillingProvider, CustomerCreated, DeploymentProvider,
    IdentityProvider, InfrastructureProvider, InfrastructureProvisioned, NotificationService,
    OrganizationCreated, Providers, SchemaProvider, SchemaProvisioned, StepFailure, StepResult,
    StorageProvider, StorageProvisioned, SubscriptionCreated, TenantRegistry,
};

use crate::invocation_log::InvocationLog;

/// Scripted failure for one operation.
#[derive(Debug, Clone, Copy)]
pub struct FailurePlan {
    /// `None` fails every invocation; `Some(n)` fails the next `n`.
    pub remaining: Option<u32>,
    pub retryable: bool,
}

#[derive(Debug, Default)]
struct Core {
    log: InvocationLog,
    failures: DashMap<String, FailurePlan>,
    gates: DashMap<String, Arc<Notify>>,
    existing_keys: DashMap<String, ()>,
    statuses: DashMap<TenantId, TenantStatus>,
    records: DashMap<TenantId, TenantRecord>,
}

impl Core {
    /// Common entry point for every operation: record, honor any hang
    /// gate, then apply the scripted failure if one is armed.
    async fn invoke(&self, operation: &str) -> Result<(), StepFailure> {
        self.log.record(operation);

        let gate = self.gates.get(operation).map(|g| Arc::clone(g.value()));
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut exhausted = false;
        if let Some(mut entry) = self.failures.get_mut(operation) {
            match entry.remaining {
                None => {
                    let plan = *entry;
                    drop(entry);
                    return Err(Self::failure(operation, plan));
                }
                Some(n) if n > 0 => {
                    entry.remaining = Some(n - 1);
                    let plan = *entry;
                    drop(entry);
                    return Err(Self::failure(operation, plan));
                }
                Some(_) => exhausted = true,
            }
        }
        if exhausted {
            self.failures.remove(operation);
        }
        Ok(())
    }

    fn failure(operation: &str, plan: FailurePlan) -> StepFailure {
        if plan.retryable {
            StepFailure::retryable(format!("injected failure in {operation}"))
        } else {
            StepFailure::permanent(format!("injected permanent failure in {operation}"))
        }
    }
}

/// One shared in-memory provider stack.
///
/// [`providers`](Self::providers) hands the same underlying state to the
/// saga under every port, so assertions observe exactly what the saga did.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProviders {
    core: Arc<Core>,
}

impl InMemoryProviders {
    pub fn new() -> Self {
        Self::default()
    }

    /// The provider set to hand to [`ProvisioningSaga::new`].
    ///
    /// [`ProvisioningSaga::new`]: provisioner_saga::ProvisioningSaga::new
    pub fn providers(&self) -> Providers {
        Providers {
            identity: self.core.clone(),
            schema: self.core.clone(),
            storage: self.core.clone(),
            infrastructure: self.core.clone(),
            deployment: self.core.clone(),
            billing: self.core.clone(),
            notification: self.core.clone(),
            registry: self.core.clone(),
        }
    }

    pub fn log(&self) -> &InvocationLog {
        &self.core.log
    }

    /// Fail every invocation of the operation.
    pub fn fail_always(&self, operation: &str, retryable: bool) {
        self.core.failures.insert(
            operation.to_string(),
            FailurePlan {
                remaining: None,
                retryable,
            },
        );
    }

    /// Fail the next `times` invocations of the operation, then succeed.
    pub fn fail_times(&self, operation: &str, times: u32, retryable: bool) {
        self.core.failures.insert(
            operation.to_string(),
            FailurePlan {
                remaining: Some(times),
                retryable,
            },
        );
    }

    /// Block the operation until the returned [`Notify`] is signalled.
    /// The invocation is still recorded before blocking, so tests can
    /// poll the log to know the saga has entered the step.
    pub fn gate(&self, operation: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.core
            .gates
            .insert(operation.to_string(), Arc::clone(&gate));
        gate
    }

    /// Pre-register a tenant key so duplicate detection trips.
    pub fn register_existing_key(&self, tenant_key: &TenantKey) {
        self.core
            .existing_keys
            .insert(tenant_key.as_str().to_string(), ());
    }

    pub fn seed_record(&self, record: TenantRecord) {
        self.core.records.insert(record.tenant_id, record);
    }

    /// Last status the saga wrote for the tenant, if any.
    pub fn tenant_status(&self, tenant_id: &TenantId) -> Option<TenantStatus> {
        self.core.statuses.get(tenant_id).map(|s| *s)
    }
}

#[async_trait]
impl IdentityProvider for Core {
    async fn create_organization(
        &self,
        tenant_key: &TenantKey,
    ) -> StepResult<OrganizationCreated> {
        self.invoke("create_organization").await?;
        Ok(OrganizationCreated {
            org_id: format!("org-{tenant_key}"),
            login_url: format!("https://{tenant_key}.login.example.com"),
        })
    }

    async fn create_admin_user(&self, email: &str, org_id: &str) -> StepResult<AdminUserCreated> {
        self.invoke("create_admin_user").await?;
        Ok(AdminUserCreated {
            user_id: format!("user-{email}-{org_id}"),
        })
    }

    async fn delete_organization(&self, _org_id: &str) -> StepResult<()> {
        self.invoke("delete_organization").await
    }

    async fn delete_user(&self, _user_id: &str) -> StepResult<()> {
        self.invoke("delete_user").await
    }
}

#[async_trait]
impl SchemaProvider for Core {
    async fn provision_schema(&self, tenant_key: &TenantKey) -> StepResult<SchemaProvisioned> {
        self.invoke("provision_schema").await?;
        Ok(SchemaProvisioned {
            schema_name: format!("tenant_{}", tenant_key.as_str().replace('-', "_")),
        })
    }

    async fn deprovision_schema(&self, _schema_name: &str) -> StepResult<()> {
        self.invoke("deprovision_schema").await
    }
}

#[async_trait]
impl StorageProvider for Core {
    async fn provision_storage(&self, tenant_key: &TenantKey) -> StepResult<StorageProvisioned> {
        self.invoke("provision_storage").await?;
        Ok(StorageProvisioned {
            bucket_name: format!("{tenant_key}-assets"),
            region: "eu-central-1".to_string(),
        })
    }

    async fn deprovision_storage(&self, _bucket_name: &str) -> StepResult<()> {
        self.invoke("deprovision_storage").await
    }
}

#[async_trait]
impl InfrastructureProvider for Core {
    async fn provision_infrastructure(
        &self,
        tenant_key: &TenantKey,
        _tier: TenantTier,
        variables: &HashMap<String, String>,
    ) -> StepResult<InfrastructureProvisioned> {
        self.invoke("provision_infrastructure").await?;
        let mut outputs = HashMap::new();
        outputs.insert(
            "vpc_id".to_string(),
            serde_json::Value::String(format!("vpc-{tenant_key}")),
        );
        for (name, value) in variables {
            outputs.insert(name.clone(), serde_json::Value::String(value.clone()));
        }
        Ok(InfrastructureProvisioned {
            run_id: format!("run-{tenant_key}"),
            outputs,
            resources: vec![
                format!("vpc-{tenant_key}"),
                format!("cluster-{tenant_key}"),
            ],
        })
    }

    async fn destroy_infrastructure(&self, _run_id: &str) -> StepResult<()> {
        self.invoke("destroy_infrastructure").await
    }
}

#[async_trait]
impl DeploymentProvider for Core {
    async fn deploy_application(
        &self,
        tenant_key: &TenantKey,
        _schema_name: &str,
        _bucket_name: &str,
    ) -> StepResult<ApplicationDeployed> {
        self.invoke("deploy_application").await?;
        Ok(ApplicationDeployed {
            deployment_id: format!("deploy-{tenant_key}"),
            app_url: format!("https://{tenant_key}.app.example.com"),
        })
    }

    async fn rollback_deployment(&self, _deployment_id: &str) -> StepResult<()> {
        self.invoke("rollback_deployment").await
    }

    async fn configure_dns(&self, _tenant_key: &TenantKey, _app_url: &str) -> StepResult<()> {
        self.invoke("configure_dns").await
    }
}

#[async_trait]
impl BillingProvider for Core {
    async fn create_customer(&self, tenant_id: &TenantId) -> StepResult<CustomerCreated> {
        self.invoke("create_customer").await?;
        Ok(CustomerCreated {
            customer_id: format!("cus-{tenant_id}"),
        })
    }

    async fn create_subscription(
        &self,
        customer_id: &str,
        plan_id: &str,
    ) -> StepResult<SubscriptionCreated> {
        self.invoke("create_subscription").await?;
        Ok(SubscriptionCreated {
            subscription_id: format!("sub-{plan_id}-{customer_id}"),
        })
    }

    async fn delete_customer(&self, _customer_id: &str) -> StepResult<()> {
        self.invoke("delete_customer").await
    }
}

#[async_trait]
impl NotificationService for Core {
    async fn send_welcome_email(&self, _contacts: &[Contact], _app_url: &str) -> StepResult<()> {
        self.invoke("send_welcome_email").await
    }

    async fn send_failure_email(&self, _contacts: &[Contact], _error: &str) -> StepResult<()> {
        self.invoke("send_failure_email").await
    }
}

#[async_trait]
impl TenantRegistry for Core {
    async fn update_tenant_status(
        &self,
        tenant_id: &TenantId,
        status: TenantStatus,
    ) -> StepResult<()> {
        self.invoke("update_tenant_status").await?;
        self.statuses.insert(*tenant_id, status);
        Ok(())
    }

    async fn get_tenant_details(&self, tenant_id: &TenantId) -> StepResult<Option<TenantRecord>> {
        self.invoke("get_tenant_details").await?;
        Ok(self.records.get(tenant_id).map(|r| r.clone()))
    }

    async fn tenant_key_exists(&self, tenant_key: &TenantKey) -> StepResult<bool> {
        self.invoke("tenant_key_exists").await?;
        Ok(self.existing_keys.contains_key(tenant_key.as_str()))
    }

    async fn notify_tenant_ready(&self, _tenant_id: &TenantId, _app_url: &str) -> StepResult<()> {
        self.invoke("notify_tenant_ready").await
    }
}
