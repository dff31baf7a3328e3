//! Tenant registry port: the control plane's record of tenants.

use async_trait::async_trait;

use provisioner_domain::{TenantId, TenantKey, TenantRecord, TenantStatus};

use super::StepResult;

/// Port for the tenant registry.
#[async_trait]
pub trait TenantRegistry: Send + Sync {
    /// Transition the tenant's status field. External systems poll this,
    /// so the saga keeps it truthful at every terminal transition.
    async fn update_tenant_status(
        &self,
        tenant_id: &TenantId,
        status: TenantStatus,
    ) -> StepResult<()>;

    async fn get_tenant_details(&self, tenant_id: &TenantId) -> StepResult<Option<TenantRecord>>;

    /// Whether the key is already taken by a provisioned (or in-flight)
    /// tenant. Drives duplicate-tenant rejection before any step runs.
    async fn tenant_key_exists(&self, tenant_key: &TenantKey) -> StepResult<bool>;

    /// Notify the application plane that the tenant is ready to serve.
    async fn notify_tenant_ready(&self, tenant_id: &TenantId, app_url: &str) -> StepResult<()>;
}
