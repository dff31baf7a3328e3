//! Application deployment and DNS port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use provisioner_domain::TenantKey;

use super::StepResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationDeployed {
    /// Handle for the rollout; consumed by the rollback inverse.
    pub deployment_id: String,
    pub app_url: String,
}

/// Port for application rollout and tenant DNS.
#[async_trait]
pub trait DeploymentProvider: Send + Sync {
    /// Deploy the application artifacts against the tenant's schema and
    /// bucket.
    async fn deploy_application(
        &self,
        tenant_key: &TenantKey,
        schema_name: &str,
        bucket_name: &str,
    ) -> StepResult<ApplicationDeployed>;

    /// Inverse of [`deploy_application`](Self::deploy_application). Also
    /// supersedes any DNS records the rollout configured.
    async fn rollback_deployment(&self, deployment_id: &str) -> StepResult<()>;

    /// Point the tenant's DNS records at the deployed application.
    async fn configure_dns(&self, tenant_key: &TenantKey, app_url: &str) -> StepResult<()>;
}
