//! Identity-provider port: tenant organizations and admin users.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use provisioner_domain::TenantKey;

use super::StepResult;

/// Output of organization creation; `org_id` is what the inverse
/// operation consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationCreated {
    pub org_id: String,
    pub login_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUserCreated {
    pub user_id: String,
}

/// Port for the tenant's identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create a dedicated identity organization for the tenant.
    async fn create_organization(&self, tenant_key: &TenantKey)
        -> StepResult<OrganizationCreated>;

    /// Create the initial admin user inside an existing organization.
    async fn create_admin_user(&self, email: &str, org_id: &str) -> StepResult<AdminUserCreated>;

    /// Inverse of [`create_organization`](Self::create_organization).
    async fn delete_organization(&self, org_id: &str) -> StepResult<()>;

    /// Inverse of [`create_admin_user`](Self::create_admin_user).
    async fn delete_user(&self, user_id: &str) -> StepResult<()>;
}
