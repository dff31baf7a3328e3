//! Object-storage port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use provisioner_domain::TenantKey;

use super::StepResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageProvisioned {
    pub bucket_name: String,
    pub region: String,
}

/// Port for tenant object-storage provisioning.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    async fn provision_storage(&self, tenant_key: &TenantKey) -> StepResult<StorageProvisioned>;

    async fn deprovision_storage(&self, bucket_name: &str) -> StepResult<()>;
}
