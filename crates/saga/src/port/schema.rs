//! Database schema port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use provisioner_domain::TenantKey;

use super::StepResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaProvisioned {
    pub schema_name: String,
}

/// Port for tenant database schema provisioning.
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    /// Create the tenant's schema and run baseline migrations.
    async fn provision_schema(&self, tenant_key: &TenantKey) -> StepResult<SchemaProvisioned>;

    /// Drop the named schema. Consumes the captured `schema_name`, never
    /// a name re-derived from the tenant key.
    async fn deprovision_schema(&self, schema_name: &str) -> StepResult<()>;
}
