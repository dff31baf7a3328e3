//! Dedicated-infrastructure port, used by silo-tier tenants only.
//!
//! Implementations typically drive a Terraform (or equivalent) plan/apply
//! cycle; the saga only sees the run handle and its outputs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use provisioner_domain::{TenantKey, TenantTier};

use super::StepResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfrastructureProvisioned {
    /// Handle for the apply run; consumed by the destroy inverse.
    pub run_id: String,
    /// Output values exported by the infrastructure stack.
    pub outputs: HashMap<String, serde_json::Value>,
    /// Identifiers of the resources that were created.
    pub resources: Vec<String>,
}

/// Port for dedicated tenant infrastructure.
#[async_trait]
pub trait InfrastructureProvider: Send + Sync {
    async fn provision_infrastructure(
        &self,
        tenant_key: &TenantKey,
        tier: TenantTier,
        variables: &HashMap<String, String>,
    ) -> StepResult<InfrastructureProvisioned>;

    async fn destroy_infrastructure(&self, run_id: &str) -> StepResult<()>;
}
