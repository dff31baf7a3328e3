//! Billing port: customer and subscription records.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use provisioner_domain::TenantId;

use super::StepResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerCreated {
    pub customer_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionCreated {
    pub subscription_id: String,
}

/// Port for the billing system.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    async fn create_customer(&self, tenant_id: &TenantId) -> StepResult<CustomerCreated>;

    async fn create_subscription(
        &self,
        customer_id: &str,
        plan_id: &str,
    ) -> StepResult<SubscriptionCreated>;

    /// Inverse of [`create_customer`](Self::create_customer); removes the
    /// customer's subscriptions with it.
    async fn delete_customer(&self, customer_id: &str) -> StepResult<()>;
}
