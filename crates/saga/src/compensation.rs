//!
//! # Compensation Stack
//!
//! Ordered record of the inverse operations for every step that has
//! completed, consumed LIFO on failure:
//!
//! ```text
//! Steps:        [schema] → [storage] → [deploy] → [FAIL]
//! Compensation:                        [rollback deploy] → [drop bucket] → [drop schema]
//! ```
//!
//! Each descriptor captures the created resource's identifier at push
//! time; the drain never re-derives identifiers from request data, because
//! request data may not uniquely identify a partially-created resource.
//!

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::port::{Providers, StepFailure};

/// Inverse operation for one completed step, with the captured output it
/// needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompensationAction {
    DeleteOrganization { org_id: String },
    DeleteUser { user_id: String },
    DeprovisionSchema { schema_name: String },
    DeprovisionStorage { bucket_name: String },
    DestroyInfrastructure { run_id: String },
    RollbackDeployment { deployment_id: String },
    DeleteBillingCustomer { customer_id: String },
}

impl CompensationAction {
    /// Short label for logs and reports.
    pub fn describe(&self) -> String {
        match self {
            CompensationAction::DeleteOrganization { org_id } => {
                format!("delete_organization({org_id})")
            }
            CompensationAction::DeleteUser { user_id } => format!("delete_user({user_id})"),
            CompensationAction::DeprovisionSchema { schema_name } => {
                format!("deprovision_schema({schema_name})")
            }
            CompensationAction::DeprovisionStorage { bucket_name } => {
                format!("deprovision_storage({bucket_name})")
            }
            CompensationAction::DestroyInfrastructure { run_id } => {
                format!("destroy_infrastructure({run_id})")
            }
            CompensationAction::RollbackDeployment { deployment_id } => {
                format!("rollback_deployment({deployment_id})")
            }
            CompensationAction::DeleteBillingCustomer { customer_id } => {
                format!("delete_customer({customer_id})")
            }
        }
    }
}

/// A (step, inverse-operation, captured-output) record pushed immediately
/// after the step succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensationDescriptor {
    pub step: String,
    pub action: CompensationAction,
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}

impl CompensationDescriptor {
    pub fn new(step: &str, action: CompensationAction) -> Self {
        Self {
            step: step.to_string(),
            action,
            recorded_at: chrono::Utc::now(),
        }
    }
}

/// Outcome of one attempted compensation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensationOutcome {
    pub step: String,
    pub action: String,
    /// `None` on success; the failure message otherwise.
    pub error: Option<String>,
}

/// Record of a full drain, for observability and operator follow-up.
/// Does not feed back into the saga verdict.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompensationReport {
    pub outcomes: Vec<CompensationOutcome>,
}

impl CompensationReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_none()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_some()).count()
    }

    /// True when every attempted compensation succeeded (vacuously true
    /// for an empty drain).
    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}

/// Append-only record of pushed compensations, drained LIFO.
#[derive(Debug, Default)]
pub struct CompensationStack {
    entries: Vec<CompensationDescriptor>,
}

impl CompensationStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the inverse for a step that just completed.
    pub fn push(&mut self, descriptor: CompensationDescriptor) {
        debug!(
            step = %descriptor.step,
            action = %descriptor.action.describe(),
            "compensation recorded"
        );
        self.entries.push(descriptor);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pending descriptors, most recently pushed first (drain order).
    pub fn pending(&self) -> Vec<&CompensationDescriptor> {
        self.entries.iter().rev().collect()
    }

    /// Invoke every recorded inverse operation in reverse completion
    /// order. A single failure is logged and recorded but never stops the
    /// drain: a stuck infrastructure teardown must not block the schema
    /// drop behind it.
    pub async fn drain_all(&mut self, providers: &Providers) -> CompensationReport {
        let mut report = CompensationReport::default();
        while let Some(descriptor) = self.entries.pop() {
            let action = descriptor.action.describe();
            match Self::apply(providers, &descriptor.action).await {
                Ok(()) => {
                    info!(step = %descriptor.step, action = %action, "compensation succeeded");
                    report.outcomes.push(CompensationOutcome {
                        step: descriptor.step,
                        action,
                        error: None,
                    });
                }
                Err(failure) => {
                    error!(
                        step = %descriptor.step,
                        action = %action,
                        error = %failure,
                        "compensation failed, operator follow-up required"
                    );
                    report.outcomes.push(CompensationOutcome {
                        step: descriptor.step,
                        action,
                        error: Some(failure.message),
                    });
                }
            }
        }
        report
    }

    async fn apply(providers: &Providers, action: &CompensationAction) -> Result<(), StepFailure> {
        match action {
            CompensationAction::DeleteOrganization { org_id } => {
                providers.identity.delete_organization(org_id).await
            }
            CompensationAction::DeleteUser { user_id } => {
                providers.identity.delete_user(user_id).await
            }
            CompensationAction::DeprovisionSchema { schema_name } => {
                providers.schema.deprovision_schema(schema_name).await
            }
            CompensationAction::DeprovisionStorage { bucket_name } => {
                providers.storage.deprovision_storage(bucket_name).await
            }
            CompensationAction::DestroyInfrastructure { run_id } => {
                providers.infrastructure.destroy_infrastructure(run_id).await
            }
            CompensationAction::RollbackDeployment { deployment_id } => {
                providers.deployment.rollback_deployment(deployment_id).await
            }
            CompensationAction::DeleteBillingCustomer { customer_id } => {
                providers.billing.delete_customer(customer_id).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_pending_order() {
        let mut stack = CompensationStack::new();
        stack.push(CompensationDescriptor::new(
            "provision_schema",
            CompensationAction::DeprovisionSchema {
                schema_name: "tenant_acme".to_string(),
            },
        ));
        stack.push(CompensationDescriptor::new(
            "provision_storage",
            CompensationAction::DeprovisionStorage {
                bucket_name: "acme-assets".to_string(),
            },
        ));

        assert_eq!(stack.len(), 2);
        let pending = stack.pending();
        // LIFO: most recent completion first
        assert_eq!(pending[0].step, "provision_storage");
        assert_eq!(pending[1].step, "provision_schema");
    }

    #[test]
    fn test_report_counters() {
        let report = CompensationReport {
            outcomes: vec![
                CompensationOutcome {
                    step: "a".to_string(),
                    action: "x".to_string(),
                    error: None,
                },
                CompensationOutcome {
                    step: "b".to_string(),
                    action: "y".to_string(),
                    error: Some("teardown stuck".to_string()),
                },
            ],
        };
        assert_eq!(report.attempted(), 2);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.all_succeeded());
        assert!(CompensationReport::default().all_succeeded());
    }

    #[test]
    fn test_descriptor_serde_round_trip() {
        let descriptor = CompensationDescriptor::new(
            "provision_infrastructure",
            CompensationAction::DestroyInfrastructure {
                run_id: "run-42".to_string(),
            },
        );
        let json = serde_json::to_string(&descriptor).unwrap();
        let parsed: CompensationDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.action, descriptor.action);
        assert_eq!(parsed.step, "provision_infrastructure");
    }
}
