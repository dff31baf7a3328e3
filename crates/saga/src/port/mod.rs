//!
//! # Step Contract Layer
//!
//! Ports for the external capabilities the provisioning saga consumes.
//! Each port is a narrow typed contract: plain request/output structs and
//! a deterministic success/failure classification via [`StepFailure`].
//! Implementations (identity-provider APIs, schema DDL, object stores,
//! Terraform runners, billing gateways) live outside this crate and are
//! injected at composition time. Every operation must be safe to retry:
//! either naturally idempotent, or leaving partial effects that
//! compensation cleans up.
//!

pub mod billing;
pub mod deployment;
pub mod identity;
pub mod infrastructure;
pub mod notification;
pub mod registry;
pub mod schema;
pub mod storage;

pub use billing::{BillingProvider, CustomerCreated, SubscriptionCreated};
pub use deployment::{ApplicationDeployed, DeploymentProvider};
pub use identity::{AdminUserCreated, IdentityProvider, OrganizationCreated};
pub use infrastructure::{InfrastructureProvider, InfrastructureProvisioned};
pub use notification::NotificationService;
pub use registry::TenantRegistry;
pub use schema::{SchemaProvider, SchemaProvisioned};
pub use storage::{StorageProvider, StorageProvisioned};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// The full provider set one saga consumes, selected at composition time
/// (constructor injection; no runtime discovery).
#[derive(Clone)]
pub struct Providers {
    pub identity: Arc<dyn IdentityProvider>,
    pub schema: Arc<dyn SchemaProvider>,
    pub storage: Arc<dyn StorageProvider>,
    pub infrastructure: Arc<dyn InfrastructureProvider>,
    pub deployment: Arc<dyn DeploymentProvider>,
    pub billing: Arc<dyn BillingProvider>,
    pub notification: Arc<dyn NotificationService>,
    pub registry: Arc<dyn TenantRegistry>,
}

/// Failure reported by a step implementation.
///
/// The `retryable` flag is the implementation's deterministic
/// classification of the error: infrastructure hiccups are retryable,
/// structural rejections (invalid name, quota policy, already exists with
/// conflicting shape) are not.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct StepFailure {
    pub message: String,
    pub retryable: bool,
}

impl StepFailure {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }
}

/// Result type shared by all step contracts.
pub type StepResult<T> = Result<T, StepFailure>;
