//! # provisioner-saga
//!
//! Tenant provisioning saga: sequences the heterogeneous external
//! operations that make up a tenant's resource set (identity, schema,
//! storage, optional dedicated infrastructure, deployment, billing,
//! notifications) as a single unit of work that either fully succeeds or
//! is fully unwound via compensating actions in reverse order.
//!
//! ## Architecture
//!
//! This crate holds the orchestration core only. Concrete step
//! implementations (identity-provider APIs, DDL execution, object stores,
//! Terraform runners, billing gateways) are consumed through the narrow
//! contracts in [`port`] and injected at composition time; the durable
//! execution substrate that replays the saga across process restarts is
//! likewise external.
//!
//! ## Modules
//!
//! - [`port`]: typed step contracts and the [`port::Providers`] composition
//! - [`saga`]: [`ProvisioningSaga`] controller and [`ProvisioningResult`]
//! - [`compensation`]: LIFO [`CompensationStack`] and drain report
//! - [`retry`]: [`RetryPolicy`] and the retrying step executor
//! - [`state`]: progress snapshot and cancellation flag
//! - [`handle`]: spawned execution surface ([`SagaHandle`])
//! - [`config`]: [`SagaConfig`] tunables
//! - [`telemetry`]: tracing initialization
//!
//! ## Usage
//!
//! ```ignore
//! use provisioner_saga::{ProvisioningSaga, SagaConfig};
//!
//! let saga = ProvisioningSaga::new(providers, SagaConfig::from_env());
//! let handle = saga.start(request);
//! println!("{:?}", handle.status());
//! let result = handle.result().await;
//! assert!(result.success);
//! ```

pub mod compensation;
pub mod config;
pub mod error;
pub mod handle;
pub mod port;
pub mod retry;
pub mod saga;
pub mod state;
pub mod telemetry;

pub use compensation::{
    CompensationAction, CompensationDescriptor, CompensationOutcome, CompensationReport,
    CompensationStack,
};
pub use config::SagaConfig;
pub use error::ProvisioningError;
pub use handle::SagaHandle;
pub use port::{
    AdminUserCreated, ApplicationDeployed, BillingProvider, CustomerCreated, DeploymentProvider,
    IdentityProvider, InfrastructureProvider, InfrastructureProvisioned, NotificationService,
    OrganizationCreated, Providers, SchemaProvider, SchemaProvisioned, StepFailure, StepResult,
    StorageProvider, StorageProvisioned, SubscriptionCreated, TenantRegistry,
};
pub use retry::{execute_with_retry, RetryPolicy};
pub use saga::{steps, ProvisioningResult, ProvisioningSaga};
pub use state::{ProvisioningState, StatusSnapshot};
pub use telemetry::{init_telemetry, TelemetryConfig, TelemetryGuard};
