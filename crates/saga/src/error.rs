//!
//! # Error Types
//!
//! Central error taxonomy for the provisioning saga. Every error is
//! classified as retryable or terminal; the classification decides whether
//! the saga retries the failing step or aborts into compensation.
//!

use thiserror::Error;

/// Errors raised during a provisioning saga execution.
///
/// The saga controller never surfaces these to its caller directly; they
/// are folded into the terminal `ProvisioningResult`.
#[derive(Debug, Clone, Error)]
pub enum ProvisioningError {
    /// The request is structurally invalid. Retrying cannot change the
    /// outcome and no step has run, so nothing is compensated.
    #[error("validation failed for field '{field}': {message}")]
    Validation { field: &'static str, message: String },

    /// The tenant key is already provisioned.
    #[error("tenant key '{key}' is already provisioned")]
    DuplicateTenant { key: String },

    /// A named configuration the saga depends on does not exist.
    #[error("configuration not found: {name}")]
    ConfigurationNotFound { name: String },

    /// A step's external call failed. `retryable` records the
    /// classification the step implementation reported; by the time this
    /// error reaches the abort path the retry budget is already spent.
    #[error("step '{step}' failed: {message}")]
    StepExecution {
        step: &'static str,
        message: String,
        retryable: bool,
    },

    /// Operator-requested abort, observed at a step boundary.
    #[error("provisioning cancelled at step '{step}'")]
    Cancelled { step: String },

    /// An inverse operation failed while unwinding. Recorded in the
    /// compensation report; never alters the saga verdict.
    #[error("compensation for step '{step}' failed: {message}")]
    Compensation { step: String, message: String },
}

impl ProvisioningError {
    /// Whether the retry policy applies to this error at all.
    ///
    /// Validation, duplicate-tenant and configuration errors bypass retry
    /// entirely; cancellation is honored immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProvisioningError::Validation { .. } => false,
            ProvisioningError::DuplicateTenant { .. } => false,
            ProvisioningError::ConfigurationNotFound { .. } => false,
            ProvisioningError::Cancelled { .. } => false,
            ProvisioningError::Compensation { .. } => false,
            ProvisioningError::StepExecution { retryable, .. } => *retryable,
        }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ProvisioningError::Validation {
            field,
            message: message.into(),
        }
    }
}
