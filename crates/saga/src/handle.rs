//! # Saga Handle
//!
//! Detached execution surface: `start` spawns the saga onto the runtime
//! and returns a handle for status polling, cooperative cancellation, and
//! awaiting the terminal result.

use std::sync::Arc;
use tokio::task::JoinHandle;

use provisioner_domain::{ProvisioningRequest, TenantId};

use crate::saga::{steps, ProvisioningResult, ProvisioningSaga};
use crate::state::{ProvisioningState, StatusSnapshot};

/// Handle to one in-flight saga execution.
#[derive(Debug)]
pub struct SagaHandle {
    tenant_id: TenantId,
    state: Arc<ProvisioningState>,
    join: JoinHandle<ProvisioningResult>,
}

impl ProvisioningSaga {
    /// Spawn the saga onto the current tokio runtime and return a handle.
    ///
    /// The execution proceeds whether or not the handle is awaited;
    /// dropping the handle detaches it.
    pub fn start(&self, request: ProvisioningRequest) -> SagaHandle {
        let tenant_id = request.tenant_id;
        let state = Arc::new(ProvisioningState::new(steps::CHECK_DUPLICATE_TENANT));
        let saga = self.clone();
        let task_state = Arc::clone(&state);
        let join = tokio::spawn(async move { saga.run_with_state(task_state, request).await });
        SagaHandle {
            tenant_id,
            state,
            join,
        }
    }
}

impl SagaHandle {
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Progress snapshot, callable at any point in the saga lifetime.
    /// Consistent with the last completed step boundary.
    pub fn status(&self) -> StatusSnapshot {
        self.state.snapshot()
    }

    /// Request cooperative cancellation. Takes effect at the next step
    /// boundary; an in-flight external call is never interrupted.
    pub fn cancel(&self) {
        self.state.request_cancellation();
    }

    /// Wait for the terminal result. A panicked or aborted saga task is
    /// folded into a failed result rather than propagated.
    pub async fn result(self) -> ProvisioningResult {
        match self.join.await {
            Ok(result) => result,
            Err(join_error) => ProvisioningResult::from_join_error(
                self.tenant_id,
                format!("saga task terminated abnormally: {join_error}"),
            ),
        }
    }
}
