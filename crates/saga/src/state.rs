//!
//! # Provisioning State
//!
//! Mutable progress record for one saga execution. Written only by the
//! saga controller at step boundaries; read concurrently by status
//! queries. Cancellation is a cooperative flag checked between steps.
//!

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// Read-only view of a saga's progress, safe to hand to external
/// observers at any point in the saga lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Name of the step the saga is currently in (or about to enter).
    pub step: String,
    /// Completion percentage, 0-100, monotonically non-decreasing.
    pub progress: u8,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug)]
struct ProgressCell {
    step: &'static str,
    progress: u8,
}

/// Progress record owned by one saga execution.
#[derive(Debug)]
pub struct ProvisioningState {
    cell: RwLock<ProgressCell>,
    started_at: chrono::DateTime<chrono::Utc>,
    cancelled: AtomicBool,
}

impl ProvisioningState {
    /// New state positioned at the first step with zero progress.
    pub fn new(first_step: &'static str) -> Self {
        Self {
            cell: RwLock::new(ProgressCell {
                step: first_step,
                progress: 0,
            }),
            started_at: chrono::Utc::now(),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Record entry into a step. Called by the controller only.
    pub fn set_step(&self, step: &'static str) {
        self.cell.write().expect("state lock poisoned").step = step;
    }

    /// Advance progress by a step's weight, clamped at 100.
    ///
    /// Progress never decreases; weights are additive across both
    /// executed and skipped steps so a completed saga always reads 100.
    pub fn advance(&self, weight: u8) {
        let mut cell = self.cell.write().expect("state lock poisoned");
        cell.progress = cell.progress.saturating_add(weight).min(100);
    }

    pub fn current_step(&self) -> &'static str {
        self.cell.read().expect("state lock poisoned").step
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let cell = self.cell.read().expect("state lock poisoned");
        StatusSnapshot {
            step: cell.step.to_string(),
            progress: cell.progress,
            started_at: self.started_at,
        }
    }

    /// Request a cooperative cancellation, honored at the next step
    /// boundary. Never interrupts an in-flight external call.
    pub fn request_cancellation(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn cancellation_requested(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
