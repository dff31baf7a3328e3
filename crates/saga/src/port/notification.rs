//! Notification port: tenant-facing e-mail.
//!
//! Both operations are fire-and-forget from the saga's point of view: a
//! delivery failure is logged by the controller and never changes the
//! saga outcome.

use async_trait::async_trait;

use provisioner_domain::Contact;

use super::StepResult;

/// Port for outbound tenant notifications.
#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn send_welcome_email(&self, contacts: &[Contact], app_url: &str) -> StepResult<()>;

    async fn send_failure_email(&self, contacts: &[Contact], error: &str) -> StepResult<()>;
}
