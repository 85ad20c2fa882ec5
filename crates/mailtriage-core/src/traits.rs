//! Core traits for mailtriage abstractions.
//!
//! These traits are the seams between the lifecycle controller and the outside
//! world: the classification service on one side, the UI on the other.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AnalysisRequest, AnalysisResult};

// =============================================================================
// CLASSIFICATION BACKEND
// =============================================================================

/// Service that turns an email into an [`AnalysisResult`].
///
/// Implementations must be cancel-safe: the controller drops the `classify`
/// future when a request is superseded or cleared, and dropping it has to
/// release the underlying connection.
#[async_trait]
pub trait ClassificationBackend: Send + Sync {
    /// Classify one email.
    async fn classify(&self, request: &AnalysisRequest) -> Result<AnalysisResult>;

    /// Check if the classification service is reachable and healthy.
    async fn health_check(&self) -> Result<bool>;

    /// Base URL or other identifier of the service, for logs.
    fn endpoint(&self) -> &str;
}

// =============================================================================
// RESULT PRESENTER
// =============================================================================

/// Receiver of lifecycle notifications.
///
/// Calls are made synchronously while the controller holds its state lock, so
/// they arrive strictly in order. Implementations must return quickly and
/// must not call back into the controller.
pub trait ResultPresenter: Send + Sync {
    /// A request started (`true`) or the controller went back to idle (`false`).
    fn on_loading_changed(&self, is_loading: bool);

    /// The current request completed successfully.
    fn on_result(&self, result: &AnalysisResult);

    /// The current request was superseded or cleared. Not an error.
    fn on_cancelled(&self);

    /// The current request failed; `message` is ready to show to the user.
    fn on_error(&self, message: &str);
}

/// Presenter that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPresenter;

impl ResultPresenter for NoopPresenter {
    fn on_loading_changed(&self, _is_loading: bool) {}
    fn on_result(&self, _result: &AnalysisResult) {}
    fn on_cancelled(&self) {}
    fn on_error(&self, _message: &str) {}
}
