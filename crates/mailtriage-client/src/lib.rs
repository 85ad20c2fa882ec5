//! # mailtriage-client
//!
//! Client side of the mailtriage email classification service.
//!
//! This crate provides:
//! - Single-flight request lifecycle controller with cancellation
//! - HTTP backend for the `/classify` and `/health` endpoints
//! - Presenter adapters (channel and tracing)
//! - Background health monitor
//! - Scripted mock backend (feature `mock`)
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mailtriage_client::{AnalysisController, ChannelPresenter, HttpClassifier};
//!
//! #[tokio::main]
//! async fn main() -> mailtriage_client::Result<()> {
//!     let backend = HttpClassifier::from_env()?;
//!     let (presenter, mut events) = ChannelPresenter::new();
//!     let controller = AnalysisController::new(Arc::new(backend), Arc::new(presenter));
//!
//!     controller.submit_text("Could you send the Q3 report?")?;
//!     while let Some(event) = events.recv().await {
//!         if event.is_terminal() {
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod health;
pub mod http;
pub mod lifecycle;
pub mod presenter;

// Scripted backend for tests
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use mailtriage_core::*;

pub use health::{ApiStatus, HealthMonitor, HealthMonitorHandle};
pub use http::HttpClassifier;
pub use lifecycle::{
    AnalysisController, ControllerBuilder, LifecycleState, RequestId, RequestOutcome,
};
pub use presenter::{AnalysisEvent, ChannelPresenter, TracingPresenter};
