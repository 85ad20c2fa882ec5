//! Presenter adapters for the request lifecycle.
//!
//! The controller only knows [`ResultPresenter`]. A UI that prefers to pull
//! notifications wires a [`ChannelPresenter`] and reads [`AnalysisEvent`]s
//! from the receiving end; [`TracingPresenter`] just logs.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use mailtriage_core::{AnalysisResult, ResultPresenter};

/// One presenter notification as a value.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisEvent {
    LoadingChanged(bool),
    Result(Arc<AnalysisResult>),
    Cancelled,
    Error(String),
}

impl AnalysisEvent {
    /// Whether this event ends a request (result, cancellation or error).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AnalysisEvent::LoadingChanged(_))
    }
}

/// Forwards notifications into an unbounded channel.
///
/// Sending never blocks, so it is safe to call under the controller's lock.
/// Notifications sent after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelPresenter {
    tx: mpsc::UnboundedSender<AnalysisEvent>,
}

impl ChannelPresenter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AnalysisEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: AnalysisEvent) {
        let _ = self.tx.send(event);
    }
}

impl ResultPresenter for ChannelPresenter {
    fn on_loading_changed(&self, is_loading: bool) {
        self.send(AnalysisEvent::LoadingChanged(is_loading));
    }

    fn on_result(&self, result: &AnalysisResult) {
        self.send(AnalysisEvent::Result(Arc::new(result.clone())));
    }

    fn on_cancelled(&self) {
        self.send(AnalysisEvent::Cancelled);
    }

    fn on_error(&self, message: &str) {
        self.send(AnalysisEvent::Error(message.to_string()));
    }
}

/// Logs every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingPresenter;

impl ResultPresenter for TracingPresenter {
    fn on_loading_changed(&self, is_loading: bool) {
        info!(is_loading, "Analysis loading state changed");
    }

    fn on_result(&self, result: &AnalysisResult) {
        info!(
            classification = %result.classification,
            label = %result.label,
            confidence = result.confidence_percent(),
            "Analysis completed"
        );
    }

    fn on_cancelled(&self) {
        info!("Analysis cancelled");
    }

    fn on_error(&self, message: &str) {
        warn!(error = %message, "Analysis failed");
    }
}
