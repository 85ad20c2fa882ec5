//! Scripted classification backend for deterministic testing.
//!
//! Each `classify` call takes the next queued response slot and waits until
//! the test fills it, so tests decide exactly when a request completes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let backend = MockBackend::new();
//! let slot = backend.expect_call();
//! controller.submit(AnalysisRequest::text("hello")?);
//! slot.respond(Ok(result));
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use mailtriage_core::{
    AnalysisRequest, AnalysisResult, Classification, ClassificationBackend, Error, Result,
};

/// Mock classification backend.
#[derive(Clone)]
pub struct MockBackend {
    inner: Arc<MockInner>,
}

struct MockInner {
    slots: Mutex<VecDeque<oneshot::Receiver<Result<AnalysisResult>>>>,
    calls: Mutex<Vec<AnalysisRequest>>,
    dropped_in_flight: AtomicUsize,
    healthy: AtomicBool,
}

/// Sending half of a queued response.
pub struct ResponseSlot {
    tx: oneshot::Sender<Result<AnalysisResult>>,
}

impl ResponseSlot {
    /// Complete the waiting call. Returns false when the call was already
    /// cancelled and nobody is listening.
    pub fn respond(self, response: Result<AnalysisResult>) -> bool {
        self.tx.send(response).is_ok()
    }
}

/// Counts `classify` futures dropped before their slot was filled.
struct InFlightGuard<'a> {
    counter: &'a AtomicUsize,
    armed: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.counter.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MockInner {
                slots: Mutex::new(VecDeque::new()),
                calls: Mutex::new(Vec::new()),
                dropped_in_flight: AtomicUsize::new(0),
                healthy: AtomicBool::new(true),
            }),
        }
    }

    /// Queue a slot for the next `classify` call.
    pub fn expect_call(&self) -> ResponseSlot {
        let (tx, rx) = oneshot::channel();
        self.inner.slots.lock().push_back(rx);
        ResponseSlot { tx }
    }

    /// Queue a response that is available immediately.
    pub fn with_response(self, response: Result<AnalysisResult>) -> Self {
        self.expect_call().respond(response);
        self
    }

    /// Requests received so far, in call order.
    pub fn calls(&self) -> Vec<AnalysisRequest> {
        self.inner.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.calls.lock().len()
    }

    /// Number of `classify` futures dropped while still waiting.
    pub fn dropped_in_flight(&self) -> usize {
        self.inner.dropped_in_flight.load(Ordering::SeqCst)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.inner.healthy.store(healthy, Ordering::SeqCst);
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClassificationBackend for MockBackend {
    async fn classify(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        self.inner.calls.lock().push(request.clone());
        let slot = self.inner.slots.lock().pop_front();
        let Some(rx) = slot else {
            return Err(Error::Transport("no scripted response".to_string()));
        };

        let mut guard = InFlightGuard {
            counter: &self.inner.dropped_in_flight,
            armed: true,
        };
        let response = rx
            .await
            .unwrap_or_else(|_| Err(Error::Transport("responder dropped".to_string())));
        guard.armed = false;
        response
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.inner.healthy.load(Ordering::SeqCst))
    }

    fn endpoint(&self) -> &str {
        "mock://classifier"
    }
}

/// Result fixture with the given label and confidence.
pub fn sample_result(label: &str, confidence: f64) -> AnalysisResult {
    AnalysisResult {
        classification: Classification::from_label(label),
        label: label.to_string(),
        confidence,
        suggested_response: format!("Suggested reply for {}", label),
        original_text: "Could you send the Q3 report?".to_string(),
        processed_text: Some("send q3 report".to_string()),
        keywords: vec!["report".to_string()],
        produced_at: None,
    }
}
