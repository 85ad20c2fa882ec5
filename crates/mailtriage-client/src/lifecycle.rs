//! Single-flight analysis request lifecycle.
//!
//! [`AnalysisController`] owns at most one outstanding classification
//! request. Submitting a new one cancels the previous one first; clearing
//! cancels whatever is in flight and forgets the last result. Outcomes reach
//! the UI only through the injected [`ResultPresenter`].
//!
//! ```text
//! Idle ──submit──▶ Loading ──┬─ 2xx ─────────▶ Completed ─┐
//!                            ├─ superseded ───▶ Cancelled ─┼─▶ Idle
//!                            └─ other failure ▶ Failed ────┘
//! ```
//!
//! The network future is raced against the request's cancellation token, so
//! a cancelled request drops its connection immediately. A response that
//! still slips through after cancellation is discarded by the request-id
//! check in the completion path and never touches the last result or the
//! presenter.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use mailtriage_core::{
    AnalysisRequest, AnalysisResult, ClassificationBackend, Error, FileCandidate, FileRules,
    NoopPresenter, Result, ResultPresenter, ResultSnapshot, ValidationError,
};

/// Identifier of one submitted request (UUIDv7, time-ordered).
pub type RequestId = Uuid;

/// Whether the controller is waiting on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Loading,
}

/// How the most recent request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Completed,
    Cancelled,
    Failed,
}

/// Cancellation handle of the request in flight.
#[derive(Debug, Clone)]
struct RequestHandle {
    id: RequestId,
    cancel: CancellationToken,
}

impl RequestHandle {
    fn new() -> Self {
        Self {
            id: Uuid::now_v7(),
            cancel: CancellationToken::new(),
        }
    }
}

#[derive(Default)]
struct ControllerState {
    active: Option<RequestHandle>,
    last_result: Option<Arc<AnalysisResult>>,
    last_outcome: Option<RequestOutcome>,
}

struct ControllerInner {
    backend: Arc<dyn ClassificationBackend>,
    presenter: Arc<dyn ResultPresenter>,
    rules: FileRules,
    state: Mutex<ControllerState>,
}

/// Owner of the analysis request lifecycle.
///
/// Cheap to clone; clones share the same state. Submitting requires a Tokio
/// runtime because each request runs on its own task.
#[derive(Clone)]
pub struct AnalysisController {
    inner: Arc<ControllerInner>,
}

impl AnalysisController {
    /// Controller with default upload rules.
    pub fn new(
        backend: Arc<dyn ClassificationBackend>,
        presenter: Arc<dyn ResultPresenter>,
    ) -> Self {
        Self::builder(backend).presenter(presenter).build()
    }

    pub fn builder(backend: Arc<dyn ClassificationBackend>) -> ControllerBuilder {
        ControllerBuilder::new(backend)
    }

    /// Submit a request, cancelling any request still in flight.
    ///
    /// Returns immediately; the outcome is delivered to the presenter.
    pub fn submit(&self, request: AnalysisRequest) -> RequestId {
        let handle = RequestHandle::new();
        let id = handle.id;

        {
            let mut state = self.inner.state.lock();
            if let Some(previous) = state.active.take() {
                debug!(superseded = %previous.id, request_id = %id, "Superseding in-flight request");
                previous.cancel.cancel();
                state.last_outcome = Some(RequestOutcome::Cancelled);
                self.inner.presenter.on_cancelled();
            }
            state.active = Some(handle.clone());
            self.inner.presenter.on_loading_changed(true);
        }

        info!(
            request_id = %id,
            payload_kind = request.field_name(),
            payload_len = request.payload_len(),
            endpoint = self.inner.backend.endpoint(),
            "Submitting analysis request"
        );

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.run(handle, request).await;
        });

        id
    }

    /// Validate and submit pasted text.
    pub fn submit_text(&self, text: &str) -> std::result::Result<RequestId, ValidationError> {
        let request = AnalysisRequest::text(text)?;
        Ok(self.submit(request))
    }

    /// Validate and submit an uploaded file.
    ///
    /// Rejected files never reach the backend.
    pub fn submit_file(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> std::result::Result<RequestId, ValidationError> {
        let candidate = FileCandidate::new(filename, bytes.len() as u64);
        self.inner.rules.validate(&candidate)?;
        Ok(self.submit(AnalysisRequest::file_detected(filename, bytes)))
    }

    /// Forget the last result and cancel the request in flight, if any.
    ///
    /// With nothing in flight this only resets state; no notifications are sent.
    pub fn clear(&self) {
        let mut state = self.inner.state.lock();
        state.last_result = None;

        match state.active.take() {
            Some(active) => {
                active.cancel.cancel();
                state.last_outcome = Some(RequestOutcome::Cancelled);
                info!(request_id = %active.id, "Cleared in-flight analysis request");
                self.inner.presenter.on_cancelled();
                self.inner.presenter.on_loading_changed(false);
            }
            None => {
                state.last_outcome = None;
                debug!("Cleared analysis state");
            }
        }
    }

    pub fn state(&self) -> LifecycleState {
        if self.inner.state.lock().active.is_some() {
            LifecycleState::Loading
        } else {
            LifecycleState::Idle
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state() == LifecycleState::Loading
    }

    /// Id of the request in flight.
    pub fn active_request(&self) -> Option<RequestId> {
        self.inner.state.lock().active.as_ref().map(|a| a.id)
    }

    pub fn last_result(&self) -> Option<Arc<AnalysisResult>> {
        self.inner.state.lock().last_result.clone()
    }

    pub fn last_outcome(&self) -> Option<RequestOutcome> {
        self.inner.state.lock().last_outcome
    }

    pub fn file_rules(&self) -> &FileRules {
        &self.inner.rules
    }

    /// Snapshot of the last result for download.
    pub fn export_last_result(&self) -> Result<ResultSnapshot> {
        let result = self
            .last_result()
            .ok_or_else(|| Error::NotFound("no analysis result to export".to_string()))?;
        Ok(ResultSnapshot::capture(&result))
    }
}

impl ControllerInner {
    async fn run(&self, handle: RequestHandle, request: AnalysisRequest) {
        let start = Instant::now();

        let outcome = tokio::select! {
            biased;
            _ = handle.cancel.cancelled() => {
                debug!(request_id = %handle.id, "Request cancelled, dropping network call");
                return;
            }
            outcome = self.backend.classify(&request) => outcome,
        };

        self.finish(&handle, outcome, start.elapsed());
    }

    fn finish(&self, handle: &RequestHandle, outcome: Result<AnalysisResult>, elapsed: Duration) {
        let mut state = self.state.lock();

        let is_current = state
            .active
            .as_ref()
            .is_some_and(|active| active.id == handle.id);
        if !is_current || handle.cancel.is_cancelled() {
            debug!(request_id = %handle.id, "Discarding response of superseded request");
            return;
        }
        state.active = None;

        let duration_ms = elapsed.as_millis() as u64;
        match outcome {
            Ok(result) => {
                let result = Arc::new(result);
                info!(
                    request_id = %handle.id,
                    classification = %result.classification,
                    confidence = result.confidence_percent(),
                    duration_ms,
                    "Analysis request completed"
                );
                state.last_result = Some(Arc::clone(&result));
                state.last_outcome = Some(RequestOutcome::Completed);
                self.presenter.on_loading_changed(false);
                self.presenter.on_result(&result);
            }
            Err(err) => {
                warn!(request_id = %handle.id, error = %err, duration_ms, "Analysis request failed");
                state.last_outcome = Some(RequestOutcome::Failed);
                self.presenter.on_loading_changed(false);
                self.presenter.on_error(&err.user_message());
            }
        }
    }
}

/// Builder for [`AnalysisController`].
pub struct ControllerBuilder {
    backend: Arc<dyn ClassificationBackend>,
    presenter: Arc<dyn ResultPresenter>,
    rules: FileRules,
}

impl ControllerBuilder {
    pub fn new(backend: Arc<dyn ClassificationBackend>) -> Self {
        Self {
            backend,
            presenter: Arc::new(NoopPresenter),
            rules: FileRules::default(),
        }
    }

    pub fn presenter(mut self, presenter: Arc<dyn ResultPresenter>) -> Self {
        self.presenter = presenter;
        self
    }

    pub fn file_rules(mut self, rules: FileRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn build(self) -> AnalysisController {
        AnalysisController {
            inner: Arc::new(ControllerInner {
                backend: self.backend,
                presenter: self.presenter,
                rules: self.rules,
                state: Mutex::new(ControllerState::default()),
            }),
        }
    }
}
