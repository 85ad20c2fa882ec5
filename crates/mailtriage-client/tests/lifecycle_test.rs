//! Request lifecycle tests over HTTP against a mock classification service.

use std::sync::Arc;
use std::time::Duration;

use mailtriage_client::{
    AnalysisController, AnalysisEvent, ChannelPresenter, ClientConfig, HttpClassifier,
    LifecycleState, RequestOutcome,
};
use tokio::sync::mpsc::UnboundedReceiver;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn controller(server: &MockServer) -> (AnalysisController, UnboundedReceiver<AnalysisEvent>) {
    let config = ClientConfig::default().with_api_base(format!("{}/api", server.uri()));
    let backend = HttpClassifier::new(config).expect("Failed to create classifier");
    let (presenter, rx) = ChannelPresenter::new();
    (
        AnalysisController::new(Arc::new(backend), Arc::new(presenter)),
        rx,
    )
}

async fn next_event(rx: &mut UnboundedReceiver<AnalysisEvent>) -> AnalysisEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for presenter event")
        .expect("presenter channel closed")
}

/// Wait until the server has seen `count` requests.
async fn wait_for_requests(server: &MockServer, count: usize) {
    for _ in 0..200 {
        let received = server.received_requests().await.unwrap_or_default();
        if received.len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("server never received {} request(s)", count);
}

fn body(label: &str, confidence: f64, text: &str) -> serde_json::Value {
    serde_json::json!({
        "classification": label,
        "confidence": confidence,
        "suggested_response": format!("Reply for {}", text),
        "original_text": text
    })
}

#[tokio::test]
async fn test_success_notifies_loading_then_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/classify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body("Produtivo", 0.92, "status?")))
        .expect(1)
        .mount(&server)
        .await;

    let (controller, mut rx) = controller(&server);
    controller.submit_text("status?").unwrap();

    assert_eq!(next_event(&mut rx).await, AnalysisEvent::LoadingChanged(true));
    assert_eq!(next_event(&mut rx).await, AnalysisEvent::LoadingChanged(false));
    match next_event(&mut rx).await {
        AnalysisEvent::Result(result) => {
            assert_eq!(result.label, "Produtivo");
            assert_eq!(result.confidence, 0.92);
            assert_eq!(result.suggested_response, "Reply for status?");
            assert_eq!(result.original_text, "status?");
        }
        other => panic!("Expected result, got {:?}", other),
    }
    assert_eq!(controller.state(), LifecycleState::Idle);
    assert_eq!(controller.last_outcome(), Some(RequestOutcome::Completed));
}

#[tokio::test]
async fn test_service_error_message_reaches_presenter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/classify"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(serde_json::json!({"error": "model unavailable"})),
        )
        .mount(&server)
        .await;

    let (controller, mut rx) = controller(&server);
    controller.submit_text("hello").unwrap();

    assert_eq!(next_event(&mut rx).await, AnalysisEvent::LoadingChanged(true));
    assert_eq!(next_event(&mut rx).await, AnalysisEvent::LoadingChanged(false));
    assert_eq!(
        next_event(&mut rx).await,
        AnalysisEvent::Error("model unavailable".to_string())
    );
    assert!(controller.last_result().is_none());
}

#[tokio::test]
async fn test_newer_request_supersedes_slow_one() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/classify"))
        .and(body_string_contains("first email"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(body("Improdutivo", 0.99, "first email"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/classify"))
        .and(body_string_contains("second email"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body("Produtivo", 0.8, "second email")))
        .expect(1)
        .mount(&server)
        .await;

    let (controller, mut rx) = controller(&server);
    controller.submit_text("first email").unwrap();
    wait_for_requests(&server, 1).await;
    let second = controller.submit_text("second email").unwrap();
    assert_eq!(controller.active_request(), Some(second));

    assert_eq!(next_event(&mut rx).await, AnalysisEvent::LoadingChanged(true));
    assert_eq!(next_event(&mut rx).await, AnalysisEvent::Cancelled);
    assert_eq!(next_event(&mut rx).await, AnalysisEvent::LoadingChanged(true));
    assert_eq!(next_event(&mut rx).await, AnalysisEvent::LoadingChanged(false));
    match next_event(&mut rx).await {
        AnalysisEvent::Result(result) => assert_eq!(result.original_text, "second email"),
        other => panic!("Expected second result, got {:?}", other),
    }

    // Outlive the slow response; nothing from the first request may surface.
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(controller.last_result().unwrap().original_text, "second email");
}

#[tokio::test]
async fn test_clear_cancels_in_flight_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/classify"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(body("Produtivo", 0.9, "hello"))
                .set_delay(Duration::from_secs(1)),
        )
        .mount(&server)
        .await;

    let (controller, mut rx) = controller(&server);
    controller.submit_text("hello").unwrap();
    wait_for_requests(&server, 1).await;
    controller.clear();

    assert_eq!(next_event(&mut rx).await, AnalysisEvent::LoadingChanged(true));
    assert_eq!(next_event(&mut rx).await, AnalysisEvent::Cancelled);
    assert_eq!(next_event(&mut rx).await, AnalysisEvent::LoadingChanged(false));

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(rx.try_recv().is_err(), "exactly one cancellation, no result");
    assert_eq!(controller.state(), LifecycleState::Idle);
    assert_eq!(controller.last_outcome(), Some(RequestOutcome::Cancelled));
    assert!(controller.last_result().is_none());
}

#[tokio::test]
async fn test_export_after_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/classify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body("Produtivo", 0.92, "status?")))
        .mount(&server)
        .await;

    let (controller, mut rx) = controller(&server);
    controller.submit_text("status?").unwrap();
    loop {
        if next_event(&mut rx).await.is_terminal() {
            break;
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let snapshot = controller.export_last_result().unwrap();
    let written = snapshot.write_to_dir(dir.path()).unwrap();

    let name = written.file_name().unwrap().to_str().unwrap().to_string();
    assert!(name.starts_with("email_analysis_"));
    assert!(name.ends_with(".json"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&written).unwrap()).unwrap();
    assert_eq!(json["classification"], "Produtivo");
    assert_eq!(json["confidence"], 0.92);
    assert_eq!(json["original_text"], "status?");
}
