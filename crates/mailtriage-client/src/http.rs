//! HTTP backend for the classification service.
//!
//! `POST {api_base}/classify` with a multipart body (`text` or `file` field)
//! and `GET {api_base}/health`.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use mailtriage_core::{
    AnalysisRequest, AnalysisResult, Classification, ClassificationBackend, ClientConfig, Error,
    Result,
};

/// Classification backend talking to the HTTP API.
pub struct HttpClassifier {
    config: ClientConfig,
    client: reqwest::Client,
    classify_url: String,
    health_url: String,
}

impl HttpClassifier {
    /// Create a backend from a validated configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            classify_url: config.classify_url(),
            health_url: config.health_url(),
            config,
            client,
        })
    }

    /// Create from `MAILTRIAGE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

/// Successful `/classify` response body.
#[derive(Deserialize)]
struct ClassifyResponse {
    classification: String,
    confidence: f64,
    suggested_response: String,
    original_text: String,
    #[serde(default)]
    processed_text: Option<String>,
    #[serde(default)]
    keywords: Option<Vec<String>>,
    #[serde(default)]
    timestamp: Option<String>,
}

/// Failure body: `{"error": "..."}`.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    /// Non-blank `error` field of `body`, if the body carries one.
    fn message_in(body: &[u8]) -> Option<String> {
        serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .filter(|message| !message.trim().is_empty())
    }
}

impl ClassifyResponse {
    fn into_result(self) -> Result<AnalysisResult> {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(Error::MalformedResponse(format!(
                "confidence out of range: {}",
                self.confidence
            )));
        }

        Ok(AnalysisResult {
            classification: Classification::from_label(&self.classification),
            label: self.classification,
            confidence: self.confidence,
            suggested_response: self.suggested_response,
            original_text: self.original_text,
            processed_text: self.processed_text,
            keywords: self.keywords.unwrap_or_default(),
            produced_at: self.timestamp.as_deref().and_then(parse_timestamp),
        })
    }
}

/// RFC 3339, or a naive ISO timestamp taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn build_form(request: &AnalysisRequest) -> Form {
    match request {
        AnalysisRequest::Text { text } => Form::new().text("text", text.clone()),
        AnalysisRequest::File {
            filename,
            bytes,
            mime_hint,
        } => {
            // `Bytes` clones share the buffer; the upload is never copied.
            let file_part = || {
                Part::stream_with_length(bytes.clone(), bytes.len() as u64)
                    .file_name(filename.clone())
            };
            let part = file_part().mime_str(mime_hint).unwrap_or_else(|e| {
                warn!(mime_hint = %mime_hint, error = %e, "Invalid MIME hint, sending without content type");
                file_part()
            });
            Form::new().part("file", part)
        }
    }
}

#[async_trait]
impl ClassificationBackend for HttpClassifier {
    #[instrument(skip(self, request), fields(payload_kind = request.field_name(), payload_len = request.payload_len()))]
    async fn classify(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        let start = Instant::now();

        let response = self
            .client
            .post(&self.classify_url)
            .multipart(build_form(request))
            .timeout(self.config.request_timeout())
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Classification request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read response body: {}", e)))?;

        debug!(
            status = status.as_u16(),
            body_len = body.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Classification response received"
        );

        if !status.is_success() {
            return Err(Error::Application {
                status: status.as_u16(),
                message: ErrorBody::message_in(&body),
            });
        }

        match serde_json::from_slice::<ClassifyResponse>(&body) {
            Ok(parsed) => parsed.into_result(),
            // A 2xx body may still be `{"success": false, "error": ...}`.
            Err(e) => match ErrorBody::message_in(&body) {
                Some(message) => Err(Error::Application {
                    status: status.as_u16(),
                    message: Some(message),
                }),
                None => Err(Error::MalformedResponse(e.to_string())),
            },
        }
    }

    async fn health_check(&self) -> Result<bool> {
        match self
            .client
            .get(&self.health_url)
            .timeout(self.config.health_timeout())
            .send()
            .await
        {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) => {
                debug!(error = %e, "Health probe failed");
                Ok(false)
            }
        }
    }

    fn endpoint(&self) -> &str {
        &self.config.api_base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_classifier_new_builds_urls() {
        let classifier = HttpClassifier::new(
            ClientConfig::default().with_api_base("http://localhost:5000/api/"),
        )
        .unwrap();
        assert_eq!(classifier.classify_url, "http://localhost:5000/api/classify");
        assert_eq!(classifier.health_url, "http://localhost:5000/api/health");
        assert_eq!(classifier.endpoint(), "http://localhost:5000/api/");
    }

    #[test]
    fn test_classifier_new_rejects_invalid_config() {
        let result = HttpClassifier::new(ClientConfig::default().with_api_base("ftp://x"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_classify_response_deserialization() {
        let json = r#"{
            "success": true,
            "classification": "Produtivo",
            "confidence": 0.92,
            "suggested_response": "Obrigado pelo contato.",
            "original_text": "Qual o status do meu chamado?",
            "processed_text": "status chamado",
            "keywords": ["status", "chamado"],
            "metadata": {"model": "gpt-3.5-turbo"},
            "timestamp": "2026-03-14T09:26:53.123456"
        }"#;

        let response: ClassifyResponse = serde_json::from_str(json).unwrap();
        let result = response.into_result().unwrap();
        assert_eq!(result.classification, Classification::Productive);
        assert_eq!(result.label, "Produtivo");
        assert_eq!(result.confidence, 0.92);
        assert_eq!(result.suggested_response, "Obrigado pelo contato.");
        assert_eq!(result.original_text, "Qual o status do meu chamado?");
        assert_eq!(result.processed_text.as_deref(), Some("status chamado"));
        assert_eq!(result.keywords, vec!["status", "chamado"]);
        assert!(result.produced_at.is_some());
    }

    #[test]
    fn test_classify_response_minimal() {
        let json = r#"{
            "classification": "Spam",
            "confidence": 0.4,
            "suggested_response": "",
            "original_text": "win a prize"
        }"#;

        let response: ClassifyResponse = serde_json::from_str(json).unwrap();
        let result = response.into_result().unwrap();
        assert_eq!(result.classification, Classification::Other);
        assert_eq!(result.label, "Spam");
        assert!(result.processed_text.is_none());
        assert!(result.keywords.is_empty());
        assert!(result.produced_at.is_none());
    }

    #[test]
    fn test_classify_response_rejects_out_of_range_confidence() {
        for confidence in [1.5, -0.1] {
            let response = ClassifyResponse {
                classification: "Produtivo".to_string(),
                confidence,
                suggested_response: String::new(),
                original_text: String::new(),
                processed_text: None,
                keywords: None,
                timestamp: None,
            };
            assert!(matches!(
                response.into_result(),
                Err(Error::MalformedResponse(_))
            ));
        }
    }

    #[test]
    fn test_classify_response_null_keywords() {
        let json = r#"{
            "classification": "Improdutivo",
            "confidence": 0.88,
            "suggested_response": "Obrigado!",
            "original_text": "Feliz natal",
            "processed_text": null,
            "keywords": null
        }"#;

        let response: ClassifyResponse = serde_json::from_str(json).unwrap();
        let result = response.into_result().unwrap();
        assert_eq!(result.classification, Classification::Unproductive);
        assert!(result.keywords.is_empty());
        assert!(result.processed_text.is_none());
    }

    #[test]
    fn test_error_body_message_in() {
        assert_eq!(
            ErrorBody::message_in(br#"{"error":"quota exceeded","success":false}"#).as_deref(),
            Some("quota exceeded")
        );
        assert_eq!(ErrorBody::message_in(br#"{"error":"  "}"#), None);
        assert_eq!(ErrorBody::message_in(b"not json"), None);
    }

    #[test]
    fn test_build_form_file_part() {
        let request = AnalysisRequest::file("mail.txt", b"hello".to_vec(), "not a mime");
        // An invalid hint still yields a form with the file field.
        let form = build_form(&request);
        assert!(!form.boundary().is_empty());
    }

    #[test]
    fn test_error_body_deserialization() {
        let body: ErrorBody = serde_json::from_str(r#"{"error":"model unavailable","success":false}"#).unwrap();
        assert_eq!(body.error.as_deref(), Some("model unavailable"));

        let body: ErrorBody = serde_json::from_str(r#"{"detail":"nope"}"#).unwrap();
        assert!(body.error.is_none());
    }

    #[test]
    fn test_parse_timestamp() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        assert_eq!(parse_timestamp("2026-03-14T09:26:53Z"), Some(expected));
        assert_eq!(parse_timestamp("2026-03-14T06:26:53-03:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-03-14T09:26:53"), Some(expected));
        assert!(parse_timestamp("2026-03-14T09:26:53.5").is_some());
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
