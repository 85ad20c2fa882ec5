//! Domain models: analysis requests and results.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::validation::{detect_mime_hint, validate_text, ValidationError};

/// Payload submitted for classification.
///
/// Serialized as multipart form data: field `text` for [`AnalysisRequest::Text`],
/// field `file` for [`AnalysisRequest::File`].
#[derive(Clone, PartialEq, Eq)]
pub enum AnalysisRequest {
    Text {
        text: String,
    },
    File {
        filename: String,
        bytes: Bytes,
        mime_hint: String,
    },
}

impl AnalysisRequest {
    /// Text payload; trimmed, and rejected when empty.
    pub fn text(text: impl AsRef<str>) -> Result<Self, ValidationError> {
        let text = text.as_ref();
        validate_text(text)?;
        Ok(AnalysisRequest::Text {
            text: text.trim().to_string(),
        })
    }

    /// File payload with an explicit MIME hint.
    pub fn file(
        filename: impl Into<String>,
        bytes: impl Into<Bytes>,
        mime_hint: impl Into<String>,
    ) -> Self {
        AnalysisRequest::File {
            filename: filename.into(),
            bytes: bytes.into(),
            mime_hint: mime_hint.into(),
        }
    }

    /// File payload whose MIME hint is sniffed from the content and name.
    pub fn file_detected(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let filename = filename.into();
        let bytes = bytes.into();
        let mime_hint = detect_mime_hint(&filename, &bytes);
        Self::file(filename, bytes, mime_hint)
    }

    /// Multipart field name carrying this payload.
    pub fn field_name(&self) -> &'static str {
        match self {
            AnalysisRequest::Text { .. } => "text",
            AnalysisRequest::File { .. } => "file",
        }
    }

    /// Payload size in bytes.
    pub fn payload_len(&self) -> usize {
        match self {
            AnalysisRequest::Text { text } => text.len(),
            AnalysisRequest::File { bytes, .. } => bytes.len(),
        }
    }
}

// File bytes can be megabytes; keep Debug output to the shape of the payload.
impl fmt::Debug for AnalysisRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisRequest::Text { text } => f
                .debug_struct("Text")
                .field("len", &text.len())
                .finish(),
            AnalysisRequest::File {
                filename,
                bytes,
                mime_hint,
            } => f
                .debug_struct("File")
                .field("filename", filename)
                .field("len", &bytes.len())
                .field("mime_hint", mime_hint)
                .finish(),
        }
    }
}

/// Category assigned by the classification service.
///
/// The service labels emails in Portuguese ("Produtivo" / "Improdutivo");
/// English labels are accepted too. Anything else is kept as `Other` and the
/// raw label stays on [`AnalysisResult::label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Productive,
    Unproductive,
    Other,
}

impl Classification {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "produtivo" | "productive" => Classification::Productive,
            "improdutivo" | "unproductive" => Classification::Unproductive,
            _ => Classification::Other,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Productive => write!(f, "productive"),
            Self::Unproductive => write!(f, "unproductive"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Coarse confidence band used to style results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    /// Band for a confidence in 0.0-1.0, judged on the rounded percentage.
    pub fn from_confidence(confidence: f64) -> Self {
        let percent = confidence_percent(confidence);
        if percent >= confidence_percent(defaults::CONFIDENCE_HIGH) {
            ConfidenceLevel::High
        } else if percent >= confidence_percent(defaults::CONFIDENCE_MEDIUM) {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// Confidence as a whole percentage, clamped to 0-100.
pub fn confidence_percent(confidence: f64) -> u8 {
    if !confidence.is_finite() {
        return 0;
    }
    (confidence.clamp(0.0, 1.0) * 100.0).round() as u8
}

/// Outcome of one successful classification. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub classification: Classification,
    /// Label exactly as returned by the service (e.g. `"Produtivo"`).
    pub label: String,
    /// Confidence in 0.0-1.0.
    pub confidence: f64,
    pub suggested_response: String,
    pub original_text: String,
    pub processed_text: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Time the service produced the result, when it reported one.
    pub produced_at: Option<DateTime<Utc>>,
}

impl AnalysisResult {
    pub fn confidence_percent(&self) -> u8 {
        confidence_percent(self.confidence)
    }

    pub fn confidence_level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_confidence(self.confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_request_trims() {
        let request = AnalysisRequest::text("  hello team \n").unwrap();
        assert_eq!(
            request,
            AnalysisRequest::Text {
                text: "hello team".to_string()
            }
        );
        assert_eq!(request.field_name(), "text");
        assert_eq!(request.payload_len(), 10);
    }

    #[test]
    fn test_text_request_rejects_blank() {
        assert_eq!(
            AnalysisRequest::text(" \t\n"),
            Err(ValidationError::EmptyText)
        );
    }

    #[test]
    fn test_file_request_detects_mime() {
        let request = AnalysisRequest::file_detected("mail.txt", b"Dear team".to_vec());
        match &request {
            AnalysisRequest::File { mime_hint, .. } => assert_eq!(mime_hint, "text/plain"),
            _ => panic!("Expected file request"),
        }
        assert_eq!(request.field_name(), "file");
        assert_eq!(request.payload_len(), 9);
    }

    #[test]
    fn test_request_debug_hides_content() {
        let request = AnalysisRequest::text("confidential contents").unwrap();
        let debug = format!("{:?}", request);
        assert!(!debug.contains("confidential"));
        assert!(debug.contains("len"));

        let request = AnalysisRequest::file("a.pdf", vec![0u8; 4096], "application/pdf");
        let debug = format!("{:?}", request);
        assert!(debug.contains("a.pdf"));
        assert!(debug.contains("4096"));
    }

    #[test]
    fn test_classification_from_label() {
        assert_eq!(
            Classification::from_label("Produtivo"),
            Classification::Productive
        );
        assert_eq!(
            Classification::from_label(" IMPRODUTIVO "),
            Classification::Unproductive
        );
        assert_eq!(
            Classification::from_label("productive"),
            Classification::Productive
        );
        assert_eq!(
            Classification::from_label("Unproductive"),
            Classification::Unproductive
        );
        assert_eq!(Classification::from_label("Spam"), Classification::Other);
        assert_eq!(Classification::from_label(""), Classification::Other);
    }

    #[test]
    fn test_classification_serde() {
        let json = serde_json::to_string(&Classification::Productive).unwrap();
        assert_eq!(json, "\"productive\"");
        let parsed: Classification = serde_json::from_str("\"other\"").unwrap();
        assert_eq!(parsed, Classification::Other);
    }

    #[test]
    fn test_confidence_percent() {
        assert_eq!(confidence_percent(0.92), 92);
        assert_eq!(confidence_percent(0.925), 93);
        assert_eq!(confidence_percent(0.0), 0);
        assert_eq!(confidence_percent(1.0), 100);
        assert_eq!(confidence_percent(1.7), 100);
        assert_eq!(confidence_percent(-0.2), 0);
        assert_eq!(confidence_percent(f64::NAN), 0);
    }

    #[test]
    fn test_confidence_levels() {
        assert_eq!(ConfidenceLevel::from_confidence(0.95), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_confidence(0.80), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_confidence(0.795), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_confidence(0.79), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_confidence(0.60), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_confidence(0.59), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_confidence(0.0), ConfidenceLevel::Low);
    }
}
