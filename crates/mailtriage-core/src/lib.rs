//! # mailtriage-core
//!
//! Core types, validation and traits for the mailtriage email classification
//! client.
//!
//! This crate provides the data structures and trait definitions the client
//! crate builds on: analysis requests and results, pre-flight validation, the
//! error taxonomy, configuration, result export, and the backend/presenter
//! seams of the request lifecycle.

pub mod config;
pub mod defaults;
pub mod error;
pub mod export;
pub mod models;
pub mod traits;
pub mod validation;

// Re-export commonly used types at crate root
pub use config::ClientConfig;
pub use error::{Error, Result, GENERIC_NETWORK_ERROR, MALFORMED_RESPONSE_ERROR};
pub use export::ResultSnapshot;
pub use models::{
    confidence_percent, AnalysisRequest, AnalysisResult, Classification, ConfidenceLevel,
};
pub use traits::{ClassificationBackend, NoopPresenter, ResultPresenter};
pub use validation::{
    detect_mime_hint, file_extension, format_file_size, validate_file, validate_text,
    FileCandidate, FileRules, TextUsage, ValidationError, ValidationResult,
};
