//! Centralized default constants for the mailtriage client.
//!
//! Every crate references these constants instead of defining its own magic
//! numbers. `ClientConfig` starts from these values and environment variables
//! override them.

// =============================================================================
// SERVICE
// =============================================================================

/// Default base URL of the classification API (the `/api` prefix included).
pub const API_BASE: &str = "http://127.0.0.1:5000/api";

/// Path of the classification endpoint, relative to the API base.
pub const CLASSIFY_PATH: &str = "/classify";

/// Path of the health endpoint, relative to the API base.
pub const HEALTH_PATH: &str = "/health";

/// Timeout for a classification request in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// HEALTH MONITOR
// =============================================================================

/// Interval between health probes in seconds.
pub const HEALTH_INTERVAL_SECS: u64 = 60;

/// Timeout for a single health probe in seconds.
pub const HEALTH_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// INPUT LIMITS
// =============================================================================

/// Maximum upload size in bytes (16 MiB).
pub const MAX_FILE_BYTES: u64 = 16 * 1024 * 1024;

/// File extensions accepted for upload (lowercase, without the dot).
pub const ALLOWED_EXTENSIONS: &[&str] = &["txt", "pdf"];

/// Soft limit on pasted email text, in characters.
pub const TEXT_SOFT_LIMIT: usize = 10_000;

/// Percentage of the soft limit above which text usage is reported as a warning.
pub const TEXT_WARNING_PERCENT: usize = 70;

/// Percentage of the soft limit above which text usage is reported as critical.
pub const TEXT_CRITICAL_PERCENT: usize = 90;

// =============================================================================
// RESULTS
// =============================================================================

/// Confidence (0.0-1.0) at or above which a result is considered high confidence.
pub const CONFIDENCE_HIGH: f64 = 0.8;

/// Confidence (0.0-1.0) at or above which a result is considered medium confidence.
pub const CONFIDENCE_MEDIUM: f64 = 0.6;

/// Prefix of exported result files; the export date and `.json` are appended.
pub const EXPORT_FILE_PREFIX: &str = "email_analysis_";

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

/// Environment variable for the API base URL.
pub const ENV_API_BASE: &str = "MAILTRIAGE_API_BASE";

/// Environment variable for the maximum upload size in bytes.
pub const ENV_MAX_FILE_BYTES: &str = "MAILTRIAGE_MAX_FILE_BYTES";

/// Environment variable for the comma-separated list of allowed extensions.
pub const ENV_ALLOWED_EXTENSIONS: &str = "MAILTRIAGE_ALLOWED_EXTENSIONS";

/// Environment variable for the classification request timeout.
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "MAILTRIAGE_REQUEST_TIMEOUT_SECS";

/// Environment variable for the health probe interval.
pub const ENV_HEALTH_INTERVAL_SECS: &str = "MAILTRIAGE_HEALTH_INTERVAL_SECS";

/// Environment variable for the health probe timeout.
pub const ENV_HEALTH_TIMEOUT_SECS: &str = "MAILTRIAGE_HEALTH_TIMEOUT_SECS";
