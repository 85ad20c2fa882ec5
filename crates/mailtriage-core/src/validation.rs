//! Pre-flight validation for analysis input.
//!
//! Everything here is pure: no I/O, no logging, no allocation beyond the
//! error messages. Failures are resolved by the caller before a request is
//! ever handed to the lifecycle controller.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::defaults;

/// Reason an input was rejected before submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Text payload is empty or whitespace only.
    #[error("Email text is empty")]
    EmptyText,

    /// File is larger than the configured maximum.
    #[error("File is too large ({}). Maximum allowed: {}", format_file_size(*size), format_file_size(*max_size))]
    TooLarge { size: u64, max_size: u64 },

    /// File extension is missing or not in the allowed set.
    #[error("Unsupported file format{}. Use: {}", extension.as_deref().map(|e| format!(" '.{e}'")).unwrap_or_default(), allowed.join(", "))]
    UnsupportedFormat {
        extension: Option<String>,
        allowed: Vec<String>,
    },
}

/// Outcome of validating one input.
pub type ValidationResult = std::result::Result<(), ValidationError>;

/// The two facts about a file the validator looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub name: String,
    pub size: u64,
}

impl FileCandidate {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// Upload constraints: maximum size and the allowed extension set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRules {
    pub max_size: u64,
    pub allowed_extensions: BTreeSet<String>,
}

impl Default for FileRules {
    fn default() -> Self {
        Self::new(
            defaults::MAX_FILE_BYTES,
            defaults::ALLOWED_EXTENSIONS.iter().copied(),
        )
    }
}

impl FileRules {
    /// Build rules from a size cap and extensions; extensions are normalized to
    /// lowercase without a leading dot.
    pub fn new<I, S>(max_size: u64, allowed_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed_extensions = allowed_extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self {
            max_size,
            allowed_extensions,
        }
    }

    pub fn validate(&self, file: &FileCandidate) -> ValidationResult {
        validate_file(file, self.max_size, &self.allowed_extensions)
    }
}

/// Validate a file against a size cap and an allowed extension set.
///
/// Size is checked first, so an oversized file is `TooLarge` whatever its
/// extension. The extension is the lowercased text after the last `.`; a
/// name without a dot has no extension and is unsupported.
pub fn validate_file(
    file: &FileCandidate,
    max_size: u64,
    allowed_extensions: &BTreeSet<String>,
) -> ValidationResult {
    if file.size > max_size {
        return Err(ValidationError::TooLarge {
            size: file.size,
            max_size,
        });
    }

    let extension = file_extension(&file.name);
    match extension {
        Some(ref ext) if allowed_extensions.contains(ext) => Ok(()),
        _ => Err(ValidationError::UnsupportedFormat {
            extension,
            allowed: allowed_extensions.iter().cloned().collect(),
        }),
    }
}

/// Reject empty or whitespace-only text.
pub fn validate_text(text: &str) -> ValidationResult {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyText);
    }
    Ok(())
}

/// Lowercased extension after the last `.`, or `None` when there is none.
///
/// `"report.PDF"` gives `pdf`; `"README"` and `"trailing."` give `None`.
pub fn file_extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// How close pasted text is to the soft character limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextUsage {
    Normal,
    Warning,
    Critical,
}

impl TextUsage {
    /// Classify a character count against `limit`.
    pub fn for_length(chars: usize, limit: usize) -> Self {
        let used = chars.saturating_mul(100);
        if used > limit.saturating_mul(defaults::TEXT_CRITICAL_PERCENT) {
            TextUsage::Critical
        } else if used > limit.saturating_mul(defaults::TEXT_WARNING_PERCENT) {
            TextUsage::Warning
        } else {
            TextUsage::Normal
        }
    }

    /// Classify `text` against the default soft limit.
    pub fn for_text(text: &str) -> Self {
        Self::for_length(text.chars().count(), defaults::TEXT_SOFT_LIMIT)
    }
}

/// Human-readable size: `0 Bytes`, `512 Bytes`, `1.5 KB`, `16 MB`.
///
/// Two decimals at most, trailing zeros dropped.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

/// Best-effort MIME type for an upload.
///
/// Magic bytes win (via `infer`), then the extension, then
/// `application/octet-stream`.
pub fn detect_mime_hint(filename: &str, data: &[u8]) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    let by_extension = match file_extension(filename).as_deref() {
        Some("txt") | Some("log") => Some("text/plain"),
        Some("eml") => Some("message/rfc822"),
        Some("pdf") => Some("application/pdf"),
        Some("md") => Some("text/markdown"),
        Some("html") | Some("htm") => Some("text/html"),
        _ => None,
    };

    by_extension
        .unwrap_or("application/octet-stream")
        .to_string()
}
