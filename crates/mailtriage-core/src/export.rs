//! Downloadable snapshot of a classification result.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::Result;
use crate::models::AnalysisResult;

/// JSON document written when a user saves a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSnapshot {
    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,
    /// Label as returned by the service.
    pub classification: String,
    pub confidence: f64,
    pub suggested_response: String,
    pub original_text: String,
    pub processed_text: Option<String>,
}

impl ResultSnapshot {
    pub fn new(result: &AnalysisResult, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            classification: result.label.clone(),
            confidence: result.confidence,
            suggested_response: result.suggested_response.clone(),
            original_text: result.original_text.clone(),
            processed_text: result.processed_text.clone(),
        }
    }

    /// Snapshot taken now.
    pub fn capture(result: &AnalysisResult) -> Self {
        Self::new(result, Utc::now())
    }

    /// `email_analysis_<YYYY-MM-DD>.json`, dated by the snapshot timestamp.
    pub fn file_name(&self) -> String {
        format!(
            "{}{}.json",
            defaults::EXPORT_FILE_PREFIX,
            self.timestamp.format("%Y-%m-%d")
        )
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the snapshot into `dir` and return the full path.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.file_name());
        std::fs::write(&path, self.to_json_pretty()?)?;
        Ok(path)
    }
}
