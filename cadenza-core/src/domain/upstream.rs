//! Upstream status codes
//!
//! The generation provider reports job status as free-form strings, with
//! both current and legacy spellings in the wild. This module normalizes
//! them into a closed enum so the state machine stays exhaustive; codes we
//! have never seen are explicitly "still running" rather than errors.

use serde::{Deserialize, Serialize};

/// Normalized upstream job status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpstreamStatus {
    /// Task accepted, no audio yet (PENDING, TEXT_SUCCESS, TEXT)
    Pending,
    /// First variant finished, more may follow (FIRST_SUCCESS, FIRST)
    FirstSuccess,
    /// Provider considers the task done (SUCCESS, COMPLETE)
    Success,
    /// Fatal provider-side failure; carries the original code
    Error(String),
    /// Unrecognized code, treated as still running
    Unknown(String),
}

impl UpstreamStatus {
    /// Parses a raw status string, case-insensitively
    pub fn parse(raw: &str) -> Self {
        let code = raw.trim().to_ascii_uppercase();
        match code.as_str() {
            "PENDING" | "TEXT_SUCCESS" | "TEXT" => Self::Pending,
            "FIRST_SUCCESS" | "FIRST" => Self::FirstSuccess,
            "SUCCESS" | "COMPLETE" => Self::Success,
            "ERROR" | "CALLBACK_EXCEPTION" | "SENSITIVE_WORD_ERROR" => Self::Error(code),
            _ if code.ends_with("_FAILED") => Self::Error(code),
            _ => Self::Unknown(code),
        }
    }

    /// Returns true for codes that permanently fail the job
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}
