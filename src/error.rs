// ODM Core - OverDrive loan acquisition
// Copyright (C) 2025 ODM Core contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Error types for loan acquisition
//!
//! A single error enum covers every stage of the pipeline. Which variants are
//! fatal is decided by the caller, not by the type:
//!
//! - `Manifest`, `Metadata`, `License*`, `ClientIdMismatch` abort the loan
//! - `PartDownload` aborts one part only
//! - `Cover` and `LoanReturn` are logged as warnings
//!
//! A downloaded part whose size disagrees with the manifest is not an error at
//! all; see [`crate::download::Verification`].

use crate::acquisition::AcquisitionStep;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, OdmError>;

#[derive(Debug, Error)]
pub enum OdmError {
    /// A required manifest node or attribute is absent or unparseable
    #[error("manifest field '{field}' {reason}")]
    Manifest { field: &'static str, reason: String },

    /// The embedded metadata document lacks a required element
    #[error("metadata field '{field}' {reason}")]
    Metadata { field: &'static str, reason: String },

    /// The acquisition server refused the license request
    #[error("license request rejected with HTTP {status}")]
    LicenseStatus { status: u16 },

    /// License text is missing signed fields or cannot be sent as a header
    #[error("license is malformed: {0}")]
    LicenseMalformed(String),

    /// License and client identifier come from different acquisition attempts
    #[error("license was issued to client '{actual}' but client '{expected}' was used")]
    ClientIdMismatch { expected: String, actual: String },

    /// One part could not be pulled from the content server
    #[error("part '{part}' download rejected with HTTP {status}")]
    PartDownload { part: String, status: u16 },

    #[error("cover download rejected with HTTP {status}")]
    Cover { status: u16 },

    #[error("loan return rejected with HTTP {status} (is it already returned?)")]
    LoanReturn { status: u16 },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// No response or body data within the configured limit
    #[error("no data received for {0:?}")]
    Timeout(std::time::Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A fatal step failed; carries the loan and step for reporting
    #[error("loan '{media_id}': {step} failed: {source}")]
    StepFailed {
        media_id: String,
        step: AcquisitionStep,
        #[source]
        source: Box<OdmError>,
    },
}

impl OdmError {
    pub fn missing_manifest_field(field: &'static str) -> Self {
        Self::Manifest {
            field,
            reason: "is missing".to_string(),
        }
    }

    pub fn missing_metadata_field(field: &'static str) -> Self {
        Self::Metadata {
            field,
            reason: "is missing".to_string(),
        }
    }

    /// Wrap this error with the loan and step it aborted
    pub fn in_step(self, media_id: impl Into<String>, step: AcquisitionStep) -> Self {
        Self::StepFailed {
            media_id: media_id.into(),
            step,
            source: Box::new(self),
        }
    }

    /// HTTP status code carried by this error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::LicenseStatus { status }
            | Self::PartDownload { status, .. }
            | Self::Cover { status }
            | Self::LoanReturn { status } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::StepFailed { source, .. } => source.status_code(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_error_names_field() {
        let err = OdmError::missing_manifest_field("EarlyReturnURL");
        assert_eq!(err.to_string(), "manifest field 'EarlyReturnURL' is missing");
    }

    #[test]
    fn test_step_failed_keeps_status() {
        let err = OdmError::LicenseStatus { status: 403 }
            .in_step("ABC-123", AcquisitionStep::AcquireLicense);

        assert_eq!(err.status_code(), Some(403));
        let message = err.to_string();
        assert!(message.contains("ABC-123"));
        assert!(message.contains("acquire license"));
        assert!(message.contains("403"));
    }
}
