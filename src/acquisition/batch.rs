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


//! Running many loans
//!
//! A path names either one manifest or a directory of `*.odm` files. Loans
//! run one after another and a failed loan never stops the batch.

use crate::acquisition::orchestrator::{Acquisition, AcquisitionReport};
use crate::error::{OdmError, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Manifest file extension looked for in directories
pub const MANIFEST_EXTENSION: &str = "odm";

/// Outcome of one loan in a batch
#[derive(Debug)]
pub struct LoanResult {
    pub manifest: PathBuf,
    pub outcome: Result<AcquisitionReport>,
}

impl LoanResult {
    pub fn succeeded(&self) -> bool {
        matches!(&self.outcome, Ok(report) if report.is_success())
    }
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub loans: Vec<LoanResult>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.loans.iter().filter(|l| l.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.loans.len() - self.succeeded()
    }
}

pub struct BatchRunner {
    acquisition: Acquisition,
}

impl BatchRunner {
    pub fn new(acquisition: Acquisition) -> Self {
        Self { acquisition }
    }

    /// Resolve `target` into manifest files
    ///
    /// A file is taken as a manifest whatever its extension. A directory
    /// yields its `*.odm` files (not recursive), sorted by name.
    ///
    /// # Errors
    /// - `InvalidInput` - `target` does not exist
    /// - `Io` - the directory could not be listed
    pub fn resolve(target: &Path) -> Result<Vec<PathBuf>> {
        if target.is_file() {
            return Ok(vec![target.to_path_buf()]);
        }
        if !target.is_dir() {
            return Err(OdmError::InvalidInput(format!(
                "file or directory '{}' does not exist",
                target.display()
            )));
        }

        let mut manifests = Vec::new();
        for entry in std::fs::read_dir(target)? {
            let path = entry?.path();
            let is_manifest = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(MANIFEST_EXTENSION));
            if is_manifest && path.is_file() {
                manifests.push(path);
            }
        }
        manifests.sort();
        Ok(manifests)
    }

    /// Acquire every loan under `target`
    ///
    /// # Errors
    /// Only when `target` cannot be resolved; loan failures are in the summary.
    pub async fn run(&self, target: &Path) -> Result<BatchSummary> {
        let manifests = Self::resolve(target)?;
        if manifests.is_empty() {
            warn!(path = %target.display(), "no manifests found");
        }

        let mut summary = BatchSummary::default();
        for manifest in manifests {
            info!(path = %manifest.display(), "starting loan");
            let outcome = self.acquisition.run(&manifest).await;
            if let Err(e) = &outcome {
                error!("book couldn't be downloaded: {e}");
            }
            summary.loans.push(LoanResult { manifest, outcome });
        }

        info!(
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            "batch finished"
        );
        Ok(summary)
    }
}
