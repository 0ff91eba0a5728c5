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


//! Loan acquisition pipeline
//!
//! One [`Acquisition`] run takes a manifest file through a fixed sequence of
//! steps. Optional steps are switched by [`AcquisitionOptions`]:
//!
//! ```text
//! ParseManifest
//!   -> CreateBookDirectory   (any output step enabled)
//!   -> SaveMetadata          (save_metadata)
//!   -> AcquireLicense        (download_parts or save_license)
//!   -> SaveLicense           (save_license)
//!   -> DownloadParts         (download_parts)
//!   -> DownloadCover         (download_cover)
//!   -> ReturnLoan            (return_loan)
//! ```
//!
//! Everything up to and including `SaveLicense` is fatal: the loan stops and
//! is not returned. Failed parts make the acquisition incomplete but the
//! cover and return steps still run. Cover and return failures are warnings.

pub mod batch;
pub mod options;
pub mod orchestrator;

pub use batch::{BatchRunner, BatchSummary, LoanResult};
pub use options::{AcquisitionOptions, Config};
pub use orchestrator::{Acquisition, AcquisitionReport, StepOutcome};

use std::fmt;

/// Steps of an acquisition, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AcquisitionStep {
    ParseManifest,
    CreateBookDirectory,
    SaveMetadata,
    AcquireLicense,
    SaveLicense,
    DownloadParts,
    DownloadCover,
    ReturnLoan,
}

impl fmt::Display for AcquisitionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ParseManifest => "parse manifest",
            Self::CreateBookDirectory => "create book directory",
            Self::SaveMetadata => "save metadata",
            Self::AcquireLicense => "acquire license",
            Self::SaveLicense => "save license",
            Self::DownloadParts => "download parts",
            Self::DownloadCover => "download cover",
            Self::ReturnLoan => "return loan",
        })
    }
}
