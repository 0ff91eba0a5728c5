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


//! Acquire OverDrive loans from `.odm` manifests
//!
//! Given a loan manifest this crate negotiates a license, downloads every
//! part concurrently, verifies the parts against their declared sizes,
//! fetches the cover and returns the loan.
//!
//! ```rust,no_run
//! # use odm_core::{Acquisition, AcquisitionOptions, OverDriveClient};
//! # async fn example() -> odm_core::Result<()> {
//! let client = OverDriveClient::new(Default::default())?;
//! let report = Acquisition::new(client, AcquisitionOptions::default())
//!     .run(std::path::Path::new("book.odm"))
//!     .await?;
//! println!("parts: {:?}", report.parts.map(|p| p.to_string()));
//! # Ok(())
//! # }
//! ```

// Core modules
pub mod acquisition;
pub mod api;
pub mod download;
pub mod error;
pub mod file;
pub mod logging;
pub mod manifest;

// Re-export commonly used types for convenience
pub use acquisition::{Acquisition, AcquisitionOptions, AcquisitionReport, BatchRunner, Config};
pub use api::{ClientConfig, License, LicenseAgent, OverDriveClient};
pub use error::{OdmError, Result};
pub use manifest::{Manifest, Metadata, Part};
