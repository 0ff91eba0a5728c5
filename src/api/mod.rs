//! Lending service client
//!
//! This module talks to the three servers a loan involves:
//! - the license server (`License/AcquisitionUrl`)
//! - the content server (`Protocol@baseurl`), see [`crate::download`]
//! - the lending service's early-return endpoint
//!
//! Every request carries the emulated client's `User-Agent`.

pub mod client;
pub mod license;
pub mod loan;

// Re-export commonly used types
pub use client::{ClientConfig, OverDriveClient};
pub use license::{auth_hash, License, LicenseAgent};
