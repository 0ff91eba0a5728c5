//! Content downloads
//!
//! Parts are streamed from the content server with the loan's license and
//! client identifier attached, then checked against the sizes the manifest
//! declares. The cover image is a plain download.

pub mod cover;
pub mod manager;
pub mod part;
pub mod progress;

// Re-export commonly used types
pub use manager::{DownloadManager, PartOutcome, PartsReport};
pub use part::{verify_part, PartFetcher, Verification};
pub use progress::{DownloadState, PartProgress, ProgressCallback};
