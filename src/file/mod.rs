//! Output layout and naming
//!
//! Everything a loan produces lands in one book folder next to its manifest.
//! The chapter and cover tools read these names, so they are fixed.

pub mod paths;

// Re-export commonly used types
pub use paths::{sanitize_component, PathBuilder};
