//! Common Utilities and Types Library
//!
//! This crate provides shared types and utilities used by the reference
//! models, the artifact format and the test vector harness.

pub mod types;
pub mod utils;

// Re-export commonly used items
pub use types::*;
pub use utils::*;
