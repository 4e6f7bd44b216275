//! Reference Models Library
//!
//! This crate implements the 5G NR physical layer reference models that
//! produce the expected outputs of the test vectors, according to
//! 3GPP TS 38.211, 38.212 and 38.213.

pub mod phy;

use thiserror::Error;

/// Errors raised by the reference models
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Processing error: {0}")]
    ProcessingError(String),
}
