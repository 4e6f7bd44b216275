//! Test Vector Artifact Interfaces Library
//!
//! This crate provides the boundaries of the harness with the outside world:
//! the on-disk artifact format consumed by the native test suite (binary
//! data files and the generated header file) and the system-under-test
//! bindings used in validation runs.

pub mod binary;
pub mod literal;
pub mod header;
pub mod bindings;

pub use binary::{ArrayData, ElementType, ResourceGridEntry};
pub use bindings::{CaseInputs, OutputSpec, ReplayBindings, SystemUnderTest};
pub use header::{FieldKind, HeaderWriter, RecordField};
pub use literal::{Literal, LiteralStyle};

use std::path::PathBuf;
use thiserror::Error;

/// Interface errors
#[derive(Error, Debug)]
pub enum InterfaceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Unsupported literal value: {0}")]
    UnsupportedLiteral(String),

    #[error("Malformed artifact {path}: {reason}")]
    MalformedArtifact { path: PathBuf, reason: String },

    #[error("Header writer misuse: {0}")]
    HeaderState(String),

    #[error("Binding failure: {0}")]
    BindingFailure(String),
}

impl InterfaceError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InterfaceError::Io { path: path.into(), source }
    }
}
