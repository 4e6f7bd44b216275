//! Test Vector Harness
//!
//! Drives the reference oracles of the `layers` crate over the parameter
//! space of every block under test and turns each feasible parameter point
//! into one test case: binary data files plus one initializer line in the
//! block's header file. In validation runs the same cases are fed to a
//! system under test instead and its outputs are compared.

pub mod axis;
pub mod blocks;
pub mod combinations;
pub mod config;
pub mod contract;
pub mod output;
pub mod randomization;
pub mod registry;
pub mod runner;
pub mod validation;

pub use axis::{AxisKind, AxisValue, ParameterAxis, ParameterPoint};
pub use combinations::CombinationMode;
pub use config::{HarnessConfig, ValidationConfig};
pub use contract::{BlockDescriptor, BlockTest, CaseContext, CaseOutcome, TestVector, VectorField};
pub use output::{OutputDirectory, RunManifest};
pub use randomization::{RandomAxis, RandomizationState, TestIdAllocator};
pub use registry::{BlockRegistry, BlockSelection, RunMode};
pub use runner::{BlockReport, CaseMismatch};

use interfaces::InterfaceError;
use layers::LayerError;
use std::path::PathBuf;
use thiserror::Error;

/// Harness errors
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Unknown block: {0}")]
    UnknownBlock(String),

    #[error("Unknown run mode: {0}")]
    UnknownMode(String),

    #[error("Block {block} is not supported in {mode} mode")]
    UnsupportedMode { block: String, mode: String },

    #[error("Malformed axis {axis}: {reason}")]
    MalformedAxis { axis: String, reason: String },

    #[error("Field mismatch in {block}: {reason}")]
    FieldMismatch { block: String, reason: String },

    #[error("Missing artifact: {0}")]
    MissingArtifact(PathBuf),

    #[error("Contract violation in {block}: {reason}")]
    ContractViolation { block: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Reference failure: {0}")]
    Reference(#[from] LayerError),

    #[error(transparent)]
    Interface(#[from] InterfaceError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HarnessError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HarnessError::Io { path: path.into(), source }
    }
}
