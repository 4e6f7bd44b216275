//! System-under-test bindings
//!
//! In validation runs the harness hands the generated inputs of every case to
//! a `SystemUnderTest` and compares what comes back with the reference
//! outputs. The harness does not know how the system computes its outputs.

use crate::binary::{read_array, ArrayData, ElementType};
use crate::literal::Literal;
use crate::InterfaceError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Inputs of one test case as seen by a system under test
#[derive(Debug, Clone)]
pub struct CaseInputs<'a> {
    pub block: &'a str,
    pub test_id: u32,
    /// Non-array configuration fields, by name
    pub config: &'a [(String, Literal)],
    /// Input arrays, by role
    pub inputs: &'a [(String, ArrayData)],
}

/// Shape of one output the system must produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    pub role: String,
    pub element: ElementType,
    pub nof_elements: usize,
}

/// A native implementation driven through a run-and-compare interface
pub trait SystemUnderTest {
    /// Human readable name used in logs
    fn name(&self) -> &str;

    /// Whether the system implements the named block
    fn supports(&self, block: &str) -> bool;

    /// Run one case and return the requested outputs, by role
    fn process(
        &mut self,
        case: &CaseInputs<'_>,
        outputs: &[OutputSpec],
    ) -> Result<Vec<(String, ArrayData)>, InterfaceError>;
}

/// Outputs dumped by the native suite, read back from a directory.
///
/// Files follow the harness naming, `<block>_test_<role><test_id>.dat`.
pub struct ReplayBindings {
    dir: PathBuf,
}

impl ReplayBindings {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_for(&self, block: &str, role: &str, test_id: u32) -> PathBuf {
        self.dir.join(format!("{}_test_{}{}.dat", block, role, test_id))
    }

    /// Directory the outputs are read from
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SystemUnderTest for ReplayBindings {
    fn name(&self) -> &str {
        "replay"
    }

    fn supports(&self, block: &str) -> bool {
        let prefix = format!("{}_test_", block);
        fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .any(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
            })
            .unwrap_or(false)
    }

    fn process(
        &mut self,
        case: &CaseInputs<'_>,
        outputs: &[OutputSpec],
    ) -> Result<Vec<(String, ArrayData)>, InterfaceError> {
        outputs
            .iter()
            .map(|spec| {
                let path = self.file_for(case.block, &spec.role, case.test_id);
                debug!("Replaying {} for test {}", path.display(), case.test_id);
                let nof_bits = (spec.element == ElementType::PackedBits).then_some(spec.nof_elements);
                read_array(&path, spec.element, nof_bits).map(|array| (spec.role.clone(), array))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::write_array;
    use tempfile::TempDir;

    #[test]
    fn test_replay_reads_dumped_outputs() {
        let dir = TempDir::new().unwrap();
        let expected = ArrayData::Bits(vec![1, 0, 1]);
        write_array(&dir.path().join("scrambler_test_output3.dat"), &expected).unwrap();

        let mut replay = ReplayBindings::new(dir.path());
        assert!(replay.supports("scrambler"));
        assert!(!replay.supports("descrambler"));

        let case = CaseInputs { block: "scrambler", test_id: 3, config: &[], inputs: &[] };
        let spec = OutputSpec { role: "output".to_string(), element: ElementType::PackedBits, nof_elements: 3 };
        let outputs = replay.process(&case, &[spec]).unwrap();
        assert_eq!(outputs, vec![("output".to_string(), expected)]);
    }

    #[test]
    fn test_replay_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut replay = ReplayBindings::new(dir.path());
        let case = CaseInputs { block: "scrambler", test_id: 0, config: &[], inputs: &[] };
        let spec = OutputSpec { role: "output".to_string(), element: ElementType::U8, nof_elements: 1 };
        assert!(replay.process(&case, &[spec]).is_err());
    }
}
