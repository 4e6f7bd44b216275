//! Validation runs against systems under test

use common::types::ModulationScheme;
use harness::blocks::{LdpcSegmenterTest, ModulationMapperTest, PbchDmrsTest};
use harness::runner::{run_testvectors, run_validation};
use harness::{BlockRegistry, BlockSelection, HarnessConfig, HarnessError, RunMode};
use interfaces::{ArrayData, CaseInputs, InterfaceError, Literal, OutputSpec, ReplayBindings, SystemUnderTest};
use layers::phy::ModulationMapper;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn config(root: &Path) -> HarnessConfig {
    HarnessConfig { output_root: root.to_path_buf(), ..HarnessConfig::default() }
}

/// Modulation mapper computed in process
struct LoopbackMapper {
    /// Flip the sign of the first symbol of every case
    corrupt: bool,
}

impl SystemUnderTest for LoopbackMapper {
    fn name(&self) -> &str {
        "loopback"
    }

    fn supports(&self, block: &str) -> bool {
        block == "modulation_mapper"
    }

    fn process(&mut self, case: &CaseInputs<'_>, outputs: &[OutputSpec]) -> Result<Vec<(String, ArrayData)>, InterfaceError> {
        let scheme: ModulationScheme = match case.config.iter().find(|(name, _)| name == "scheme") {
            Some((_, Literal::Code(code))) => code
                .trim_start_matches("modulation_scheme::")
                .parse()
                .map_err(|e: common::types::UnknownVariant| InterfaceError::BindingFailure(e.to_string()))?,
            _ => return Err(InterfaceError::BindingFailure("no scheme".to_string())),
        };
        let bits = match case.inputs.iter().find(|(role, _)| role == "input") {
            Some((_, ArrayData::Bits(bits))) => bits,
            _ => return Err(InterfaceError::BindingFailure("no input bits".to_string())),
        };

        let mut symbols =
            ModulationMapper::map(bits, scheme).map_err(|e| InterfaceError::BindingFailure(e.to_string()))?;
        if self.corrupt {
            symbols[0] = -symbols[0];
        }
        assert_eq!(outputs[0].nof_elements, symbols.len());
        Ok(vec![(outputs[0].role.clone(), ArrayData::Complex(symbols))])
    }
}

#[test]
fn test_loopback_system_agrees() {
    let root = TempDir::new().unwrap();
    let mut system = LoopbackMapper { corrupt: false };
    let report = run_validation(&ModulationMapperTest, &config(root.path()), &mut system).unwrap();
    assert_eq!(report.mode, RunMode::Validation);
    assert_eq!(report.nof_cases(), 10);
    assert!(report.passed());
    assert!(report.run_dir.is_none());
    // Validation does not write anything
    assert_eq!(fs::read_dir(root.path()).map(|d| d.count()).unwrap_or(0), 0);
}

#[test]
fn test_mismatches_are_reported_per_case() {
    let root = TempDir::new().unwrap();
    let mut system = LoopbackMapper { corrupt: true };
    let report = run_validation(&ModulationMapperTest, &config(root.path()), &mut system).unwrap();
    assert!(!report.passed());
    assert_eq!(report.mismatches.len(), 10);
    assert!(report.mismatches.iter().all(|m| m.role == "output" && m.reason.contains("element 0")));
}

#[test]
fn test_unsupported_block_is_an_error() {
    let root = TempDir::new().unwrap();
    let mut system = LoopbackMapper { corrupt: false };
    let err = run_validation(&PbchDmrsTest, &config(root.path()), &mut system).unwrap_err();
    assert!(matches!(err, HarnessError::UnsupportedMode { ref block, .. } if block == "pbch_dmrs"));

    let registry = BlockRegistry::with_default_blocks().unwrap();
    let reports = registry
        .run(&BlockSelection::All, RunMode::Validation, &config(root.path()), Some(&mut system))
        .unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].block, "modulation_mapper");
}

#[test]
fn test_replayed_vectors_validate() {
    let root = TempDir::new().unwrap();
    for block in [&LdpcSegmenterTest as &dyn harness::BlockTest, &PbchDmrsTest, &ModulationMapperTest] {
        let generated = run_testvectors(block, &config(root.path())).unwrap();
        let mut replay = ReplayBindings::new(generated.run_dir.as_ref().unwrap().join("test_data"));
        let report = run_validation(block, &config(root.path()), &mut replay).unwrap();
        assert_eq!(report.test_ids, generated.test_ids);
        assert!(report.passed(), "{}: {:?}", report.block, report.mismatches);
    }
}

#[test]
fn test_corrupted_replay_is_caught() {
    let root = TempDir::new().unwrap();
    let generated = run_testvectors(&LdpcSegmenterTest, &config(root.path())).unwrap();
    let data_dir = generated.run_dir.as_ref().unwrap().join("test_data");
    let victim = data_dir.join("ldpc_segmenter_test_output0.dat");
    let mut bytes = fs::read(&victim).unwrap();
    bytes[0] ^= 1;
    fs::write(&victim, bytes).unwrap();

    let mut replay = ReplayBindings::new(&data_dir);
    let report = run_validation(&LdpcSegmenterTest, &config(root.path()), &mut replay).unwrap();
    assert_eq!(report.mismatches.len(), 1);
    assert_eq!(report.mismatches[0].test_id, 0);
}
