//! End-to-end generation scenarios

use common::utils::{FILLER_BIT, PLACEHOLDER_X, PLACEHOLDER_Y};
use harness::blocks::{LdpcSegmenterTest, ModulationMapperTest, ShortBlockEncoderTest};
use harness::output::ManifestCase;
use harness::runner::{run_testvectors, BlockReport};
use harness::{BlockRegistry, BlockSelection, HarnessConfig, HarnessError, RunManifest, RunMode};
use interfaces::binary::read_array;
use interfaces::{ArrayData, ElementType};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn config(root: &Path) -> HarnessConfig {
    HarnessConfig { output_root: root.to_path_buf(), ..HarnessConfig::default() }
}

fn manifest(report: &BlockReport) -> RunManifest {
    let run_dir = report.run_dir.as_ref().unwrap();
    RunManifest::read(&run_dir.join(format!("{}_manifest.json", report.block))).unwrap()
}

/// Written case with the given parameter values
fn find_case<'a>(manifest: &'a RunManifest, params: &[(&str, &str)]) -> &'a ManifestCase {
    manifest
        .cases
        .iter()
        .find(|case| {
            params.iter().all(|(name, value)| case.parameters.iter().any(|(n, v)| n == name && v == value))
        })
        .unwrap()
}

fn read(report: &BlockReport, reference: &str, element: ElementType, nof_bits: Option<usize>) -> ArrayData {
    read_array(&report.run_dir.as_ref().unwrap().join(reference), element, nof_bits).unwrap()
}

#[test]
fn test_qpsk_modulation_mapper_vector() {
    let root = TempDir::new().unwrap();
    let report = run_testvectors(&ModulationMapperTest, &config(root.path())).unwrap();
    let manifest = manifest(&report);
    let case = find_case(&manifest, &[("modulation", "QPSK"), ("nof_symbols", "257")]);
    assert_eq!(case.files.len(), 2);

    let input = read(&report, &case.files[0], ElementType::PackedBits, Some(514));
    assert_eq!(input.len(), 514);
    let raw = fs::metadata(report.run_dir.as_ref().unwrap().join(&case.files[0])).unwrap();
    assert_eq!(raw.len(), 65);

    let ArrayData::Complex(symbols) = read(&report, &case.files[1], ElementType::ComplexF32, None) else {
        panic!("output is not complex");
    };
    assert_eq!(symbols.len(), 257);
    let a = 1.0 / 2f32.sqrt();
    for s in symbols {
        assert!((s.re.abs() - a).abs() < 1e-6 && (s.im.abs() - a).abs() < 1e-6, "{}", s);
    }
}

#[test]
fn test_small_transport_block_is_one_segment() {
    let root = TempDir::new().unwrap();
    let report = run_testvectors(&LdpcSegmenterTest, &config(root.path())).unwrap();
    let manifest = manifest(&report);
    // BG2 with TBS above 3824 never runs
    assert_eq!(report.nof_skipped, 2);

    let case = find_case(&manifest, &[("base_graph", "1"), ("tbs", "96")]);
    let ArrayData::Bytes(segments) = read(&report, &case.files[1], ElementType::U8, None) else {
        panic!("output is not bytes");
    };
    // One code block of 22 * Z = 132 with Z = 6
    assert_eq!(segments.len(), 132);
    assert!(segments[..112].iter().all(|&b| b <= 1));
    assert!(segments[112..].iter().all(|&b| b == FILLER_BIT));

    let header = fs::read_to_string(report.header.unwrap()).unwrap();
    assert!(header.contains(&format!("{{ldpc_base_graph_type::BG1, 96, 1, 132, {{\"{}\"}}", case.files[0])));
}

#[test]
fn test_one_bit_short_block_has_no_placeholders() {
    let root = TempDir::new().unwrap();
    let report = run_testvectors(&ShortBlockEncoderTest, &config(root.path())).unwrap();
    assert_eq!(report.nof_cases(), 11 * 5);
    let manifest = manifest(&report);
    let case = find_case(&manifest, &[("message_length", "1"), ("modulation_order", "2")]);

    let ArrayData::Bytes(message) = read(&report, &case.files[0], ElementType::U8, None) else {
        panic!("input is not bytes");
    };
    let ArrayData::Bytes(encoded) = read(&report, &case.files[1], ElementType::U8, None) else {
        panic!("output is not bytes");
    };
    assert_eq!(encoded.len(), 2);
    assert_eq!(encoded, vec![message[0], message[0]]);
    assert!(!encoded.contains(&PLACEHOLDER_X) && !encoded.contains(&PLACEHOLDER_Y));
}

#[test]
fn test_all_blocks_run_without_collisions() {
    let root = TempDir::new().unwrap();
    let registry = BlockRegistry::with_default_blocks().unwrap();
    let reports = registry.run(&BlockSelection::All, RunMode::TestVector, &config(root.path()), None).unwrap();
    assert_eq!(reports.len(), registry.names().len());

    let mut seen = HashSet::new();
    for report in &reports {
        assert!(report.nof_cases() >= 1, "{} generated nothing", report.block);
        for case in manifest(report).cases {
            for file in case.files {
                let name = Path::new(&file).file_name().unwrap().to_os_string();
                assert!(seen.insert(name), "{} collides", file);
            }
        }
    }
}

#[test]
fn test_usage_errors_name_the_identifier() {
    let root = TempDir::new().unwrap();
    let registry = BlockRegistry::with_default_blocks().unwrap();
    let err = registry
        .run(&BlockSelection::from_arg("turbo_decoder"), RunMode::TestVector, &config(root.path()), None)
        .unwrap_err();
    assert!(matches!(err, HarnessError::UnknownBlock(_)));
    assert!(err.to_string().contains("turbo_decoder"));

    let err = "bindings".parse::<RunMode>().unwrap_err();
    assert!(err.to_string().contains("bindings"));

    let err = registry
        .run(&BlockSelection::from_arg("pbch_dmrs"), RunMode::Validation, &config(root.path()), None)
        .unwrap_err();
    assert!(matches!(err, HarnessError::Config(_)));
}
