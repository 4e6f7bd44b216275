//! Block runs
//!
//! A run enumerates the parameter points of one block and processes them
//! strictly one after the other. Infeasible points are skipped before a
//! TestID is reserved, or by `generate_case` itself; neither consumes an
//! identifier nor leaves anything on disk. Any error aborts the block run and
//! leaves the files flushed so far in place.

use crate::axis::ParameterPoint;
use crate::combinations::enumerate;
use crate::config::HarnessConfig;
use crate::contract::{BlockDescriptor, BlockTest, CaseContext, CaseOutcome, TestVector, VectorField};
use crate::output::{ManifestCase, OutputDirectory, RunManifest};
use crate::randomization::{RandomizationState, TestIdAllocator};
use crate::registry::RunMode;
use crate::validation::compare;
use crate::HarnessError;
use interfaces::binary::write_array;
use interfaces::{CaseInputs, ElementType, FieldKind, HeaderWriter, Literal, OutputSpec, SystemUnderTest};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, trace, warn};

/// Output of the system under test that disagrees with the reference
#[derive(Debug, Clone, PartialEq)]
pub struct CaseMismatch {
    pub test_id: u32,
    pub role: String,
    pub reason: String,
}

/// Summary of one block run
#[derive(Debug, Clone)]
pub struct BlockReport {
    pub block: String,
    pub mode: RunMode,
    /// Output directory, test vector runs only
    pub run_dir: Option<PathBuf>,
    pub header: Option<PathBuf>,
    /// TestIDs of the written or validated cases, in order
    pub test_ids: Vec<u32>,
    pub nof_skipped: usize,
    pub mismatches: Vec<CaseMismatch>,
}

impl BlockReport {
    fn new(block: &str, mode: RunMode) -> Self {
        Self {
            block: block.to_string(),
            mode,
            run_dir: None,
            header: None,
            test_ids: Vec::new(),
            nof_skipped: 0,
            mismatches: Vec::new(),
        }
    }

    pub fn nof_cases(&self) -> usize {
        self.test_ids.len()
    }

    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Check a generated vector against the declared record layout
fn check_fields(descriptor: &BlockDescriptor, vector: &TestVector) -> Result<(), HarnessError> {
    let mismatch = |reason: String| HarnessError::FieldMismatch { block: descriptor.name.to_string(), reason };

    let fields = vector.fields();
    if fields.len() != descriptor.fields.len() {
        return Err(mismatch(format!("{} fields generated, {} declared", fields.len(), descriptor.fields.len())));
    }

    let mut roles = HashSet::new();
    for ((name, field), declared) in fields.iter().zip(&descriptor.fields) {
        if *name != declared.name {
            return Err(mismatch(format!("field {} generated where {} is declared", name, declared.name)));
        }
        let shape_ok = match field {
            VectorField::Config(literal) => declared.kind.accepts(literal),
            VectorField::Input { role, data } | VectorField::Output { role, data } => {
                if !roles.insert(role.as_str()) {
                    return Err(mismatch(format!("field {} reuses the data file role {}", name, role)));
                }
                declared.kind == FieldKind::File(data.element_type())
            }
        };
        if !shape_ok {
            return Err(mismatch(format!("field {} does not have the declared shape {:?}", name, declared.kind)));
        }
    }
    Ok(())
}

/// Loop over the feasible points of a block, handing each generated case on
fn drive(
    block: &dyn BlockTest,
    descriptor: &BlockDescriptor,
    random: &RandomizationState,
    report: &mut BlockReport,
    mut on_case: impl FnMut(u32, &ParameterPoint, TestVector) -> Result<(), HarnessError>,
) -> Result<(), HarnessError> {
    let points = enumerate(&block.axes(), block.combination_mode())?;
    let mut ids = TestIdAllocator::new();

    for point in &points {
        if !block.is_feasible(point)? {
            debug!("{}: skipping infeasible point {}", descriptor.name, point);
            report.nof_skipped += 1;
            continue;
        }

        let ctx = CaseContext::new(ids.peek(), random);
        match block.generate_case(&ctx, point)? {
            CaseOutcome::Skip(reason) => {
                debug!("{}: skipping {} ({})", descriptor.name, point, reason);
                report.nof_skipped += 1;
            }
            CaseOutcome::Generated(vector) => {
                check_fields(descriptor, &vector)?;
                let test_id = ids.commit();
                on_case(test_id, point, vector)?;
                report.test_ids.push(test_id);
            }
        }
    }
    Ok(())
}

/// Generate the test vectors of one block
pub fn run_testvectors(block: &dyn BlockTest, config: &HarnessConfig) -> Result<BlockReport, HarnessError> {
    let descriptor = block.descriptor();
    let name = descriptor.name;
    info!("Generating test vectors for {} [{}]", name, descriptor.category);

    let random = RandomizationState::new(config.seed, name, &block.random_axes())?;
    let out = OutputDirectory::create(&config.output_root, name, config.keep_previous_runs)?;
    let mut header = HeaderWriter::create(out.path(), name, block.literal_style())?;
    block.declare_header(&mut header)?;

    let mut manifest = RunManifest::new(name, descriptor.category, config.seed);
    let mut report = BlockReport::new(name, RunMode::TestVector);
    report.run_dir = Some(out.path().to_path_buf());

    drive(block, &descriptor, &random, &mut report, |test_id, point, vector| {
        let mut literals = Vec::with_capacity(vector.fields().len());
        let mut files = Vec::new();

        for (field_name, field) in vector.fields() {
            match field {
                VectorField::Config(literal) => literals.push(literal.clone()),
                VectorField::Input { role, data } | VectorField::Output { role, data } => {
                    if data.is_empty() && data.element_type() != ElementType::GridEntry {
                        return Err(HarnessError::ContractViolation {
                            block: name.to_string(),
                            reason: format!("empty array for field {} in test {}", field_name, test_id),
                        });
                    }
                    let (path, reference) = out.data_file(role, test_id);
                    write_array(&path, data)?;
                    if !path.is_file() {
                        return Err(HarnessError::MissingArtifact(path));
                    }
                    literals.push(Literal::File(reference.clone()));
                    files.push(reference);
                }
            }
        }

        header.append_case(&Literal::List(literals))?;
        manifest.add_case(ManifestCase {
            test_id,
            parameters: point.entries().iter().map(|(n, v)| (n.clone(), v.to_string())).collect(),
            files,
        });
        trace!("{}: wrote test {} for {}", name, test_id, point);
        Ok(())
    })?;

    report.header = Some(header.finish()?);
    manifest.nof_skipped = report.nof_skipped;
    manifest.write(&out.manifest_path())?;

    info!(
        "{}: {} cases written, {} skipped, output in {}",
        name,
        report.nof_cases(),
        report.nof_skipped,
        out.path().display()
    );
    Ok(report)
}

/// Feed the cases of one block to a system under test and compare outputs
pub fn run_validation(
    block: &dyn BlockTest,
    config: &HarnessConfig,
    system: &mut dyn SystemUnderTest,
) -> Result<BlockReport, HarnessError> {
    let descriptor = block.descriptor();
    let name = descriptor.name;
    if !system.supports(name) {
        return Err(HarnessError::UnsupportedMode { block: name.to_string(), mode: RunMode::Validation.to_string() });
    }
    info!("Validating {} against {}", name, system.name());

    let random = RandomizationState::new(config.seed, name, &block.random_axes())?;
    let tolerance = config.validation.tolerance;
    let mut report = BlockReport::new(name, RunMode::Validation);
    let mut mismatches = Vec::new();

    drive(block, &descriptor, &random, &mut report, |test_id, _, vector| {
        let case_config = vector.config_fields();
        let inputs = vector.inputs();
        let expected = vector.outputs();
        let specs: Vec<OutputSpec> = expected
            .iter()
            .map(|(role, data)| OutputSpec { role: role.clone(), element: data.element_type(), nof_elements: data.len() })
            .collect();

        let case = CaseInputs { block: name, test_id, config: &case_config, inputs: &inputs };
        let produced = system.process(&case, &specs)?;

        for (role, reference) in &expected {
            let result = match produced.iter().find(|(r, _)| r == role) {
                Some((_, actual)) => compare(reference, actual, tolerance),
                None => Err("output not produced".to_string()),
            };
            if let Err(reason) = result {
                warn!("{}: test {} output {} differs: {}", name, test_id, role, reason);
                mismatches.push(CaseMismatch { test_id, role: role.clone(), reason });
            }
        }
        Ok(())
    })?;

    report.mismatches = mismatches;
    info!(
        "{}: {} cases validated, {} mismatches, {} skipped",
        name,
        report.nof_cases(),
        report.mismatches.len(),
        report.nof_skipped
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use interfaces::{ArrayData, RecordField};

    fn descriptor() -> BlockDescriptor {
        BlockDescriptor {
            name: "toy",
            category: "test",
            includes: vec![],
            fields: vec![
                RecordField::new("n", FieldKind::Integer),
                RecordField::new("data", FieldKind::File(ElementType::PackedBits)),
            ],
        }
    }

    #[test]
    fn test_matching_vector_passes() {
        let vector = TestVector::new().config("n", 3u32).input("data", "input", ArrayData::Bits(vec![1, 0, 1]));
        assert!(check_fields(&descriptor(), &vector).is_ok());
    }

    #[test]
    fn test_field_order_and_shape_are_enforced() {
        let swapped = TestVector::new().input("data", "input", ArrayData::Bits(vec![1])).config("n", 3u32);
        assert!(check_fields(&descriptor(), &swapped).is_err());

        let short = TestVector::new().config("n", 3u32);
        assert!(check_fields(&descriptor(), &short).is_err());

        let wrong_type = TestVector::new().config("n", 3u32).input("data", "input", ArrayData::Bytes(vec![1]));
        assert!(matches!(check_fields(&descriptor(), &wrong_type), Err(HarnessError::FieldMismatch { .. })));

        let wrong_literal = TestVector::new().config("n", true).input("data", "input", ArrayData::Bits(vec![1]));
        assert!(check_fields(&descriptor(), &wrong_literal).is_err());
    }

    #[test]
    fn test_array_roles_must_be_distinct() {
        let descriptor = BlockDescriptor {
            name: "toy",
            category: "test",
            includes: vec![],
            fields: vec![
                RecordField::new("a", FieldKind::File(ElementType::U8)),
                RecordField::new("b", FieldKind::File(ElementType::U8)),
            ],
        };
        let distinct = TestVector::new()
            .input("a", "input", ArrayData::Bytes(vec![1, 2, 3]))
            .output("b", "output", ArrayData::Bytes(vec![9]));
        assert!(check_fields(&descriptor, &distinct).is_ok());

        let shared = TestVector::new()
            .input("a", "data", ArrayData::Bytes(vec![1, 2, 3]))
            .output("b", "data", ArrayData::Bytes(vec![9]));
        assert!(matches!(
            check_fields(&descriptor, &shared),
            Err(HarnessError::FieldMismatch { ref reason, .. }) if reason.contains("data")
        ));
    }
}
