//! Block test contract
//!
//! Every block under test declares its identity, its record layout in the
//! header file, its parameter axes and a generation procedure. Generation
//! returns the case as a `TestVector`: an ordered list of fields matching the
//! declared record, where arrays are still in memory. Writing the data files
//! and the header line is left to the runner so that skipped points can never
//! leave artifacts behind.

use crate::axis::{ParameterAxis, ParameterPoint};
use crate::combinations::CombinationMode;
use crate::randomization::{RandomAxis, RandomizationState};
use crate::HarnessError;
use interfaces::{ArrayData, HeaderWriter, Literal, LiteralStyle, RecordField};
use rand_chacha::ChaCha8Rng;

/// Identity and record layout of a block
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDescriptor {
    /// Unique block name
    pub name: &'static str,
    /// Hierarchical category, e.g. `phy/upper/channel_modulation`
    pub category: &'static str,
    /// Headers included before the record declaration
    pub includes: Vec<&'static str>,
    /// Fields of `test_case_t`, in initializer order
    pub fields: Vec<RecordField>,
}

/// One field of a generated case
#[derive(Debug, Clone, PartialEq)]
pub enum VectorField {
    /// Inline configuration value
    Config(Literal),
    /// Array fed to the block, written to `<block>_test_<role><id>.dat`
    Input { role: String, data: ArrayData },
    /// Expected array produced by the block
    Output { role: String, data: ArrayData },
}

/// A generated case before serialization
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TestVector {
    fields: Vec<(String, VectorField)>,
}

impl TestVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, name: &str, value: impl Into<Literal>) -> Self {
        self.fields.push((name.to_string(), VectorField::Config(value.into())));
        self
    }

    pub fn input(mut self, name: &str, role: &str, data: ArrayData) -> Self {
        self.fields.push((name.to_string(), VectorField::Input { role: role.to_string(), data }));
        self
    }

    pub fn output(mut self, name: &str, role: &str, data: ArrayData) -> Self {
        self.fields.push((name.to_string(), VectorField::Output { role: role.to_string(), data }));
        self
    }

    pub fn fields(&self) -> &[(String, VectorField)] {
        &self.fields
    }

    /// Configuration fields, by name
    pub fn config_fields(&self) -> Vec<(String, Literal)> {
        self.fields
            .iter()
            .filter_map(|(name, field)| match field {
                VectorField::Config(literal) => Some((name.clone(), literal.clone())),
                _ => None,
            })
            .collect()
    }

    /// Input arrays, by role
    pub fn inputs(&self) -> Vec<(String, ArrayData)> {
        self.fields
            .iter()
            .filter_map(|(_, field)| match field {
                VectorField::Input { role, data } => Some((role.clone(), data.clone())),
                _ => None,
            })
            .collect()
    }

    /// Expected output arrays, by role
    pub fn outputs(&self) -> Vec<(String, ArrayData)> {
        self.fields
            .iter()
            .filter_map(|(_, field)| match field {
                VectorField::Output { role, data } => Some((role.clone(), data.clone())),
                _ => None,
            })
            .collect()
    }
}

/// Result of generating one parameter point
#[derive(Debug, Clone, PartialEq)]
pub enum CaseOutcome {
    Generated(TestVector),
    /// Infeasible point, with the reason for the log
    Skip(String),
}

/// Context handed to `generate_case`
pub struct CaseContext<'a> {
    test_id: u32,
    random: &'a RandomizationState,
}

impl<'a> CaseContext<'a> {
    pub fn new(test_id: u32, random: &'a RandomizationState) -> Self {
        Self { test_id, random }
    }

    /// TestID this case gets if it is generated. Skipped cases do not use it up.
    pub fn test_id(&self) -> u32 {
        self.test_id
    }

    /// Incidental parameter keyed by the TestID
    pub fn draw(&self, axis: &str) -> Result<u32, HarnessError> {
        self.random.draw(axis, self.test_id)
    }

    /// Generator for the random data of this case
    pub fn rng(&self) -> ChaCha8Rng {
        self.random.case_rng(self.test_id)
    }
}

/// A block under test
pub trait BlockTest {
    /// Identity and record layout
    fn descriptor(&self) -> BlockDescriptor;

    /// Parameter axes, in enumeration order
    fn axes(&self) -> Vec<ParameterAxis>;

    fn combination_mode(&self) -> CombinationMode {
        CombinationMode::Exhaustive
    }

    /// Incidental parameters drawn per TestID
    fn random_axes(&self) -> Vec<RandomAxis> {
        Vec::new()
    }

    fn literal_style(&self) -> LiteralStyle {
        LiteralStyle::default()
    }

    /// Structural feasibility, checked before a TestID is reserved
    fn is_feasible(&self, _point: &ParameterPoint) -> Result<bool, HarnessError> {
        Ok(true)
    }

    /// Write the block includes and the record declaration
    fn declare_header(&self, header: &mut HeaderWriter) -> Result<(), HarnessError> {
        let descriptor = self.descriptor();
        for include in &descriptor.includes {
            header.add_include(include)?;
        }
        header.declare_record(&descriptor.fields)?;
        Ok(())
    }

    /// Generate inputs and expected outputs for one parameter point
    fn generate_case(&self, ctx: &CaseContext<'_>, point: &ParameterPoint) -> Result<CaseOutcome, HarnessError>;
}
