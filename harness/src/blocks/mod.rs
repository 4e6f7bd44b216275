//! Blocks under test
//!
//! One module per block. Every block follows the same pattern: draw the
//! incidental parameters for the TestID, build random inputs, call the
//! reference model from `layers::phy` and return inputs, outputs and the
//! inline configuration in record order.

mod demodulation_mapper;
mod ldpc_segmenter;
mod modulation_mapper;
mod pbch_dmrs;
mod pdcch_candidates;
mod pdsch_dmrs;
mod pseudo_random_generator;
mod short_block_encoder;

pub use demodulation_mapper::DemodulationMapperTest;
pub use ldpc_segmenter::LdpcSegmenterTest;
pub use modulation_mapper::ModulationMapperTest;
pub use pbch_dmrs::PbchDmrsTest;
pub use pdcch_candidates::PdcchCandidatesUeTest;
pub use pdsch_dmrs::PdschDmrsTest;
pub use pseudo_random_generator::PseudoRandomGeneratorTest;
pub use short_block_encoder::ShortBlockEncoderTest;

use crate::axis::{ParameterAxis, ParameterPoint};
use crate::contract::BlockTest;
use crate::HarnessError;
use common::types::ModulationScheme;
use interfaces::Literal;
use rand::Rng;

/// Every block, in registration order
pub fn default_blocks() -> Vec<Box<dyn BlockTest>> {
    vec![
        Box::new(ModulationMapperTest),
        Box::new(DemodulationMapperTest),
        Box::new(PseudoRandomGeneratorTest),
        Box::new(LdpcSegmenterTest),
        Box::new(ShortBlockEncoderTest),
        Box::new(PdcchCandidatesUeTest),
        Box::new(PdschDmrsTest),
        Box::new(PbchDmrsTest),
    ]
}

/// Header declaring `modulation_scheme`
const MODULATION_SCHEME_INCLUDE: &str = "srsran/ran/sch/modulation_scheme.h";

/// Axis over every modulation scheme, by name
fn modulation_axis() -> ParameterAxis {
    let names: Vec<&str> = ModulationScheme::ALL.iter().map(ModulationScheme::as_str).collect();
    ParameterAxis::labels("modulation", &names)
}

fn modulation(point: &ParameterPoint) -> Result<ModulationScheme, HarnessError> {
    point.label("modulation")?.parse().map_err(|e: common::types::UnknownVariant| HarnessError::MalformedAxis {
        axis: "modulation".to_string(),
        reason: e.to_string(),
    })
}

fn modulation_literal(scheme: ModulationScheme) -> Literal {
    Literal::code(format!("modulation_scheme::{}", scheme.as_str()))
}

/// Point value converted to a narrower integer
fn narrow<T: TryFrom<i64>>(point: &ParameterPoint, axis: &str) -> Result<T, HarnessError> {
    let value = point.int(axis)?;
    T::try_from(value).map_err(|_| HarnessError::MalformedAxis {
        axis: axis.to_string(),
        reason: format!("value {} out of range", value),
    })
}

fn random_bits(rng: &mut impl Rng, len: usize) -> Vec<u8> {
    (0..len).map(|_| rng.gen_range(0..=1u8)).collect()
}
