use super::narrow;
use crate::axis::{ParameterAxis, ParameterPoint};
use crate::contract::{BlockDescriptor, BlockTest, CaseContext, CaseOutcome, TestVector};
use crate::randomization::RandomAxis;
use crate::HarnessError;
use interfaces::{ArrayData, ElementType, FieldKind, RecordField};
use layers::phy::PseudoRandomGenerator;

/// Gold sequence generator, initialized like the PDSCH scrambler
pub struct PseudoRandomGeneratorTest;

impl PseudoRandomGeneratorTest {
    /// c_init = n_RNTI * 2^15 + n_ID
    fn c_init(rnti: u32, n_id: u32) -> u32 {
        ((rnti << 15) + n_id) & 0x7fffffff
    }
}

impl BlockTest for PseudoRandomGeneratorTest {
    fn descriptor(&self) -> BlockDescriptor {
        BlockDescriptor {
            name: "pseudo_random_generator",
            category: "phy/upper/sequence_generators",
            includes: vec![],
            fields: vec![
                RecordField::new("c_init", FieldKind::Integer),
                RecordField::new("nof_bits", FieldKind::Integer),
                RecordField::new("sequence", FieldKind::File(ElementType::PackedBits)),
            ],
        }
    }

    fn axes(&self) -> Vec<ParameterAxis> {
        vec![ParameterAxis::integers("nof_bits", [1, 13, 256, 1024, 4357])]
    }

    fn random_axes(&self) -> Vec<RandomAxis> {
        vec![RandomAxis::new("rnti", 65536), RandomAxis::new("n_id", 1024)]
    }

    fn generate_case(&self, ctx: &CaseContext<'_>, point: &ParameterPoint) -> Result<CaseOutcome, HarnessError> {
        let nof_bits: u32 = narrow(point, "nof_bits")?;
        let c_init = Self::c_init(ctx.draw("rnti")?, ctx.draw("n_id")?);

        let sequence = PseudoRandomGenerator::new(c_init).generate(nof_bits as usize);

        Ok(CaseOutcome::Generated(
            TestVector::new()
                .config("c_init", c_init)
                .config("nof_bits", nof_bits)
                .output("sequence", "output", ArrayData::Bits(sequence)),
        ))
    }
}
