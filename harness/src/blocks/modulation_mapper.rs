use super::{modulation, modulation_axis, modulation_literal, narrow, random_bits, MODULATION_SCHEME_INCLUDE};
use crate::axis::{ParameterAxis, ParameterPoint};
use crate::contract::{BlockDescriptor, BlockTest, CaseContext, CaseOutcome, TestVector};
use crate::HarnessError;
use interfaces::{ArrayData, ElementType, FieldKind, RecordField};
use layers::phy::ModulationMapper;

/// Modulation mapper: packed bits in, constellation symbols out
pub struct ModulationMapperTest;

impl BlockTest for ModulationMapperTest {
    fn descriptor(&self) -> BlockDescriptor {
        BlockDescriptor {
            name: "modulation_mapper",
            category: "phy/upper/channel_modulation",
            includes: vec![MODULATION_SCHEME_INCLUDE],
            fields: vec![
                RecordField::new("nof_symbols", FieldKind::Integer),
                RecordField::new("scheme", FieldKind::Label("modulation_scheme".to_string())),
                RecordField::new("data", FieldKind::File(ElementType::PackedBits)),
                RecordField::new("symbols", FieldKind::File(ElementType::ComplexF32)),
            ],
        }
    }

    fn axes(&self) -> Vec<ParameterAxis> {
        vec![modulation_axis(), ParameterAxis::integers("nof_symbols", [257, 997])]
    }

    fn generate_case(&self, ctx: &CaseContext<'_>, point: &ParameterPoint) -> Result<CaseOutcome, HarnessError> {
        let scheme = modulation(point)?;
        let nof_symbols: u32 = narrow(point, "nof_symbols")?;

        let bits = random_bits(&mut ctx.rng(), nof_symbols as usize * scheme.bits_per_symbol());
        let symbols = ModulationMapper::map(&bits, scheme)?;

        Ok(CaseOutcome::Generated(
            TestVector::new()
                .config("nof_symbols", nof_symbols)
                .config("scheme", modulation_literal(scheme))
                .input("data", "input", ArrayData::Bits(bits))
                .output("symbols", "output", ArrayData::Complex(symbols)),
        ))
    }
}
