use super::{modulation, modulation_axis, modulation_literal, narrow, random_bits, MODULATION_SCHEME_INCLUDE};
use crate::axis::{ParameterAxis, ParameterPoint};
use crate::contract::{BlockDescriptor, BlockTest, CaseContext, CaseOutcome, TestVector};
use crate::HarnessError;
use interfaces::{ArrayData, ElementType, FieldKind, RecordField};
use layers::phy::{DemodulationMapper, ModulationMapper};
use num_complex::Complex32;
use rand::Rng;

/// Noise variance range of the received symbols
const NOISE_VAR_RANGE: std::ops::Range<f32> = 0.01..0.2;

/// Complex Gaussian sample with variance `noise_var` (Box-Muller)
fn awgn(rng: &mut impl Rng, noise_var: f32) -> Complex32 {
    let u1: f32 = rng.gen_range(f32::EPSILON..1.0);
    let u2: f32 = rng.gen();
    let radius = (-noise_var * u1.ln()).sqrt();
    let angle = 2.0 * std::f32::consts::PI * u2;
    Complex32::from_polar(radius, angle)
}

/// Soft demodulator: noisy symbols and noise variances in, quantized LLRs out
pub struct DemodulationMapperTest;

impl BlockTest for DemodulationMapperTest {
    fn descriptor(&self) -> BlockDescriptor {
        BlockDescriptor {
            name: "demodulation_mapper",
            category: "phy/upper/channel_modulation",
            includes: vec![MODULATION_SCHEME_INCLUDE, "srsran/phy/upper/log_likelihood_ratio.h"],
            fields: vec![
                RecordField::new("nof_symbols", FieldKind::Integer),
                RecordField::new("scheme", FieldKind::Label("modulation_scheme".to_string())),
                RecordField::new("symbols", FieldKind::File(ElementType::ComplexF32)),
                RecordField::new("noise_var", FieldKind::File(ElementType::F32)),
                RecordField::new("soft_bits", FieldKind::File(ElementType::Llr)),
            ],
        }
    }

    fn axes(&self) -> Vec<ParameterAxis> {
        vec![modulation_axis(), ParameterAxis::integers("nof_symbols", [257, 997])]
    }

    fn generate_case(&self, ctx: &CaseContext<'_>, point: &ParameterPoint) -> Result<CaseOutcome, HarnessError> {
        let scheme = modulation(point)?;
        let nof_symbols: u32 = narrow(point, "nof_symbols")?;
        let mut rng = ctx.rng();

        let bits = random_bits(&mut rng, nof_symbols as usize * scheme.bits_per_symbol());
        let clean = ModulationMapper::map(&bits, scheme)?;
        let noise_var: Vec<f32> = (0..clean.len()).map(|_| rng.gen_range(NOISE_VAR_RANGE)).collect();
        let received: Vec<Complex32> = clean
            .iter()
            .zip(&noise_var)
            .map(|(&symbol, &nvar)| symbol + awgn(&mut rng, nvar))
            .collect();

        let soft_bits = DemodulationMapper::demodulate_soft(&received, &noise_var, scheme)?;
        let llrs = DemodulationMapper::quantize(&soft_bits);

        Ok(CaseOutcome::Generated(
            TestVector::new()
                .config("nof_symbols", nof_symbols)
                .config("scheme", modulation_literal(scheme))
                .input("symbols", "input", ArrayData::Complex(received))
                .input("noise_var", "noise_var", ArrayData::Floats(noise_var))
                .output("soft_bits", "output", ArrayData::Llrs(llrs)),
        ))
    }
}
