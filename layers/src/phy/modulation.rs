/// Modulation mapping and soft demodulation for 5G NR
/// Based on 3GPP TS 38.211 Section 5.1

use crate::LayerError;
use common::types::ModulationScheme;
use num_complex::Complex32;
use tracing::debug;

/// Largest magnitude of a quantized log-likelihood ratio
pub const LLR_MAX: i8 = 120;

/// Soft values beyond this magnitude saturate the quantizer
pub const LLR_CLIP: f32 = 32.0;

/// Amplitude scaling of the constellation
fn normalization(scheme: ModulationScheme) -> f32 {
    match scheme {
        ModulationScheme::Bpsk | ModulationScheme::Qpsk => 1.0 / 2f32.sqrt(),
        ModulationScheme::Qam16 => 1.0 / 10f32.sqrt(),
        ModulationScheme::Qam64 => 1.0 / 42f32.sqrt(),
        ModulationScheme::Qam256 => 1.0 / 170f32.sqrt(),
    }
}

/// Unnormalized PAM level carried by the bits of one axis,
/// e.g. (1-2b0)[4-(1-2b2)[2-(1-2b4)]] for 64-QAM
fn pam_level(bits: &[u8]) -> f32 {
    let sign = 1.0 - 2.0 * (bits[0] & 1) as f32;
    if bits.len() == 1 {
        sign
    } else {
        sign * ((1u32 << (bits.len() - 1)) as f32 - pam_level(&bits[1..]))
    }
}

/// Modulation mapper
pub struct ModulationMapper;

impl ModulationMapper {
    /// Map one symbol worth of bits
    pub fn map_symbol(bits: &[u8], scheme: ModulationScheme) -> Complex32 {
        let scale = normalization(scheme);
        match scheme {
            ModulationScheme::Bpsk => {
                let level = 1.0 - 2.0 * (bits[0] & 1) as f32;
                Complex32::new(scale * level, scale * level)
            }
            _ => {
                let i_bits: Vec<u8> = bits.iter().step_by(2).copied().collect();
                let q_bits: Vec<u8> = bits.iter().skip(1).step_by(2).copied().collect();
                Complex32::new(scale * pam_level(&i_bits), scale * pam_level(&q_bits))
            }
        }
    }

    /// Map a bit sequence to complex symbols
    pub fn map(bits: &[u8], scheme: ModulationScheme) -> Result<Vec<Complex32>, LayerError> {
        let qm = scheme.bits_per_symbol();
        if bits.len() % qm != 0 {
            return Err(LayerError::InvalidConfiguration(format!(
                "{} bits do not fill whole {} symbols",
                bits.len(),
                scheme
            )));
        }

        let symbols: Vec<Complex32> = bits.chunks(qm).map(|chunk| Self::map_symbol(chunk, scheme)).collect();
        debug!("Mapped {} bits to {} {} symbols", bits.len(), symbols.len(), scheme);
        Ok(symbols)
    }

    /// Every constellation point indexed by its bit label (MSB = b0)
    pub fn constellation(scheme: ModulationScheme) -> Vec<Complex32> {
        let qm = scheme.bits_per_symbol();
        (0..1usize << qm)
            .map(|label| {
                let bits: Vec<u8> = (0..qm).map(|i| ((label >> (qm - 1 - i)) & 1) as u8).collect();
                Self::map_symbol(&bits, scheme)
            })
            .collect()
    }
}

/// Max-log soft demodulator
pub struct DemodulationMapper;

impl DemodulationMapper {
    /// Soft bits of a symbol sequence. Positive values favour bit 0.
    pub fn demodulate_soft(
        symbols: &[Complex32],
        noise_var: &[f32],
        scheme: ModulationScheme,
    ) -> Result<Vec<f32>, LayerError> {
        if symbols.len() != noise_var.len() {
            return Err(LayerError::InvalidConfiguration(format!(
                "{} symbols but {} noise variances",
                symbols.len(),
                noise_var.len()
            )));
        }

        let qm = scheme.bits_per_symbol();
        let constellation = ModulationMapper::constellation(scheme);
        let mut soft_bits = Vec::with_capacity(symbols.len() * qm);

        for (&symbol, &nvar) in symbols.iter().zip(noise_var) {
            if nvar <= 0.0 || !nvar.is_finite() {
                soft_bits.extend(std::iter::repeat(0.0).take(qm));
                continue;
            }
            let distances: Vec<f32> = constellation.iter().map(|&point| (symbol - point).norm_sqr()).collect();
            for bit in 0..qm {
                let mask = 1usize << (qm - 1 - bit);
                let mut min_zero = f32::INFINITY;
                let mut min_one = f32::INFINITY;
                for (label, &distance) in distances.iter().enumerate() {
                    if label & mask == 0 {
                        min_zero = min_zero.min(distance);
                    } else {
                        min_one = min_one.min(distance);
                    }
                }
                soft_bits.push((min_one - min_zero) / nvar);
            }
        }

        Ok(soft_bits)
    }

    /// Quantize soft bits to signed bytes in [-LLR_MAX, LLR_MAX]
    pub fn quantize(soft_bits: &[f32]) -> Vec<i8> {
        let scale = LLR_MAX as f32 / LLR_CLIP;
        soft_bits
            .iter()
            .map(|&llr| (llr.clamp(-LLR_CLIP, LLR_CLIP) * scale).round() as i8)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qpsk_points() {
        let symbols = ModulationMapper::map(&[0, 0, 1, 1, 0, 1], ModulationScheme::Qpsk).unwrap();
        let a = 1.0 / 2f32.sqrt();
        assert_eq!(symbols, vec![Complex32::new(a, a), Complex32::new(-a, -a), Complex32::new(a, -a)]);
    }

    #[test]
    fn test_unit_average_energy() {
        for scheme in ModulationScheme::ALL {
            let points = ModulationMapper::constellation(scheme);
            let energy: f32 = points.iter().map(|p| p.norm_sqr()).sum::<f32>() / points.len() as f32;
            assert!((energy - 1.0).abs() < 1e-5, "{} energy {}", scheme, energy);
        }
    }

    #[test]
    fn test_qam16_corner() {
        // b = 0000 maps to (1 + 1j) / sqrt(10)
        let symbol = ModulationMapper::map_symbol(&[0, 0, 0, 0], ModulationScheme::Qam16);
        let s = 1.0 / 10f32.sqrt();
        assert!((symbol - Complex32::new(s, s)).norm() < 1e-6);
        let symbol = ModulationMapper::map_symbol(&[0, 0, 1, 1], ModulationScheme::Qam16);
        assert!((symbol - Complex32::new(3.0 * s, 3.0 * s)).norm() < 1e-6);
    }

    #[test]
    fn test_incomplete_symbol_is_rejected() {
        assert!(ModulationMapper::map(&[0, 1, 1], ModulationScheme::Qpsk).is_err());
    }

    #[test]
    fn test_noiseless_demodulation_signs() {
        for scheme in ModulationScheme::ALL {
            let qm = scheme.bits_per_symbol();
            let bits: Vec<u8> = (0..qm * 16).map(|i| ((i * 5 + i / 3) % 2) as u8).collect();
            let symbols = ModulationMapper::map(&bits, scheme).unwrap();
            let soft = DemodulationMapper::demodulate_soft(&symbols, &vec![0.1; symbols.len()], scheme).unwrap();
            for (bit, llr) in bits.iter().zip(&soft) {
                assert_eq!(*bit == 0, *llr > 0.0, "{}", scheme);
            }
        }
    }

    #[test]
    fn test_quantization_saturates() {
        assert_eq!(DemodulationMapper::quantize(&[1000.0, -1000.0, 0.0, LLR_CLIP / 2.0]), vec![120, -120, 0, 60]);
    }
}
