/// Pseudo-random sequence generation for 5G NR
/// Based on 3GPP TS 38.211 Section 5.2.1

use num_complex::Complex32;

/// Sequence offset N_C
const NC: usize = 1600;

/// 31-bit register mask
const MASK: u32 = 0x7FFFFFFF;

/// Length-31 Gold sequence generator
#[derive(Debug, Clone)]
pub struct PseudoRandomGenerator {
    /// Gold sequence LFSR state
    x1: u32,
    x2: u32,
}

impl PseudoRandomGenerator {
    /// Create a generator initialized with c_init and advanced by N_C
    pub fn new(c_init: u32) -> Self {
        // x1(0) = 1, x1(n) = 0 for n = 1..30
        let mut generator = Self { x1: 1, x2: c_init & MASK };
        for _ in 0..NC {
            generator.advance();
        }
        generator
    }

    /// Advance LFSR state
    fn advance(&mut self) {
        // x1(n+31) = (x1(n+3) + x1(n)) mod 2
        let x1_new = ((self.x1 >> 3) ^ self.x1) & 1;
        self.x1 = ((self.x1 >> 1) | (x1_new << 30)) & MASK;

        // x2(n+31) = (x2(n+3) + x2(n+2) + x2(n+1) + x2(n)) mod 2
        let x2_new = ((self.x2 >> 3) ^ (self.x2 >> 2) ^ (self.x2 >> 1) ^ self.x2) & 1;
        self.x2 = ((self.x2 >> 1) | (x2_new << 30)) & MASK;
    }

    /// Generate next bit from the sequence
    pub fn next_bit(&mut self) -> u8 {
        let c = (self.x1 ^ self.x2) & 1;
        self.advance();
        c as u8
    }

    /// Generate the next `len` bits
    pub fn generate(&mut self, len: usize) -> Vec<u8> {
        (0..len).map(|_| self.next_bit()).collect()
    }

    /// Generate QPSK symbol from sequence
    pub fn next_qpsk_symbol(&mut self, amplitude: f32) -> Complex32 {
        let c0 = self.next_bit();
        let c1 = self.next_bit();

        Complex32::new(
            amplitude * (1.0 - 2.0 * c0 as f32),
            amplitude * (1.0 - 2.0 * c1 as f32),
        )
    }

    /// Skip n symbols (2 bits per symbol for QPSK)
    pub fn skip(&mut self, n_symbols: usize) {
        for _ in 0..(n_symbols * 2) {
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_deterministic() {
        let a = PseudoRandomGenerator::new(0x1234).generate(500);
        let b = PseudoRandomGenerator::new(0x1234).generate(500);
        let c = PseudoRandomGenerator::new(0x1235).generate(500);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_sequence_is_balanced() {
        let bits = PseudoRandomGenerator::new(1000).generate(10000);
        let ones = bits.iter().filter(|&&b| b == 1).count();
        assert!((4500..5500).contains(&ones), "{} ones", ones);
    }

    #[test]
    fn test_skip_matches_generation() {
        let mut skipped = PseudoRandomGenerator::new(77);
        skipped.skip(5);
        let mut generated = PseudoRandomGenerator::new(77);
        generated.generate(10);
        assert_eq!(skipped.generate(32), generated.generate(32));
    }

    #[test]
    fn test_qpsk_symbols() {
        let mut generator = PseudoRandomGenerator::new(100);

        // Generate a few symbols and check they are QPSK
        for _ in 0..10 {
            let symbol = generator.next_qpsk_symbol(1.0 / std::f32::consts::SQRT_2);
            assert!((symbol.norm() - 1.0).abs() < 0.001);
        }
    }
}
