//! Common Utilities
//!
//! Bit handling and CRC helpers shared by the reference models and the
//! artifact writers. Bits are carried unpacked, one bit per `u8` holding 0 or 1.

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;
use tracing::trace;

/// Placeholder bit "x" of the short-block and UCI encoders
pub const PLACEHOLDER_X: u8 = 255;

/// Repetition placeholder bit "y" of the short-block and UCI encoders
pub const PLACEHOLDER_Y: u8 = 254;

/// Filler bit inserted by LDPC code block segmentation
pub const FILLER_BIT: u8 = 254;

/// Element of an unpacked bit sequence that is neither 0 nor 1
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Bit {index} has value {value}")]
pub struct InvalidBit {
    pub index: usize,
    pub value: u8,
}

/// Pack bits into bytes (MSB first). The last byte is zero padded.
pub fn pack_bits(bits: &[u8]) -> Result<Bytes, InvalidBit> {
    let mut bytes = BytesMut::with_capacity(bits.len().div_ceil(8));

    for (n, chunk) in bits.chunks(8).enumerate() {
        let mut byte = 0u8;
        for (i, &bit) in chunk.iter().enumerate() {
            match bit {
                0 => {}
                1 => byte |= 1 << (7 - i),
                value => return Err(InvalidBit { index: n * 8 + i, value }),
            }
        }
        bytes.put_u8(byte);
    }

    Ok(bytes.freeze())
}

/// Unpack the first `nof_bits` bits of a packed buffer (MSB first)
pub fn unpack_bits(bytes: &[u8], nof_bits: usize) -> Vec<u8> {
    let nof_bits = nof_bits.min(bytes.len() * 8);
    (0..nof_bits)
        .map(|i| (bytes[i / 8] >> (7 - (i % 8))) & 1)
        .collect()
}

/// Append the `width` least significant bits of `value`, MSB first
pub fn append_bits(bits: &mut Vec<u8>, value: u32, width: usize) {
    for i in (0..width).rev() {
        bits.push(((value >> i) & 1) as u8);
    }
}

/// CRC polynomials of TS 38.212 Section 5.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrcPolynomial {
    /// Transport block CRC for large blocks
    Crc24A,
    /// Code block CRC
    Crc24B,
    /// Control information CRC
    Crc24C,
    /// Transport block CRC for small blocks
    Crc16,
    /// UCI CRC
    Crc11,
    /// UCI CRC for short payloads
    Crc6,
}

impl CrcPolynomial {
    /// Generator polynomial without the leading term
    fn generator(&self) -> u32 {
        match self {
            CrcPolynomial::Crc24A => 0x864CFB,
            CrcPolynomial::Crc24B => 0x800063,
            CrcPolynomial::Crc24C => 0xB2B117,
            CrcPolynomial::Crc16 => 0x1021,
            CrcPolynomial::Crc11 => 0x621,
            CrcPolynomial::Crc6 => 0x21,
        }
    }

    /// Number of parity bits
    pub fn len(&self) -> usize {
        match self {
            CrcPolynomial::Crc24A | CrcPolynomial::Crc24B | CrcPolynomial::Crc24C => 24,
            CrcPolynomial::Crc16 => 16,
            CrcPolynomial::Crc11 => 11,
            CrcPolynomial::Crc6 => 6,
        }
    }

    /// Never empty, present for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Calculate the CRC of an unpacked bit sequence
pub fn crc_bits(bits: &[u8], poly: CrcPolynomial) -> u32 {
    let width = poly.len();
    let mask = (1u32 << width) - 1;
    let top = 1u32 << (width - 1);
    let mut crc: u32 = 0;

    for &bit in bits {
        let feedback = ((crc & top) != 0) ^ (bit & 1 != 0);
        crc = (crc << 1) & mask;
        if feedback {
            crc ^= poly.generator();
        }
    }

    trace!("CRC{} over {} bits = {:#x}", width, bits.len(), crc);
    crc
}

/// Append the CRC parity bits to an unpacked bit sequence
pub fn attach_crc(bits: &[u8], poly: CrcPolynomial) -> Vec<u8> {
    let crc = crc_bits(bits, poly);
    let mut out = Vec::with_capacity(bits.len() + poly.len());
    out.extend_from_slice(bits);
    append_bits(&mut out, crc, poly.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_packing() {
        let bits = vec![1, 0, 1, 0, 1, 0, 1, 0];
        let packed = pack_bits(&bits).unwrap();
        assert_eq!(packed[0], 0xAA); // 10101010

        let unpacked = unpack_bits(&packed, 8);
        assert_eq!(unpacked, bits);
    }

    #[test]
    fn test_partial_byte_is_msb_aligned() {
        let bits = vec![1, 1, 0];
        let packed = pack_bits(&bits).unwrap();
        assert_eq!(packed.as_ref(), &[0b1100_0000]);
        assert_eq!(unpack_bits(&packed, 3), bits);
    }

    #[test]
    fn test_non_binary_values_are_not_packed() {
        assert_eq!(pack_bits(&[1, 0, 1, 0, 1, 0, 1, 0, 0, 2]), Err(InvalidBit { index: 9, value: 2 }));
        assert_eq!(pack_bits(&[FILLER_BIT]), Err(InvalidBit { index: 0, value: FILLER_BIT }));
    }

    #[test]
    fn test_crc_residue_is_zero() {
        let bits: Vec<u8> = (0..40).map(|i| ((i * 7 + 3) % 5 % 2) as u8).collect();
        for poly in [CrcPolynomial::Crc24A, CrcPolynomial::Crc24B, CrcPolynomial::Crc16, CrcPolynomial::Crc11] {
            let with_crc = attach_crc(&bits, poly);
            assert_eq!(with_crc.len(), bits.len() + poly.len());
            assert_eq!(crc_bits(&with_crc, poly), 0);
        }
    }

    #[test]
    fn test_crc16_known_value() {
        // CRC-16/XMODEM of ASCII "123456789"
        let mut bits = Vec::new();
        for byte in b"123456789" {
            append_bits(&mut bits, *byte as u32, 8);
        }
        assert_eq!(crc_bits(&bits, CrcPolynomial::Crc16), 0x31C3);
    }
}
