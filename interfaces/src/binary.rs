//! Binary data files
//!
//! Flat, un-framed, little-endian arrays. One file holds exactly one array:
//!
//! | element        | encoding                                              |
//! |----------------|-------------------------------------------------------|
//! | `U8`           | one byte per element, verbatim                        |
//! | `PackedBits`   | 8 bits per byte, MSB first, last byte zero padded     |
//! | `ComplexF32`   | `re: f32`, `im: f32` interleaved                      |
//! | `F32`          | one `f32` per element                                 |
//! | `Llr`          | one `i8` per element, already quantized by the caller |
//! | `GridEntry`    | `port: u8`, `symbol: u8`, `subcarrier: u16`, `re: f32`, `im: f32` |

use crate::InterfaceError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use common::utils::{pack_bits, unpack_bits, InvalidBit};
use num_complex::Complex32;
use std::fs;
use std::path::Path;
use tracing::trace;

/// Size in bytes of one resource grid entry on disk
pub const GRID_ENTRY_SIZE: usize = 12;

/// Element type of a serialized array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    U8,
    PackedBits,
    ComplexF32,
    F32,
    Llr,
    GridEntry,
}

impl ElementType {
    /// Element type name used by the native reader
    pub fn c_type(&self) -> &'static str {
        match self {
            ElementType::U8 | ElementType::PackedBits => "uint8_t",
            ElementType::ComplexF32 => "cf_t",
            ElementType::F32 => "float",
            ElementType::Llr => "log_likelihood_ratio",
            ElementType::GridEntry => "resource_grid_writer_spy::expected_entry_t",
        }
    }

    /// Whether values of this type must compare bit-exact
    pub fn is_exact(&self) -> bool {
        !matches!(self, ElementType::ComplexF32 | ElementType::F32 | ElementType::GridEntry)
    }
}

/// One non-zero resource element of a resource grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceGridEntry {
    /// Antenna port
    pub port: u8,
    /// OFDM symbol index within the slot
    pub symbol: u8,
    /// Subcarrier index
    pub subcarrier: u16,
    /// Complex value
    pub value: Complex32,
}

/// A typed in-memory array ready to be written to a data file
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Bytes(Vec<u8>),
    /// Unpacked bits, written packed
    Bits(Vec<u8>),
    Complex(Vec<Complex32>),
    Floats(Vec<f32>),
    Llrs(Vec<i8>),
    GridEntries(Vec<ResourceGridEntry>),
}

impl ArrayData {
    /// Element type of the array
    pub fn element_type(&self) -> ElementType {
        match self {
            ArrayData::Bytes(_) => ElementType::U8,
            ArrayData::Bits(_) => ElementType::PackedBits,
            ArrayData::Complex(_) => ElementType::ComplexF32,
            ArrayData::Floats(_) => ElementType::F32,
            ArrayData::Llrs(_) => ElementType::Llr,
            ArrayData::GridEntries(_) => ElementType::GridEntry,
        }
    }

    /// Number of elements (bits for `Bits`)
    pub fn len(&self) -> usize {
        match self {
            ArrayData::Bytes(v) | ArrayData::Bits(v) => v.len(),
            ArrayData::Complex(v) => v.len(),
            ArrayData::Floats(v) => v.len(),
            ArrayData::Llrs(v) => v.len(),
            ArrayData::GridEntries(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Encode the array with the documented layout
    pub fn encode(&self) -> Result<Bytes, InvalidBit> {
        let encoded = match self {
            ArrayData::Bytes(v) => Bytes::copy_from_slice(v),
            ArrayData::Bits(v) => pack_bits(v)?,
            ArrayData::Complex(v) => {
                let mut buf = BytesMut::with_capacity(v.len() * 8);
                for c in v {
                    buf.put_f32_le(c.re);
                    buf.put_f32_le(c.im);
                }
                buf.freeze()
            }
            ArrayData::Floats(v) => {
                let mut buf = BytesMut::with_capacity(v.len() * 4);
                for &x in v {
                    buf.put_f32_le(x);
                }
                buf.freeze()
            }
            ArrayData::Llrs(v) => {
                let mut buf = BytesMut::with_capacity(v.len());
                for &x in v {
                    buf.put_i8(x);
                }
                buf.freeze()
            }
            ArrayData::GridEntries(v) => {
                let mut buf = BytesMut::with_capacity(v.len() * GRID_ENTRY_SIZE);
                for e in v {
                    buf.put_u8(e.port);
                    buf.put_u8(e.symbol);
                    buf.put_u16_le(e.subcarrier);
                    buf.put_f32_le(e.value.re);
                    buf.put_f32_le(e.value.im);
                }
                buf.freeze()
            }
        };
        Ok(encoded)
    }

    /// Decode a buffer. `nof_bits` trims packed bit arrays to their true length.
    pub fn decode(mut data: &[u8], element: ElementType, nof_bits: Option<usize>) -> Result<Self, String> {
        let len = data.len();
        let array = match element {
            ElementType::U8 => ArrayData::Bytes(data.to_vec()),
            ElementType::PackedBits => {
                let nof_bits = nof_bits.unwrap_or(data.len() * 8);
                if nof_bits.div_ceil(8) != data.len() {
                    return Err(format!("{} bytes cannot hold exactly {} packed bits", data.len(), nof_bits));
                }
                ArrayData::Bits(unpack_bits(data, nof_bits))
            }
            ElementType::ComplexF32 => {
                check_stride(len, 8)?;
                let mut out = Vec::with_capacity(data.len() / 8);
                while data.has_remaining() {
                    let re = data.get_f32_le();
                    let im = data.get_f32_le();
                    out.push(Complex32::new(re, im));
                }
                ArrayData::Complex(out)
            }
            ElementType::F32 => {
                check_stride(len, 4)?;
                let mut out = Vec::with_capacity(data.len() / 4);
                while data.has_remaining() {
                    out.push(data.get_f32_le());
                }
                ArrayData::Floats(out)
            }
            ElementType::Llr => ArrayData::Llrs(data.iter().map(|&b| b as i8).collect()),
            ElementType::GridEntry => {
                check_stride(len, GRID_ENTRY_SIZE)?;
                let mut out = Vec::with_capacity(data.len() / GRID_ENTRY_SIZE);
                while data.has_remaining() {
                    let port = data.get_u8();
                    let symbol = data.get_u8();
                    let subcarrier = data.get_u16_le();
                    let re = data.get_f32_le();
                    let im = data.get_f32_le();
                    out.push(ResourceGridEntry { port, symbol, subcarrier, value: Complex32::new(re, im) });
                }
                ArrayData::GridEntries(out)
            }
        };
        Ok(array)
    }
}

fn check_stride(len: usize, stride: usize) -> Result<(), String> {
    if len % stride != 0 {
        Err(format!("{} bytes is not a multiple of {}", len, stride))
    } else {
        Ok(())
    }
}

/// Write an array to a data file, replacing any previous content
pub fn write_array(path: &Path, array: &ArrayData) -> Result<(), InterfaceError> {
    let encoded = array
        .encode()
        .map_err(|e| InterfaceError::MalformedArtifact { path: path.to_path_buf(), reason: e.to_string() })?;
    fs::write(path, &encoded).map_err(|e| InterfaceError::io(path, e))?;
    trace!("Wrote {} bytes ({} x {:?}) to {}", encoded.len(), array.len(), array.element_type(), path.display());
    Ok(())
}

/// Read an array back from a data file
pub fn read_array(path: &Path, element: ElementType, nof_bits: Option<usize>) -> Result<ArrayData, InterfaceError> {
    let data = fs::read(path).map_err(|e| InterfaceError::io(path, e))?;
    ArrayData::decode(&data, element, nof_bits)
        .map_err(|reason| InterfaceError::MalformedArtifact { path: path.to_path_buf(), reason })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bits_are_packed_msb_first() {
        let array = ArrayData::Bits(vec![1, 0, 0, 0, 0, 0, 0, 1, 1]);
        assert_eq!(array.encode().unwrap().as_ref(), &[0x81, 0x80]);
    }

    #[test]
    fn test_complex_layout() {
        let array = ArrayData::Complex(vec![Complex32::new(1.0, -2.0)]);
        let encoded = array.encode().unwrap();
        assert_eq!(&encoded[..4], &1.0f32.to_le_bytes());
        assert_eq!(&encoded[4..], &(-2.0f32).to_le_bytes());
    }

    #[test]
    fn test_grid_entry_layout() {
        let entry = ResourceGridEntry { port: 1, symbol: 13, subcarrier: 0x0102, value: Complex32::new(0.5, 0.25) };
        let encoded = ArrayData::GridEntries(vec![entry]).encode().unwrap();
        assert_eq!(encoded.len(), GRID_ENTRY_SIZE);
        assert_eq!(&encoded[..4], &[1, 13, 0x02, 0x01]);
    }

    #[test]
    fn test_round_trip_through_files() {
        let dir = TempDir::new().unwrap();
        let bits: Vec<u8> = (0..514).map(|i| ((i * 13) % 7 % 2) as u8).collect();
        let cases = vec![
            (ArrayData::Bits(bits.clone()), Some(bits.len())),
            (ArrayData::Bytes(vec![0, 1, 254, 255]), None),
            (ArrayData::Llrs(vec![-120, -1, 0, 1, 120]), None),
            (ArrayData::Floats(vec![0.1, -3.5e-3]), None),
            (ArrayData::Complex(vec![Complex32::new(0.70710677, -0.70710677); 3]), None),
        ];

        for (i, (array, nof_bits)) in cases.into_iter().enumerate() {
            let path = dir.path().join(format!("array{}.dat", i));
            write_array(&path, &array).unwrap();
            let read = read_array(&path, array.element_type(), nof_bits).unwrap();
            assert_eq!(read, array);
        }
    }

    #[test]
    fn test_empty_grid_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.dat");
        write_array(&path, &ArrayData::GridEntries(Vec::new())).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
        let read = read_array(&path, ElementType::GridEntry, None).unwrap();
        assert!(read.is_empty());
    }

    #[test]
    fn test_truncated_complex_is_rejected() {
        assert!(ArrayData::decode(&[0u8; 12], ElementType::ComplexF32, None).is_err());
        assert!(ArrayData::decode(&[0u8; 2], ElementType::PackedBits, Some(20)).is_err());
    }

    #[test]
    fn test_non_binary_bits_are_not_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bits.dat");
        let err = write_array(&path, &ArrayData::Bits(vec![1, 0, 254])).unwrap_err();
        assert!(matches!(err, InterfaceError::MalformedArtifact { ref reason, .. } if reason.contains("254")));
        assert!(!path.exists());
    }

    #[test]
    fn test_unwritable_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("file.dat");
        let err = write_array(&path, &ArrayData::Bytes(vec![1])).unwrap_err();
        assert!(matches!(err, InterfaceError::Io { .. }));
    }
}
