/// Short block channel coding for 5G NR
/// Based on 3GPP TS 38.212 Sections 5.3.3 and 5.4.3

use crate::LayerError;
use common::types::ModulationScheme;
use common::utils::{PLACEHOLDER_X, PLACEHOLDER_Y};
use tracing::debug;

/// Largest message carried by the short block code
pub const MAX_MESSAGE_LENGTH: usize = 11;

/// Length of the (32, K) Reed-Muller code
const RM_CODE_LENGTH: usize = 32;

/// Basis sequences M_{i,n} of Table 5.3.3.3-1, one row per output bit
const RM_BASIS: [[u8; 11]; 32] = [
    [1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 1, 1, 0, 0, 0, 0, 0, 0, 1, 1],
    [1, 0, 0, 1, 0, 0, 1, 0, 1, 1, 1],
    [1, 0, 1, 1, 0, 0, 0, 0, 1, 0, 1],
    [1, 1, 1, 1, 0, 0, 0, 1, 0, 0, 1],
    [1, 1, 0, 0, 1, 0, 1, 1, 1, 0, 1],
    [1, 0, 1, 0, 1, 0, 1, 0, 1, 1, 1],
    [1, 0, 0, 1, 1, 0, 0, 1, 1, 0, 1],
    [1, 1, 0, 1, 1, 0, 0, 1, 0, 1, 1],
    [1, 0, 1, 1, 1, 0, 1, 0, 0, 1, 1],
    [1, 0, 1, 0, 0, 1, 1, 1, 0, 1, 1],
    [1, 1, 1, 0, 0, 1, 1, 0, 1, 0, 1],
    [1, 0, 0, 1, 0, 1, 0, 1, 1, 1, 1],
    [1, 1, 0, 1, 0, 1, 0, 1, 0, 1, 1],
    [1, 0, 0, 0, 1, 1, 0, 1, 0, 0, 1],
    [1, 1, 0, 0, 1, 1, 1, 1, 0, 1, 1],
    [1, 1, 1, 0, 1, 1, 1, 0, 0, 1, 0],
    [1, 0, 0, 1, 1, 1, 0, 0, 1, 0, 0],
    [1, 1, 0, 1, 1, 1, 1, 1, 0, 0, 0],
    [1, 0, 0, 0, 0, 1, 1, 0, 0, 0, 0],
    [1, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1],
    [1, 1, 0, 1, 0, 0, 0, 0, 0, 1, 1],
    [1, 0, 0, 0, 1, 0, 0, 1, 1, 0, 1],
    [1, 1, 1, 0, 1, 0, 0, 0, 1, 1, 1],
    [1, 1, 1, 1, 1, 0, 1, 1, 1, 1, 0],
    [1, 1, 0, 0, 0, 1, 1, 1, 0, 0, 1],
    [1, 0, 1, 1, 0, 1, 0, 0, 1, 1, 0],
    [1, 1, 1, 1, 0, 1, 0, 1, 1, 1, 0],
    [1, 0, 1, 0, 1, 1, 1, 0, 1, 0, 0],
    [1, 0, 1, 1, 1, 1, 1, 1, 1, 0, 0],
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
];

/// Short block encoder with rate matching
pub struct ShortBlockEncoder;

impl ShortBlockEncoder {
    /// Rate-matched block length used for a message length and modulation
    pub fn block_length(message_length: usize, scheme: ModulationScheme) -> usize {
        let qm = scheme.bits_per_symbol();
        match message_length {
            1 => qm,
            2 => 3 * qm,
            _ => RM_CODE_LENGTH.div_ceil(qm) * qm,
        }
    }

    /// Encode a message of 1 to 11 bits. The output may contain placeholders.
    pub fn encode(message: &[u8], scheme: ModulationScheme) -> Result<Vec<u8>, LayerError> {
        let k = message.len();
        if k == 0 || k > MAX_MESSAGE_LENGTH {
            return Err(LayerError::InvalidConfiguration(format!("Message length {} out of range", k)));
        }
        let qm = scheme.bits_per_symbol();

        let coded = match k {
            1 => {
                let mut d = vec![message[0]];
                if qm > 1 {
                    d.push(PLACEHOLDER_Y);
                    d.extend(std::iter::repeat(PLACEHOLDER_X).take(qm - 2));
                }
                d
            }
            2 => {
                let c = [message[0], message[1], message[0] ^ message[1]];
                match qm {
                    1 => c.to_vec(),
                    2 => [c, c].concat(),
                    _ => [[0, 1], [2, 0], [1, 2]]
                        .iter()
                        .flat_map(|pair| {
                            [c[pair[0]], c[pair[1]]]
                                .into_iter()
                                .chain(std::iter::repeat(PLACEHOLDER_X).take(qm - 2))
                        })
                        .collect(),
                }
            }
            _ => RM_BASIS
                .iter()
                .map(|row| message.iter().zip(row.iter()).fold(0u8, |acc, (&c, &m)| acc ^ (c & m)))
                .collect(),
        };

        Ok(coded)
    }

    /// Circular repetition of the coded bits up to `e` bits
    pub fn rate_match(coded: &[u8], e: usize) -> Vec<u8> {
        (0..e).map(|i| coded[i % coded.len()]).collect()
    }

    /// Resolve placeholders the way the scrambler sees them: x becomes 1 and
    /// y repeats the previous bit
    pub fn resolve_placeholders(bits: &[u8]) -> Vec<u8> {
        let mut out: Vec<u8> = Vec::with_capacity(bits.len());
        for &bit in bits {
            let resolved = match bit {
                PLACEHOLDER_X => 1,
                PLACEHOLDER_Y => out.last().copied().unwrap_or(1),
                b => b,
            };
            out.push(resolved);
        }
        out
    }

    /// Encode, rate match and resolve placeholders
    pub fn encode_block(message: &[u8], scheme: ModulationScheme) -> Result<Vec<u8>, LayerError> {
        let coded = Self::encode(message, scheme)?;
        let e = Self::block_length(message.len(), scheme);
        let block = Self::resolve_placeholders(&Self::rate_match(&coded, e));
        debug!("Short block encoded {} bits into {} bits ({})", message.len(), block.len(), scheme);
        Ok(block)
    }
}
