/// LDPC code block segmentation for 5G NR
/// Based on 3GPP TS 38.212 Sections 5.2.2 and 7.2.3

use crate::LayerError;
use common::types::LdpcBaseGraph;
use common::utils::{attach_crc, CrcPolynomial, FILLER_BIT};
use tracing::debug;

/// LDPC lifting size sets as per Table 5.3.2-1
const LIFTING_SIZE_SET: [usize; 51] = [
    2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 18, 20, 22, 24,
    26, 28, 30, 32, 36, 40, 44, 48, 52, 56, 60, 64, 72, 80, 88, 96, 104,
    112, 120, 128, 144, 160, 176, 192, 208, 224, 240, 256, 288, 320, 352, 384
];

/// Transport block sizes above this use the 24-bit transport block CRC
const TB_CRC16_MAX_SIZE: usize = 3824;

/// Sizes derived from a transport block size and base graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentPlan {
    /// Transport block CRC length
    pub tb_crc_length: usize,
    /// Number of code blocks (C)
    pub nof_segments: usize,
    /// Code block CRC length (L)
    pub cb_crc_length: usize,
    /// Information bits per segment, CRC included (K')
    pub info_length: usize,
    /// Lifting size (Z_c)
    pub lifting_size: usize,
    /// Segment length with filler bits (K)
    pub segment_length: usize,
}

impl SegmentPlan {
    /// Number of filler bits per segment
    pub fn nof_filler_bits(&self) -> usize {
        self.segment_length - self.info_length
    }
}

/// Segmented transport block
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationResult {
    pub plan: SegmentPlan,
    /// One entry per code block, one bit per byte, filler bits set to `FILLER_BIT`
    pub segments: Vec<Vec<u8>>,
}

/// LDPC code block segmenter
pub struct LdpcSegmenter;

impl LdpcSegmenter {
    /// Compute the segmentation sizes without touching any data
    pub fn plan(tbs: usize, base_graph: LdpcBaseGraph) -> Result<SegmentPlan, LayerError> {
        if tbs == 0 {
            return Err(LayerError::InvalidConfiguration("Empty transport block".to_string()));
        }

        let tb_crc_length = if tbs > TB_CRC16_MAX_SIZE { 24 } else { 16 };
        let b = tbs + tb_crc_length;
        let k_cb = base_graph.max_code_block_size();

        let (nof_segments, cb_crc_length) = if b <= k_cb {
            (1, 0)
        } else {
            (b.div_ceil(k_cb - 24), 24)
        };

        let b_prime = b + nof_segments * cb_crc_length;
        if b_prime % nof_segments != 0 {
            return Err(LayerError::InvalidConfiguration(format!(
                "TBS {} does not split evenly into {} code blocks",
                tbs, nof_segments
            )));
        }
        let info_length = b_prime / nof_segments;

        let k_b = match base_graph {
            LdpcBaseGraph::BaseGraph1 => 22,
            LdpcBaseGraph::BaseGraph2 if b > 640 => 10,
            LdpcBaseGraph::BaseGraph2 if b > 560 => 9,
            LdpcBaseGraph::BaseGraph2 if b > 192 => 8,
            LdpcBaseGraph::BaseGraph2 => 6,
        };

        let lifting_size = LIFTING_SIZE_SET
            .iter()
            .copied()
            .find(|&z| k_b * z >= info_length)
            .ok_or_else(|| LayerError::InvalidConfiguration(format!("No lifting size for K'={}", info_length)))?;

        let segment_length = match base_graph {
            LdpcBaseGraph::BaseGraph1 => 22 * lifting_size,
            LdpcBaseGraph::BaseGraph2 => 10 * lifting_size,
        };

        Ok(SegmentPlan {
            tb_crc_length,
            nof_segments,
            cb_crc_length,
            info_length,
            lifting_size,
            segment_length,
        })
    }

    /// Attach the transport block CRC and split into code blocks
    pub fn segment(tb_bits: &[u8], base_graph: LdpcBaseGraph) -> Result<SegmentationResult, LayerError> {
        let plan = Self::plan(tb_bits.len(), base_graph)?;

        let tb_crc = if plan.tb_crc_length == 24 { CrcPolynomial::Crc24A } else { CrcPolynomial::Crc16 };
        let b = attach_crc(tb_bits, tb_crc);

        let payload_per_segment = plan.info_length - plan.cb_crc_length;
        let segments: Vec<Vec<u8>> = b
            .chunks(payload_per_segment)
            .map(|chunk| {
                let mut segment = if plan.nof_segments > 1 {
                    attach_crc(chunk, CrcPolynomial::Crc24B)
                } else {
                    chunk.to_vec()
                };
                segment.resize(plan.segment_length, FILLER_BIT);
                segment
            })
            .collect();

        if segments.len() != plan.nof_segments {
            return Err(LayerError::ProcessingError(format!(
                "Produced {} segments, expected {}",
                segments.len(),
                plan.nof_segments
            )));
        }

        debug!(
            "Segmented TBS {} with BG{}: C={}, K'={}, Z={}, K={}",
            tb_bits.len(),
            base_graph.index(),
            plan.nof_segments,
            plan.info_length,
            plan.lifting_size,
            plan.segment_length
        );

        Ok(SegmentationResult { plan, segments })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::utils::crc_bits;

    #[test]
    fn test_small_block_single_segment() {
        let plan = LdpcSegmenter::plan(96, LdpcBaseGraph::BaseGraph1).unwrap();
        assert_eq!(plan.nof_segments, 1);
        assert_eq!(plan.tb_crc_length, 16);
        assert_eq!(plan.info_length, 112);
        assert_eq!(plan.lifting_size, 6);
        assert_eq!(plan.segment_length, 132);
        assert_eq!(plan.nof_filler_bits(), 20);
    }

    #[test]
    fn test_base_graph_2_columns() {
        let plan = LdpcSegmenter::plan(96, LdpcBaseGraph::BaseGraph2).unwrap();
        // B = 112 <= 192, so K_b = 6 and Z = 20
        assert_eq!(plan.lifting_size, 20);
        assert_eq!(plan.segment_length, 200);
    }

    #[test]
    fn test_large_block_segments_carry_crc() {
        let tb: Vec<u8> = (0..10000).map(|i| ((i * 31 + 7) % 11 % 2) as u8).collect();
        let result = LdpcSegmenter::segment(&tb, LdpcBaseGraph::BaseGraph1).unwrap();
        assert_eq!(result.plan.nof_segments, 2);
        assert_eq!(result.plan.info_length, 5036);
        for segment in &result.segments {
            assert_eq!(segment.len(), result.plan.segment_length);
            let info = &segment[..result.plan.info_length];
            assert_eq!(crc_bits(info, CrcPolynomial::Crc24B), 0);
            assert!(segment[result.plan.info_length..].iter().all(|&b| b == FILLER_BIT));
        }
        assert_eq!(&result.segments[0][..100], &tb[..100]);
    }

    #[test]
    fn test_uneven_split_is_rejected() {
        // B = 10025 + 48 is odd, so it cannot split in two equal blocks
        assert!(LdpcSegmenter::plan(10001, LdpcBaseGraph::BaseGraph1).is_err());
        assert!(LdpcSegmenter::plan(0, LdpcBaseGraph::BaseGraph1).is_err());
    }
}
