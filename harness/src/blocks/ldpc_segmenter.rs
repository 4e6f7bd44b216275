use super::{narrow, random_bits};
use crate::axis::{ParameterAxis, ParameterPoint};
use crate::contract::{BlockDescriptor, BlockTest, CaseContext, CaseOutcome, TestVector};
use crate::HarnessError;
use common::types::LdpcBaseGraph;
use interfaces::{ArrayData, ElementType, FieldKind, Literal, RecordField};
use layers::phy::LdpcSegmenter;

/// Largest transport block handled with base graph 2
const BG2_MAX_TBS: usize = 3824;

/// LDPC segmentation: transport block in, code blocks with filler bits out
pub struct LdpcSegmenterTest;

impl LdpcSegmenterTest {
    fn base_graph(point: &ParameterPoint) -> Result<LdpcBaseGraph, HarnessError> {
        let index = point.int("base_graph")?;
        LdpcBaseGraph::from_index(index).ok_or_else(|| HarnessError::MalformedAxis {
            axis: "base_graph".to_string(),
            reason: format!("no base graph {}", index),
        })
    }
}

impl BlockTest for LdpcSegmenterTest {
    fn descriptor(&self) -> BlockDescriptor {
        BlockDescriptor {
            name: "ldpc_segmenter",
            category: "phy/upper/channel_coding/ldpc",
            includes: vec!["srsran/phy/upper/channel_coding/ldpc/ldpc.h"],
            fields: vec![
                RecordField::new("base_graph", FieldKind::Label("ldpc_base_graph_type".to_string())),
                RecordField::new("tbs", FieldKind::Integer),
                RecordField::new("nof_segments", FieldKind::Integer),
                RecordField::new("segment_length", FieldKind::Integer),
                RecordField::new("trans_block", FieldKind::File(ElementType::PackedBits)),
                RecordField::new("segments", FieldKind::File(ElementType::U8)),
            ],
        }
    }

    fn axes(&self) -> Vec<ParameterAxis> {
        vec![
            ParameterAxis::integers("base_graph", [1, 2]),
            ParameterAxis::integers("tbs", [96, 1024, 3824, 10000, 25344]),
        ]
    }

    /// Base graph 2 only carries transport blocks up to `BG2_MAX_TBS`. Any
    /// other segmentation failure is an error of the reference.
    fn is_feasible(&self, point: &ParameterPoint) -> Result<bool, HarnessError> {
        let base_graph = Self::base_graph(point)?;
        let tbs: usize = narrow(point, "tbs")?;
        Ok(base_graph == LdpcBaseGraph::BaseGraph1 || tbs <= BG2_MAX_TBS)
    }

    fn generate_case(&self, ctx: &CaseContext<'_>, point: &ParameterPoint) -> Result<CaseOutcome, HarnessError> {
        let base_graph = Self::base_graph(point)?;
        let tbs: usize = narrow(point, "tbs")?;

        let trans_block = random_bits(&mut ctx.rng(), tbs);
        let result = LdpcSegmenter::segment(&trans_block, base_graph)?;
        let segments: Vec<u8> = result.segments.concat();

        Ok(CaseOutcome::Generated(
            TestVector::new()
                .config("base_graph", Literal::code(format!("ldpc_base_graph_type::BG{}", base_graph.index())))
                .config("tbs", tbs)
                .config("nof_segments", result.plan.nof_segments)
                .config("segment_length", result.plan.segment_length)
                .input("trans_block", "input", ArrayData::Bits(trans_block))
                .output("segments", "output", ArrayData::Bytes(segments)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::AxisValue;
    use crate::randomization::RandomizationState;

    fn point(base_graph: i64, tbs: i64) -> ParameterPoint {
        ParameterPoint::new(vec![
            ("base_graph".to_string(), AxisValue::Int(base_graph)),
            ("tbs".to_string(), AxisValue::Int(tbs)),
        ])
    }

    #[test]
    fn test_bg2_limit_is_the_only_skip() {
        let block = LdpcSegmenterTest;
        assert!(block.is_feasible(&point(2, 3824)).unwrap());
        assert!(!block.is_feasible(&point(2, 3825)).unwrap());
        assert!(block.is_feasible(&point(1, 25344)).unwrap());
        assert!(block.is_feasible(&point(1, 10001)).unwrap());
    }

    #[test]
    fn test_segmentation_failure_is_not_a_skip() {
        let block = LdpcSegmenterTest;
        let random = RandomizationState::new(0, "ldpc_segmenter", &[]).unwrap();
        let ctx = CaseContext::new(0, &random);
        // 10001 + 24 + 2 * 24 bits do not split evenly into two code blocks
        let err = block.generate_case(&ctx, &point(1, 10001)).unwrap_err();
        assert!(matches!(err, HarnessError::Reference(_)));
    }
}
