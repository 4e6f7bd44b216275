use super::narrow;
use crate::axis::{ParameterAxis, ParameterPoint};
use crate::combinations::CombinationMode;
use crate::contract::{BlockDescriptor, BlockTest, CaseContext, CaseOutcome, TestVector};
use crate::randomization::RandomAxis;
use crate::HarnessError;
use common::types::Rnti;
use interfaces::literal::to_literal;
use interfaces::{ArrayData, ElementType, FieldKind, RecordField};
use layers::phy::pdcch::AGGREGATION_LEVELS;
use layers::phy::{PdcchCandidates, SearchSpaceConfig};

/// CORESET used for every case
const CORESET_ID: u32 = 1;

/// Largest C-RNTI value
const MAX_C_RNTI: u32 = 0xffef;

/// Slots per frame with 30 kHz subcarrier spacing
const NOF_SLOTS_PER_FRAME: u32 = 20;

/// UE-specific search space candidates of one aggregation level
pub struct PdcchCandidatesUeTest;

impl PdcchCandidatesUeTest {
    fn search_space(ctx: &CaseContext<'_>, point: &ParameterPoint) -> Result<SearchSpaceConfig, HarnessError> {
        // One CCE per 6-RB group and symbol
        let nof_groups: u32 = narrow(point, "frequency_resources")?;
        let duration: u32 = narrow(point, "duration")?;
        let rnti = Rnti::new((ctx.draw("rnti")? + 1) as u16);
        Ok(SearchSpaceConfig {
            coreset_id: CORESET_ID,
            nof_cce: nof_groups * duration,
            aggregation_level: narrow(point, "aggregation_level")?,
            nof_candidates: narrow(point, "nof_candidates")?,
            slot: ctx.draw("slot")?,
            rnti: rnti.value() as u32,
        })
    }
}

impl BlockTest for PdcchCandidatesUeTest {
    fn descriptor(&self) -> BlockDescriptor {
        BlockDescriptor {
            name: "pdcch_candidates_ue",
            category: "phy/upper/channel_processors/pdcch",
            includes: vec!["srsran/ran/pdcch/search_space.h"],
            fields: vec![
                RecordField::new("config", FieldKind::Record("search_space_config".to_string())),
                RecordField::new("candidates", FieldKind::File(ElementType::U8)),
            ],
        }
    }

    fn axes(&self) -> Vec<ParameterAxis> {
        vec![
            ParameterAxis::integers("frequency_resources", [4, 8, 24]),
            ParameterAxis::integers("duration", [1, 2, 3]),
            ParameterAxis::integers("aggregation_level", AGGREGATION_LEVELS.iter().map(|&l| l as i64)),
            ParameterAxis::integers("nof_candidates", [1, 2, 4]),
        ]
    }

    fn combination_mode(&self) -> CombinationMode {
        CombinationMode::Pairwise
    }

    fn random_axes(&self) -> Vec<RandomAxis> {
        vec![RandomAxis::new("rnti", MAX_C_RNTI), RandomAxis::new("slot", NOF_SLOTS_PER_FRAME)]
    }

    fn generate_case(&self, ctx: &CaseContext<'_>, point: &ParameterPoint) -> Result<CaseOutcome, HarnessError> {
        let config = Self::search_space(ctx, point)?;
        if !PdcchCandidates::is_feasible(&config) {
            return Ok(CaseOutcome::Skip(format!(
                "{} candidates of aggregation level {} exceed {} CCE",
                config.nof_candidates, config.aggregation_level, config.nof_cce
            )));
        }

        let candidates = PdcchCandidates::compute(&config)?;
        let candidates: Vec<u8> = candidates.into_iter().map(|cce| cce as u8).collect();

        Ok(CaseOutcome::Generated(
            TestVector::new()
                .config("config", to_literal(&config)?)
                .output("candidates", "output", ArrayData::Bytes(candidates)),
        ))
    }
}
