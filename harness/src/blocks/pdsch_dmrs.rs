use super::narrow;
use crate::axis::{ParameterAxis, ParameterPoint};
use crate::contract::{BlockDescriptor, BlockTest, CaseContext, CaseOutcome, TestVector};
use crate::randomization::RandomAxis;
use crate::HarnessError;
use interfaces::{ArrayData, ElementType, FieldKind, Literal, RecordField};
use layers::phy::{DmrsType, PdschDmrsConfig};

/// Bandwidth part size in resource blocks
const BWP_SIZE: u16 = 52;

/// PDSCH DMRS placement in the resource grid
pub struct PdschDmrsTest;

impl PdschDmrsTest {
    fn dmrs_config(point: &ParameterPoint) -> Result<PdschDmrsConfig, HarnessError> {
        let dmrs_type = match point.int("dmrs_type")? {
            1 => DmrsType::Type1,
            2 => DmrsType::Type2,
            other => {
                return Err(HarnessError::MalformedAxis {
                    axis: "dmrs_type".to_string(),
                    reason: format!("no DMRS type {}", other),
                })
            }
        };
        let start_rb = point.record_int("allocation", "start_rb")?;
        let nof_rb = point.record_int("allocation", "nof_rb")?;
        Ok(PdschDmrsConfig {
            dmrs_type,
            length: narrow(point, "length")?,
            additional_positions: narrow(point, "additional_positions")?,
            port: 0,
            slot: 0,
            n_id: 0,
            n_scid: false,
            bwp_size: BWP_SIZE,
            start_rb: start_rb as u16,
            nof_rb: nof_rb as u16,
            beta: 1.0,
        })
    }

    fn config_literal(config: &PdschDmrsConfig) -> Literal {
        let dmrs_type = match config.dmrs_type {
            DmrsType::Type1 => "dmrs_type::TYPE1",
            DmrsType::Type2 => "dmrs_type::TYPE2",
        };
        Literal::List(vec![
            Literal::from(config.slot),
            Literal::from(config.n_id as u32),
            Literal::from(config.n_scid),
            Literal::code(dmrs_type),
            Literal::from(config.length as u32),
            Literal::from(config.additional_positions as u32),
            Literal::from(config.start_rb as u32),
            Literal::from(config.nof_rb as u32),
            Literal::from(config.beta as f64),
        ])
    }
}

impl BlockTest for PdschDmrsTest {
    fn descriptor(&self) -> BlockDescriptor {
        BlockDescriptor {
            name: "pdsch_dmrs",
            category: "phy/upper/signal_processors",
            includes: vec![
                "srsran/phy/upper/signal_processors/dmrs_pdsch_processor.h",
                "srsran/phy/support/resource_grid_writer_spy.h",
            ],
            fields: vec![
                RecordField::new("config", FieldKind::Record("dmrs_pdsch_processor::config_t".to_string())),
                RecordField::new("symbols", FieldKind::File(ElementType::GridEntry)),
            ],
        }
    }

    fn axes(&self) -> Vec<ParameterAxis> {
        vec![
            ParameterAxis::integers("dmrs_type", [1, 2]),
            ParameterAxis::integers("length", [1, 2]),
            ParameterAxis::integers("additional_positions", 0..=3),
            ParameterAxis::records(
                "allocation",
                &[&[("start_rb", 0), ("nof_rb", 52)], &[("start_rb", 10), ("nof_rb", 25)]],
            ),
        ]
    }

    fn random_axes(&self) -> Vec<RandomAxis> {
        vec![RandomAxis::new("slot", 20), RandomAxis::new("n_id", 1024), RandomAxis::new("n_scid", 2)]
    }

    fn is_feasible(&self, point: &ParameterPoint) -> Result<bool, HarnessError> {
        Ok(Self::dmrs_config(point)?.is_feasible())
    }

    fn generate_case(&self, ctx: &CaseContext<'_>, point: &ParameterPoint) -> Result<CaseOutcome, HarnessError> {
        let config = PdschDmrsConfig {
            slot: ctx.draw("slot")?,
            n_id: ctx.draw("n_id")? as u16,
            n_scid: ctx.draw("n_scid")? == 1,
            ..Self::dmrs_config(point)?
        };
        let entries = config.generate()?;

        Ok(CaseOutcome::Generated(
            TestVector::new()
                .config("config", Self::config_literal(&config))
                .output("symbols", "output", ArrayData::GridEntries(entries)),
        ))
    }
}
