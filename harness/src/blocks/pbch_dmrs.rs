use super::narrow;
use crate::axis::{ParameterAxis, ParameterPoint};
use crate::contract::{BlockDescriptor, BlockTest, CaseContext, CaseOutcome, TestVector};
use crate::randomization::RandomAxis;
use crate::HarnessError;
use common::types::Pci;
use interfaces::{ArrayData, ElementType, FieldKind, Literal, RecordField};
use layers::phy::PbchDmrsConfig;

/// PBCH DMRS placement in the SS/PBCH block
pub struct PbchDmrsTest;

impl PbchDmrsTest {
    fn dmrs_config(point: &ParameterPoint, n_id: u16) -> Result<PbchDmrsConfig, HarnessError> {
        Ok(PbchDmrsConfig {
            n_id,
            ssb_index: narrow(point, "ssb_index")?,
            l_max: narrow(point, "l_max")?,
            n_hf: narrow(point, "n_hf")?,
            beta: 1.0,
        })
    }
}

impl BlockTest for PbchDmrsTest {
    fn descriptor(&self) -> BlockDescriptor {
        BlockDescriptor {
            name: "pbch_dmrs",
            category: "phy/upper/signal_processors",
            includes: vec![
                "srsran/phy/upper/signal_processors/dmrs_pbch_processor.h",
                "srsran/phy/support/resource_grid_writer_spy.h",
            ],
            fields: vec![
                RecordField::new("config", FieldKind::Record("dmrs_pbch_processor::config_t".to_string())),
                RecordField::new("symbols", FieldKind::File(ElementType::GridEntry)),
            ],
        }
    }

    fn axes(&self) -> Vec<ParameterAxis> {
        vec![
            ParameterAxis::integers("l_max", [4, 8, 64]),
            ParameterAxis::integers("ssb_index", [0, 3, 7, 15, 63]),
            ParameterAxis::integers("n_hf", [0, 1]),
        ]
    }

    fn random_axes(&self) -> Vec<RandomAxis> {
        vec![RandomAxis::new("cell_id", Pci::COUNT as u32)]
    }

    fn is_feasible(&self, point: &ParameterPoint) -> Result<bool, HarnessError> {
        Ok(Self::dmrs_config(point, 0)?.is_feasible())
    }

    fn generate_case(&self, ctx: &CaseContext<'_>, point: &ParameterPoint) -> Result<CaseOutcome, HarnessError> {
        let cell_id = ctx.draw("cell_id")?;
        let pci = Pci::new(cell_id as u16).ok_or_else(|| HarnessError::ContractViolation {
            block: "pbch_dmrs".to_string(),
            reason: format!("cell ID {} out of range", cell_id),
        })?;
        let config = Self::dmrs_config(point, pci.0)?;
        let entries = config.generate()?;

        Ok(CaseOutcome::Generated(
            TestVector::new()
                .config(
                    "config",
                    Literal::List(vec![
                        Literal::from(config.n_id as u32),
                        Literal::from(config.ssb_index as u32),
                        Literal::from(config.l_max as u32),
                        Literal::from(config.n_hf as u32),
                        Literal::from(config.beta as f64),
                    ]),
                )
                .output("symbols", "output", ArrayData::GridEntries(entries)),
        ))
    }
}
