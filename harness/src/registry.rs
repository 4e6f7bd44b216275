//! Block registry and top-level dispatch

use crate::blocks;
use crate::config::HarnessConfig;
use crate::contract::BlockTest;
use crate::runner::{run_testvectors, run_validation, BlockReport};
use crate::HarnessError;
use interfaces::SystemUnderTest;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Block name selecting every registered block
pub const ALL_BLOCKS: &str = "all";

/// What a run does with the generated cases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Write data files and header files
    TestVector,
    /// Feed the cases to a system under test
    Validation,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::TestVector => "testvector",
            RunMode::Validation => "validation",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "testvector" => Ok(RunMode::TestVector),
            "validation" => Ok(RunMode::Validation),
            other => Err(HarnessError::UnknownMode(other.to_string())),
        }
    }
}

/// Blocks a run covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockSelection {
    All,
    Named(String),
}

impl BlockSelection {
    pub fn from_arg(arg: &str) -> Self {
        if arg == ALL_BLOCKS {
            BlockSelection::All
        } else {
            BlockSelection::Named(arg.to_string())
        }
    }
}

/// Block implementations by name, in registration order
#[derive(Default)]
pub struct BlockRegistry {
    blocks: Vec<(&'static str, Box<dyn BlockTest>)>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every block of the crate
    pub fn with_default_blocks() -> Result<Self, HarnessError> {
        let mut registry = Self::new();
        for block in blocks::default_blocks() {
            registry.register(block)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, block: Box<dyn BlockTest>) -> Result<(), HarnessError> {
        let descriptor = block.descriptor();
        if descriptor.name == ALL_BLOCKS || self.blocks.iter().any(|(name, _)| *name == descriptor.name) {
            return Err(HarnessError::ContractViolation {
                block: descriptor.name.to_string(),
                reason: "block name already taken".to_string(),
            });
        }
        self.blocks.push((descriptor.name, block));
        Ok(())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.blocks.iter().map(|(name, _)| *name).collect()
    }

    pub fn get(&self, name: &str) -> Result<&dyn BlockTest, HarnessError> {
        self.blocks
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, block)| block.as_ref())
            .ok_or_else(|| HarnessError::UnknownBlock(name.to_string()))
    }

    pub fn select(&self, selection: &BlockSelection) -> Result<Vec<&dyn BlockTest>, HarnessError> {
        match selection {
            BlockSelection::All => Ok(self.blocks.iter().map(|(_, block)| block.as_ref()).collect()),
            BlockSelection::Named(name) => Ok(vec![self.get(name)?]),
        }
    }

    /// Run the selected blocks one after the other.
    ///
    /// Validation of a named block the system does not implement is an
    /// error; an `all` validation covers the blocks the system implements.
    pub fn run(
        &self,
        selection: &BlockSelection,
        mode: RunMode,
        config: &HarnessConfig,
        system: Option<&mut dyn SystemUnderTest>,
    ) -> Result<Vec<BlockReport>, HarnessError> {
        let selected = self.select(selection)?;
        let mut reports = Vec::with_capacity(selected.len());

        match mode {
            RunMode::TestVector => {
                for block in selected {
                    reports.push(run_testvectors(block, config)?);
                }
            }
            RunMode::Validation => {
                let system = system.ok_or_else(|| {
                    HarnessError::Config("validation mode requires a system under test".to_string())
                })?;
                let supported: Vec<&dyn BlockTest> = match selection {
                    BlockSelection::All => {
                        selected.into_iter().filter(|block| system.supports(block.descriptor().name)).collect()
                    }
                    BlockSelection::Named(_) => selected,
                };
                if supported.is_empty() {
                    return Err(HarnessError::UnsupportedMode { block: ALL_BLOCKS.to_string(), mode: mode.to_string() });
                }
                for block in supported {
                    reports.push(run_validation(block, config, system)?);
                }
            }
        }

        info!("Finished {} run of {} blocks", mode, reports.len());
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("testvector".parse::<RunMode>().unwrap(), RunMode::TestVector);
        assert_eq!("validation".parse::<RunMode>().unwrap(), RunMode::Validation);
        assert!(matches!("replay".parse::<RunMode>(), Err(HarnessError::UnknownMode(m)) if m == "replay"));
    }

    #[test]
    fn test_selection() {
        let registry = BlockRegistry::with_default_blocks().unwrap();
        assert_eq!(registry.select(&BlockSelection::from_arg("all")).unwrap().len(), registry.names().len());
        assert_eq!(registry.select(&BlockSelection::from_arg("pbch_dmrs")).unwrap().len(), 1);
        assert!(matches!(
            registry.select(&BlockSelection::from_arg("polar_encoder")),
            Err(HarnessError::UnknownBlock(name)) if name == "polar_encoder"
        ));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut registry = BlockRegistry::with_default_blocks().unwrap();
        assert!(registry.register(Box::new(blocks::PbchDmrsTest)).is_err());
    }
}
