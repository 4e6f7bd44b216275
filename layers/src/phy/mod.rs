//! Physical Layer (PHY) Reference Models
//!
//! Each submodule is the trusted oracle of one block under test.

pub mod resource_grid;
pub mod modulation;
pub mod sequence;
pub mod ldpc;
pub mod short_block;
pub mod pdcch;
pub mod dmrs;

// Re-export commonly used types
pub use resource_grid::ResourceGrid;
pub use modulation::{DemodulationMapper, ModulationMapper, LLR_MAX};
pub use sequence::PseudoRandomGenerator;
pub use ldpc::{LdpcSegmenter, SegmentationResult};
pub use short_block::ShortBlockEncoder;
pub use pdcch::{PdcchCandidates, SearchSpaceConfig};
pub use dmrs::{DmrsType, PbchDmrsConfig, PdschDmrsConfig};
