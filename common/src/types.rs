//! Common Types for 5G NR test vector generation
//!
//! Defines fundamental types shared by the reference models and the harness

use serde::{Deserialize, Serialize};
use num_derive::{FromPrimitive, ToPrimitive};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a textual identifier does not name a known variant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Radio Network Temporary Identifier (RNTI)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rnti(pub u16);

impl Rnti {
    /// Create a new RNTI
    pub fn new(value: u16) -> Self {
        Self(value)
    }

    /// Get the RNTI value
    pub fn value(&self) -> u16 {
        self.0
    }
}

/// Physical Cell Identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pci(pub u16);

impl Pci {
    /// Maximum valid PCI value (0-1007)
    pub const MAX: u16 = 1007;

    /// Number of distinct PCIs
    pub const COUNT: usize = Self::MAX as usize + 1;

    /// Create a new PCI with validation
    pub fn new(value: u16) -> Option<Self> {
        if value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }
}

/// Modulation schemes, discriminant is the modulation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive, Serialize, Deserialize)]
pub enum ModulationScheme {
    /// Binary phase shift keying
    Bpsk = 1,
    /// Quadrature phase shift keying
    Qpsk = 2,
    /// 16-point quadrature amplitude modulation
    Qam16 = 4,
    /// 64-point quadrature amplitude modulation
    Qam64 = 6,
    /// 256-point quadrature amplitude modulation
    Qam256 = 8,
}

impl ModulationScheme {
    /// All schemes in increasing order
    pub const ALL: [ModulationScheme; 5] = [
        ModulationScheme::Bpsk,
        ModulationScheme::Qpsk,
        ModulationScheme::Qam16,
        ModulationScheme::Qam64,
        ModulationScheme::Qam256,
    ];

    /// Number of bits carried by one symbol
    pub fn bits_per_symbol(&self) -> usize {
        *self as usize
    }

    /// Name used in configuration files and parameter axes
    pub fn as_str(&self) -> &'static str {
        match self {
            ModulationScheme::Bpsk => "BPSK",
            ModulationScheme::Qpsk => "QPSK",
            ModulationScheme::Qam16 => "QAM16",
            ModulationScheme::Qam64 => "QAM64",
            ModulationScheme::Qam256 => "QAM256",
        }
    }
}

impl fmt::Display for ModulationScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModulationScheme {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModulationScheme::ALL
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVariant { kind: "modulation scheme", value: s.to_string() })
    }
}

/// LDPC base graph types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LdpcBaseGraph {
    /// Base graph 1 - for larger transport blocks
    BaseGraph1,
    /// Base graph 2 - for smaller transport blocks
    BaseGraph2,
}

impl LdpcBaseGraph {
    /// Build from the graph number (1 or 2)
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            1 => Some(LdpcBaseGraph::BaseGraph1),
            2 => Some(LdpcBaseGraph::BaseGraph2),
            _ => None,
        }
    }

    /// Graph number (1 or 2)
    pub fn index(&self) -> u8 {
        match self {
            LdpcBaseGraph::BaseGraph1 => 1,
            LdpcBaseGraph::BaseGraph2 => 2,
        }
    }

    /// Maximum code block size (K_cb)
    pub fn max_code_block_size(&self) -> usize {
        match self {
            LdpcBaseGraph::BaseGraph1 => 8448,
            LdpcBaseGraph::BaseGraph2 => 3840,
        }
    }
}

/// Number of OFDM symbols in a slot with normal cyclic prefix
pub const NSYMB_PER_SLOT_NORM: u8 = 14;

/// Number of subcarriers in a resource block
pub const NRE: u16 = 12;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pci_validation() {
        assert!(Pci::new(0).is_some());
        assert!(Pci::new(1007).is_some());
        assert!(Pci::new(1008).is_none());
    }

    #[test]
    fn test_modulation_parsing() {
        assert_eq!("qpsk".parse::<ModulationScheme>(), Ok(ModulationScheme::Qpsk));
        assert_eq!("QAM256".parse::<ModulationScheme>().unwrap().bits_per_symbol(), 8);
        assert!("8PSK".parse::<ModulationScheme>().is_err());
    }

    #[test]
    fn test_base_graph_limits() {
        assert_eq!(LdpcBaseGraph::from_index(1), Some(LdpcBaseGraph::BaseGraph1));
        assert_eq!(LdpcBaseGraph::from_index(3), None);
        assert_eq!(LdpcBaseGraph::BaseGraph2.max_code_block_size(), 3840);
    }
}
