//! Resource Grid for 5G NR
//!
//! A slot-sized lattice of subcarriers, OFDM symbols and antenna ports. The
//! grid remembers which resource elements were written so that sparse
//! placements can be exported as entries.

use crate::LayerError;
use common::types::NRE;
use interfaces::ResourceGridEntry;
use ndarray::Array3;
use num_complex::Complex32;
use tracing::debug;

/// Resource grid for one slot
#[derive(Debug, Clone)]
pub struct ResourceGrid {
    /// 3D grid: [subcarriers, symbols, ports]
    grid: Array3<Complex32>,
    /// Resource elements written so far
    written: Array3<bool>,
}

impl ResourceGrid {
    /// Create an empty grid
    pub fn new(nof_prb: u16, nof_symbols: u8, nof_ports: u8) -> Result<Self, LayerError> {
        if nof_prb == 0 || nof_symbols == 0 || nof_ports == 0 {
            return Err(LayerError::InvalidConfiguration(format!(
                "Empty resource grid: {} PRB, {} symbols, {} ports",
                nof_prb, nof_symbols, nof_ports
            )));
        }

        let shape = ((nof_prb * NRE) as usize, nof_symbols as usize, nof_ports as usize);
        debug!("Creating resource grid with dimensions: {:?}", shape);

        Ok(Self {
            grid: Array3::zeros(shape),
            written: Array3::from_elem(shape, false),
        })
    }

    /// Number of subcarriers
    pub fn nof_subcarriers(&self) -> usize {
        self.grid.shape()[0]
    }

    /// Number of OFDM symbols
    pub fn nof_symbols(&self) -> usize {
        self.grid.shape()[1]
    }

    /// Write a resource element
    pub fn put(&mut self, port: u8, symbol: u8, subcarrier: u16, value: Complex32) -> Result<(), LayerError> {
        let index = (subcarrier as usize, symbol as usize, port as usize);
        match self.grid.get_mut(index) {
            Some(re) => {
                *re = value;
                self.written[index] = true;
                Ok(())
            }
            None => Err(LayerError::InvalidConfiguration(format!(
                "RE out of bounds: port={}, symbol={}, subcarrier={}",
                port, symbol, subcarrier
            ))),
        }
    }

    /// Read a resource element
    pub fn get(&self, port: u8, symbol: u8, subcarrier: u16) -> Option<Complex32> {
        self.grid.get((subcarrier as usize, symbol as usize, port as usize)).copied()
    }

    /// Written resource elements ordered by port, symbol and subcarrier
    pub fn entries(&self) -> Vec<ResourceGridEntry> {
        let (nof_subcarriers, nof_symbols, nof_ports) = self.grid.dim();
        let mut entries = Vec::new();
        for port in 0..nof_ports {
            for symbol in 0..nof_symbols {
                for subcarrier in 0..nof_subcarriers {
                    if self.written[(subcarrier, symbol, port)] {
                        entries.push(ResourceGridEntry {
                            port: port as u8,
                            symbol: symbol as u8,
                            subcarrier: subcarrier as u16,
                            value: self.grid[(subcarrier, symbol, port)],
                        });
                    }
                }
            }
        }
        entries
    }
}
