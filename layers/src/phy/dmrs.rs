/// DMRS (Demodulation Reference Signal) generation for PDSCH and PBCH
/// Based on 3GPP TS 38.211 Sections 7.4.1.1 and 7.4.1.4

use super::resource_grid::ResourceGrid;
use super::sequence::PseudoRandomGenerator;
use crate::LayerError;
use common::types::{NRE, NSYMB_PER_SLOT_NORM};
use interfaces::ResourceGridEntry;
use num_complex::Complex32;
use serde::Serialize;
use tracing::debug;

/// DMRS Type configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DmrsType {
    Type1,
    Type2,
}

impl DmrsType {
    /// Get number of DMRS per resource block
    pub fn nof_dmrs_per_rb(&self) -> usize {
        match self {
            DmrsType::Type1 => 6,  // Every other subcarrier
            DmrsType::Type2 => 4,  // Two groups of 2 consecutive subcarriers
        }
    }

    /// Number of antenna ports the type supports with double-symbol DMRS
    pub fn max_ports(&self) -> u8 {
        match self {
            DmrsType::Type1 => 8,
            DmrsType::Type2 => 12,
        }
    }
}

/// CDM weights for PDSCH DMRS
#[derive(Debug, Clone)]
pub struct DmrsWeights {
    /// Frequency domain weights [w_f(0), w_f(1)]
    pub w_f: [f32; 2],
    /// Time domain weights [w_t(0), w_t(1)]
    pub w_t: [f32; 2],
}

/// Get DMRS subcarriers within a resource block and CDM weights for a port
pub fn get_pdsch_dmrs_params(dmrs_type: DmrsType, dmrs_port: u8) -> Result<(Vec<u16>, DmrsWeights), LayerError> {
    if dmrs_port >= dmrs_type.max_ports() {
        return Err(LayerError::InvalidConfiguration(format!(
            "Invalid DMRS port {} for {:?}",
            dmrs_port, dmrs_type
        )));
    }

    let (subcarriers, nof_cdm_groups): (Vec<u16>, u8) = match dmrs_type {
        DmrsType::Type1 => {
            let delta = ((dmrs_port / 2) % 2) as u16;
            ((0..6).map(|k| 2 * k + delta).collect(), 2)
        }
        DmrsType::Type2 => {
            let delta = 2 * ((dmrs_port / 2) % 3) as u16;
            (vec![delta, delta + 1, delta + 6, delta + 7], 3)
        }
    };

    let w_f1 = if dmrs_port % 2 == 0 { 1.0 } else { -1.0 };
    let w_t1 = if dmrs_port / (2 * nof_cdm_groups) == 0 { 1.0 } else { -1.0 };

    Ok((subcarriers, DmrsWeights { w_f: [1.0, w_f1], w_t: [1.0, w_t1] }))
}

/// Calculate PDSCH DMRS initialization value
/// c_init = (2^17 * (14 * n_slot + l + 1) * (2 * N_ID + 1) + 2 * N_ID + n_SCID) mod 2^31
pub fn calculate_pdsch_dmrs_cinit(slot: u32, symbol: u8, n_id: u16, n_scid: bool) -> u32 {
    let l = symbol as u64;
    let n_symb_slot = NSYMB_PER_SLOT_NORM as u64;
    let scid = if n_scid { 1 } else { 0 };
    let n_id = n_id as u64;
    (((1u64 << 17) * (n_symb_slot * slot as u64 + l + 1) * (2 * n_id + 1) + 2 * n_id + scid) & 0x7FFFFFFF) as u32
}

/// Calculate PBCH DMRS initialization value
/// According to 3GPP TS 38.211 Section 7.4.1.4.1
pub fn calculate_pbch_dmrs_cinit(n_id: u16, ssb_idx: u8, n_hf: u8, l_max: u8) -> u32 {
    let i_ssb = if l_max == 4 {
        // For L_max = 4: i_ssb = least 2 significant bits of SSB index + 4 * n_hf
        ((ssb_idx & 0b11) as u32) + 4 * (n_hf as u32)
    } else {
        // For L_max = 8 or 64: i_ssb = least 3 significant bits of SSB index
        (ssb_idx & 0b111) as u32
    };

    // c_init = 2^11 * (i_ssb + 1) * (floor(N_ID/4) + 1) + 2^6 * (i_ssb + 1) + (N_ID mod 4)
    let n_id_div_4 = (n_id / 4) as u32;
    let n_id_mod_4 = (n_id % 4) as u32;

    (((i_ssb + 1) * (n_id_div_4 + 1)) << 11) + ((i_ssb + 1) << 6) + n_id_mod_4
}

/// Generate DMRS sequence for given resource blocks
pub fn generate_dmrs_sequence(
    rb_mask: &[bool],
    nof_dmrs_per_rb: usize,
    generator: &mut PseudoRandomGenerator,
    amplitude: f32,
) -> Vec<Complex32> {
    let mut sequence = Vec::new();
    let mut current_rb = 0;

    for (rb, &is_allocated) in rb_mask.iter().enumerate() {
        if is_allocated {
            // Skip symbols between current position and this RB
            if rb > current_rb {
                generator.skip((rb - current_rb) * nof_dmrs_per_rb);
            }

            for _ in 0..nof_dmrs_per_rb {
                sequence.push(generator.next_qpsk_symbol(amplitude));
            }

            current_rb = rb + 1;
        }
    }

    sequence
}

/// Apply CDM weights to DMRS sequence for PDSCH
pub fn apply_cdm_weights(base_sequence: &[Complex32], weights: &DmrsWeights, l_prime: usize) -> Vec<Complex32> {
    let w_t = weights.w_t[l_prime];

    base_sequence
        .iter()
        .enumerate()
        .map(|(idx, &symbol)| symbol * w_t * weights.w_f[idx % 2])
        .collect()
}

/// PDSCH DMRS configuration, mapping type A with l0 = 2 in a 14 symbol allocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdschDmrsConfig {
    pub dmrs_type: DmrsType,
    /// Single (1) or double (2) symbol DMRS
    pub length: u8,
    /// dmrs-AdditionalPosition (0 to 3)
    pub additional_positions: u8,
    pub port: u8,
    pub slot: u32,
    pub n_id: u16,
    pub n_scid: bool,
    /// Bandwidth part size in RB, starting at CRB 0
    pub bwp_size: u16,
    pub start_rb: u16,
    pub nof_rb: u16,
    /// Amplitude scaling relative to unit power
    pub beta: f32,
}

impl PdschDmrsConfig {
    /// First DMRS symbol for mapping type A
    pub const TYPE_A_POSITION: u8 = 2;

    /// Whether the combination is allowed by TS 38.211
    pub fn is_feasible(&self) -> bool {
        let positions_ok = match self.length {
            1 => self.additional_positions <= 3,
            2 => self.additional_positions <= 1,
            _ => false,
        };
        positions_ok
            && self.port < self.dmrs_type.max_ports()
            && (self.length == 2 || self.port < self.dmrs_type.max_ports() / 2)
            && self.nof_rb > 0
            && self.start_rb + self.nof_rb <= self.bwp_size
    }

    /// First symbol of every DMRS occasion, Table 7.4.1.1.2-3 for l_d = 14
    pub fn occasion_symbols(&self) -> Vec<u8> {
        let l0 = Self::TYPE_A_POSITION;
        match (self.length, self.additional_positions) {
            (1, 0) | (2, 0) => vec![l0],
            (1, 1) => vec![l0, 11],
            (1, 2) => vec![l0, 7, 11],
            (1, 3) => vec![l0, 5, 8, 11],
            (2, 1) => vec![l0, 10],
            _ => Vec::new(),
        }
    }

    /// Place the DMRS in a resource grid and return the written entries
    pub fn generate(&self) -> Result<Vec<ResourceGridEntry>, LayerError> {
        if !self.is_feasible() {
            return Err(LayerError::InvalidConfiguration(format!("Unsupported PDSCH DMRS configuration {:?}", self)));
        }

        let (subcarriers, weights) = get_pdsch_dmrs_params(self.dmrs_type, self.port)?;
        let mut grid = ResourceGrid::new(self.bwp_size, NSYMB_PER_SLOT_NORM, 1)?;
        let rb_mask: Vec<bool> = (0..self.bwp_size)
            .map(|rb| rb >= self.start_rb && rb < self.start_rb + self.nof_rb)
            .collect();
        let amplitude = self.beta / std::f32::consts::SQRT_2;

        for l_first in self.occasion_symbols() {
            for l_prime in 0..self.length {
                let symbol = l_first + l_prime;
                let cinit = calculate_pdsch_dmrs_cinit(self.slot, symbol, self.n_id, self.n_scid);
                let mut generator = PseudoRandomGenerator::new(cinit);
                let base = generate_dmrs_sequence(&rb_mask, self.dmrs_type.nof_dmrs_per_rb(), &mut generator, amplitude);
                let weighted = apply_cdm_weights(&base, &weights, l_prime as usize);

                let positions = (self.start_rb..self.start_rb + self.nof_rb)
                    .flat_map(|rb| subcarriers.iter().map(move |&k| rb * NRE + k));
                for (subcarrier, value) in positions.zip(weighted) {
                    grid.put(0, symbol, subcarrier, value)?;
                }
            }
        }

        let entries = grid.entries();
        debug!("PDSCH DMRS placed {} resource elements", entries.len());
        Ok(entries)
    }
}

/// PBCH DMRS configuration. The SS/PBCH block starts at symbol 0, subcarrier 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PbchDmrsConfig {
    pub n_id: u16,
    pub ssb_index: u8,
    pub l_max: u8,
    pub n_hf: u8,
    pub beta: f32,
}

impl PbchDmrsConfig {
    /// Number of DMRS symbols in an SS/PBCH block
    pub const NOF_DMRS: usize = 144;

    /// Subcarriers of the SS/PBCH block
    const SSB_SUBCARRIERS: u16 = 240;

    /// Whether the SSB index exists for the maximum number of SSB
    pub fn is_feasible(&self) -> bool {
        matches!(self.l_max, 4 | 8 | 64) && self.ssb_index < self.l_max && self.n_hf <= 1
    }

    /// Place the DMRS in a resource grid and return the written entries
    pub fn generate(&self) -> Result<Vec<ResourceGridEntry>, LayerError> {
        if !self.is_feasible() {
            return Err(LayerError::InvalidConfiguration(format!(
                "SSB index {} not available with L_max {}",
                self.ssb_index, self.l_max
            )));
        }

        let cinit = calculate_pbch_dmrs_cinit(self.n_id, self.ssb_index, self.n_hf, self.l_max);
        let mut generator = PseudoRandomGenerator::new(cinit);
        let amplitude = self.beta / std::f32::consts::SQRT_2;
        let v = self.n_id % 4;

        let mut grid = ResourceGrid::new(Self::SSB_SUBCARRIERS / NRE, 4, 1)?;
        for symbol in 1..=3u8 {
            for k in (v..Self::SSB_SUBCARRIERS).step_by(4) {
                if symbol == 2 && (48..192).contains(&k) {
                    continue;
                }
                grid.put(0, symbol, k, generator.next_qpsk_symbol(amplitude))?;
            }
        }

        let entries = grid.entries();
        if entries.len() != Self::NOF_DMRS {
            return Err(LayerError::ProcessingError(format!("Placed {} PBCH DMRS", entries.len())));
        }
        Ok(entries)
    }
}
