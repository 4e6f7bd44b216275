/// PDCCH search space candidates
/// Based on 3GPP TS 38.213 Section 10.1

use crate::LayerError;
use serde::Serialize;
use tracing::debug;

/// Hashing modulus D
const HASH_MODULUS: u64 = 65537;

/// Hashing multipliers A_p indexed by CORESET ID mod 3
const HASH_MULTIPLIERS: [u64; 3] = [39827, 39829, 39839];

/// Aggregation levels supported by PDCCH
pub const AGGREGATION_LEVELS: [u32; 5] = [1, 2, 4, 8, 16];

/// Search space monitored in one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchSpaceConfig {
    /// CORESET identifier (p)
    pub coreset_id: u32,
    /// Number of CCE in the CORESET (N_CCE,p)
    pub nof_cce: u32,
    /// Aggregation level (L)
    pub aggregation_level: u32,
    /// Number of candidates at this aggregation level (M)
    pub nof_candidates: u32,
    /// Slot index within the frame
    pub slot: u32,
    /// C-RNTI of a UE-specific search space, zero for a common search space
    pub rnti: u32,
}

/// PDCCH candidate computation
pub struct PdcchCandidates;

impl PdcchCandidates {
    /// Whether M distinct candidates of aggregation level L fit in the CORESET
    pub fn is_feasible(config: &SearchSpaceConfig) -> bool {
        AGGREGATION_LEVELS.contains(&config.aggregation_level)
            && config.nof_candidates > 0
            && config.nof_candidates * config.aggregation_level <= config.nof_cce
    }

    /// Hashing variable Y_{p,n} of the slot
    fn hash(config: &SearchSpaceConfig) -> u64 {
        if config.rnti == 0 {
            return 0;
        }
        let a = HASH_MULTIPLIERS[(config.coreset_id % 3) as usize];
        let mut y = config.rnti as u64;
        for _ in 0..=config.slot {
            y = (a * y) % HASH_MODULUS;
        }
        y
    }

    /// Lowest CCE index of every candidate
    pub fn compute(config: &SearchSpaceConfig) -> Result<Vec<u32>, LayerError> {
        if !Self::is_feasible(config) {
            return Err(LayerError::InvalidConfiguration(format!(
                "{} candidates of aggregation level {} do not fit in {} CCE",
                config.nof_candidates, config.aggregation_level, config.nof_cce
            )));
        }

        let l = config.aggregation_level as u64;
        let m_total = config.nof_candidates as u64;
        let n_cce = config.nof_cce as u64;
        let y = Self::hash(config);

        let candidates: Vec<u32> = (0..m_total)
            .map(|m| (l * ((y + (m * n_cce) / (l * m_total)) % (n_cce / l))) as u32)
            .collect();

        debug!("PDCCH candidates for L={} in {} CCE: {:?}", l, n_cce, candidates);
        Ok(candidates)
    }
}
