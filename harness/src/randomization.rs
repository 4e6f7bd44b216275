//! Test case identity and reproducible randomization
//!
//! Every random draw of a block run is a pure function of the ambient seed,
//! the block name and the TestID. Each declared random axis owns a separate
//! ChaCha stream and a permutation built from it, so axes are decorrelated
//! and a block's vectors do not depend on which other blocks ran before.

use crate::HarnessError;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

/// A randomized incidental parameter, drawn from `0..size`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomAxis {
    pub name: &'static str,
    pub size: u32,
}

impl RandomAxis {
    pub const fn new(name: &'static str, size: u32) -> Self {
        Self { name, size }
    }
}

/// Stable 64-bit FNV-1a hash used to derive stream identifiers
fn stream_id(parts: &[&[u8]]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for part in parts {
        for &byte in part.iter() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
        // Separator so that ("ab", "c") and ("a", "bc") differ
        hash ^= 0xff;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Per-block randomization state, read-only once built
#[derive(Debug, Clone)]
pub struct RandomizationState {
    seed: u64,
    block: String,
    permutations: Vec<(&'static str, Vec<u32>)>,
}

impl RandomizationState {
    /// Build one permutation per random axis
    pub fn new(seed: u64, block: &str, axes: &[RandomAxis]) -> Result<Self, HarnessError> {
        let mut permutations = Vec::with_capacity(axes.len());
        for axis in axes {
            if axis.size == 0 {
                return Err(HarnessError::MalformedAxis {
                    axis: axis.name.to_string(),
                    reason: "empty random axis".to_string(),
                });
            }
            if permutations.iter().any(|(name, _)| *name == axis.name) {
                return Err(HarnessError::MalformedAxis {
                    axis: axis.name.to_string(),
                    reason: "random axis declared twice".to_string(),
                });
            }

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rng.set_stream(stream_id(&[block.as_bytes(), axis.name.as_bytes()]));
            let mut values: Vec<u32> = (0..axis.size).collect();
            values.shuffle(&mut rng);
            permutations.push((axis.name, values));
        }

        debug!("Randomization for {} with seed {}: {} axes", block, seed, permutations.len());
        Ok(Self { seed, block: block.to_string(), permutations })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Value of a random axis for a TestID
    pub fn draw(&self, axis: &str, test_id: u32) -> Result<u32, HarnessError> {
        let (_, values) = self
            .permutations
            .iter()
            .find(|(name, _)| *name == axis)
            .ok_or_else(|| HarnessError::MalformedAxis {
                axis: axis.to_string(),
                reason: format!("not a random axis of {}", self.block),
            })?;

        let size = values.len() as u32;
        if test_id == size {
            warn!("{}: random axis {} wraps around after {} test cases", self.block, axis, size);
        }
        Ok(values[(test_id % size) as usize])
    }

    /// Generator for the bulk random data of one test case
    pub fn case_rng(&self, test_id: u32) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(stream_id(&[self.block.as_bytes(), b"case", &test_id.to_le_bytes()]));
        rng
    }
}

/// Sequential TestID allocation for one block run.
///
/// `peek` hands out the identifier the next case will get and can be called
/// any number of times; only `commit` consumes it. Skipped cases never commit.
#[derive(Debug, Clone, Default)]
pub struct TestIdAllocator {
    next: u32,
}

impl TestIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peek(&self) -> u32 {
        self.next
    }

    pub fn commit(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Number of identifiers handed out
    pub fn nof_committed(&self) -> u32 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    const AXES: [RandomAxis; 2] = [RandomAxis::new("cell_id", 1008), RandomAxis::new("slot", 20)];

    #[test]
    fn test_draws_are_reproducible() {
        let a = RandomizationState::new(7, "pbch_dmrs", &AXES).unwrap();
        let b = RandomizationState::new(7, "pbch_dmrs", &AXES).unwrap();
        for id in 0..50 {
            assert_eq!(a.draw("cell_id", id).unwrap(), b.draw("cell_id", id).unwrap());
        }
        let mut ra = a.case_rng(3);
        let mut rb = b.case_rng(3);
        assert_eq!(ra.gen::<u64>(), rb.gen::<u64>());
    }

    #[test]
    fn test_permutation_does_not_repeat() {
        let state = RandomizationState::new(0, "block", &AXES).unwrap();
        let mut seen: Vec<u32> = (0..1008).map(|id| state.draw("cell_id", id).unwrap()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..1008).collect::<Vec<u32>>());
        assert_eq!(state.draw("slot", 3).unwrap(), state.draw("slot", 23).unwrap());
    }

    #[test]
    fn test_streams_are_decorrelated() {
        let state = RandomizationState::new(0, "block", &[RandomAxis::new("a", 1000), RandomAxis::new("b", 1000)]).unwrap();
        let a: Vec<u32> = (0..20).map(|id| state.draw("a", id).unwrap()).collect();
        let b: Vec<u32> = (0..20).map(|id| state.draw("b", id).unwrap()).collect();
        assert_ne!(a, b);

        let other_block = RandomizationState::new(0, "other", &[RandomAxis::new("a", 1000)]).unwrap();
        let c: Vec<u32> = (0..20).map(|id| other_block.draw("a", id).unwrap()).collect();
        assert_ne!(a, c);

        let mut r0 = state.case_rng(0);
        let mut r1 = state.case_rng(1);
        assert_ne!(r0.gen::<u64>(), r1.gen::<u64>());
    }

    #[test]
    fn test_bad_random_axes() {
        assert!(RandomizationState::new(0, "b", &[RandomAxis::new("x", 0)]).is_err());
        assert!(RandomizationState::new(0, "b", &[RandomAxis::new("x", 2), RandomAxis::new("x", 3)]).is_err());
        let state = RandomizationState::new(0, "b", &AXES).unwrap();
        assert!(state.draw("rnti", 0).is_err());
    }

    #[test]
    fn test_allocator_only_advances_on_commit() {
        let mut ids = TestIdAllocator::new();
        assert_eq!(ids.peek(), 0);
        assert_eq!(ids.peek(), 0);
        assert_eq!(ids.commit(), 0);
        assert_eq!(ids.peek(), 1);
        assert_eq!(ids.commit(), 1);
        assert_eq!(ids.nof_committed(), 2);
    }
}
