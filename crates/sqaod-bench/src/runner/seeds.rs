use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Deterministic solver seeds for the trials of one problem instance.
pub struct TrialSeeds {
    seeds: Vec<u64>,
}

impl TrialSeeds {
    pub fn new(instance_seed: u64, count: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(instance_seed);
        let seeds = (0..count).map(|_| rng.next_u64()).collect();
        Self { seeds }
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.seeds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_instance_seed_gives_same_trials() {
        let a = TrialSeeds::new(42, 5);
        let b = TrialSeeds::new(42, 5);
        assert_eq!(a.as_slice(), b.as_slice());
        assert_eq!(a.as_slice().len(), 5);
    }

    #[test]
    fn longer_runs_extend_shorter_ones() {
        let short = TrialSeeds::new(7, 2);
        let long = TrialSeeds::new(7, 4);
        assert_eq!(&long.as_slice()[..2], short.as_slice());
        assert_ne!(TrialSeeds::new(8, 2).as_slice(), short.as_slice());
    }
}
