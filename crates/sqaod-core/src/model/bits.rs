use core::fmt;
use serde::{Deserialize, Serialize};

/// Largest layer that can be enumerated through a packed `u64`.
pub const MAX_PACKED_BITS: usize = 63;

/// A 0/1 assignment of binary variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Bits(Vec<u8>);

impl Bits {
    pub fn zeros(len: usize) -> Self {
        Self(vec![0; len])
    }

    /// Any non-zero entry is read as 1.
    pub fn from_values(values: &[u8]) -> Self {
        Self(values.iter().map(|&v| u8::from(v != 0)).collect())
    }

    /// Bit `i` of `packed` becomes variable `i`.
    pub fn from_packed(packed: u64, len: usize) -> Self {
        Self((0..len).map(|i| ((packed >> i) & 1) as u8).collect())
    }

    /// Positive spins map to 1, everything else to 0.
    pub fn from_spins(spins: &[f64]) -> Self {
        Self(spins.iter().map(|&q| u8::from(q > 0.0)).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// `None` when the assignment does not fit into [`MAX_PACKED_BITS`].
    pub fn to_packed(&self) -> Option<u64> {
        if self.0.len() > MAX_PACKED_BITS {
            return None;
        }
        Some(
            self.0
                .iter()
                .enumerate()
                .fold(0u64, |acc, (i, &bit)| acc | (u64::from(bit) << i)),
        )
    }

    /// `x` as real values for the energy formulas.
    pub fn to_reals(&self) -> Vec<f64> {
        self.0.iter().map(|&bit| f64::from(bit)).collect()
    }

    /// `q = 2x - 1`.
    pub fn to_spins(&self) -> Vec<f64> {
        self.0.iter().map(|&bit| 2.0 * f64::from(bit) - 1.0).collect()
    }
}

impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.0 {
            write!(f, "{bit}")?;
        }
        Ok(())
    }
}

/// Assignment of both layers of a bipartite graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitsPair {
    pub x0: Bits,
    pub x1: Bits,
}

impl BitsPair {
    pub fn new(x0: Bits, x1: Bits) -> Self {
        Self { x0, x1 }
    }
}

impl fmt::Display for BitsPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.x0, self.x1)
    }
}

/// Solution shape for either graph family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assignment {
    Dense(Bits),
    Bipartite(BitsPair),
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assignment::Dense(bits) => fmt::Display::fmt(bits, f),
            Assignment::Bipartite(pair) => fmt::Display::fmt(pair, f),
        }
    }
}
