use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// Structural representation of a problem graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum GraphType {
    Dense = 0,
    Sparse = 1,
    /// Bipartite graph with two layers, as in a restricted Boltzmann machine.
    Rbm = 2,
}

/// Search algorithm run over a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SolverType {
    BruteForce = 0,
    Anneal = 1,
}

pub const DENSE: GraphType = GraphType::Dense;
pub const SPARSE: GraphType = GraphType::Sparse;
pub const RBM: GraphType = GraphType::Rbm;

pub const BRUTEFORCE: SolverType = SolverType::BruteForce;
pub const ANNEAL: SolverType = SolverType::Anneal;

impl GraphType {
    pub const ALL: [GraphType; 3] = [GraphType::Dense, GraphType::Sparse, GraphType::Rbm];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(GraphType::Dense),
            1 => Some(GraphType::Sparse),
            2 => Some(GraphType::Rbm),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            GraphType::Dense => "dense",
            GraphType::Sparse => "sparse",
            GraphType::Rbm => "rbm",
        }
    }
}

impl SolverType {
    pub const ALL: [SolverType; 2] = [SolverType::BruteForce, SolverType::Anneal];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(SolverType::BruteForce),
            1 => Some(SolverType::Anneal),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SolverType::BruteForce => "brute_force",
            SolverType::Anneal => "anneal",
        }
    }
}

impl fmt::Display for GraphType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SolverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dense" => Ok(GraphType::Dense),
            "sparse" => Ok(GraphType::Sparse),
            "rbm" | "bipartite" => Ok(GraphType::Rbm),
            other => Err(format!("unknown graph type '{other}'")),
        }
    }
}

impl FromStr for SolverType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "brute_force" | "bruteforce" | "bf" => Ok(SolverType::BruteForce),
            "anneal" | "annealer" => Ok(SolverType::Anneal),
            other => Err(format!("unknown solver type '{other}'")),
        }
    }
}
