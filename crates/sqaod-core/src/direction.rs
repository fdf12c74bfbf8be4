//! Objective direction shared by every solver.
//!
//! Solvers are written once against "smaller is better" and parameterised by
//! an [`OptimizeMethod`]: the policy flips signs on the way in and picks or
//! orders results on the way out.

use core::cmp::Ordering;
use core::fmt;
use core::ops::Neg;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum OptimizeMethod {
    Minimize = 0,
    Maximize = 1,
}

pub const MINIMIZE: OptimizeMethod = OptimizeMethod::Minimize;
pub const MAXIMIZE: OptimizeMethod = OptimizeMethod::Maximize;

/// Returned by [`OptimizeMethod::best`] when there is nothing to choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot select the best value of an empty sequence")]
pub struct EmptyInputError;

impl OptimizeMethod {
    pub const ALL: [OptimizeMethod; 2] = [OptimizeMethod::Minimize, OptimizeMethod::Maximize];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(OptimizeMethod::Minimize),
            1 => Some(OptimizeMethod::Maximize),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            OptimizeMethod::Minimize => "minimize",
            OptimizeMethod::Maximize => "maximize",
        }
    }

    /// Identity for minimisation, negation for maximisation.
    pub fn sign<T: Neg<Output = T>>(self, value: T) -> T {
        match self {
            OptimizeMethod::Minimize => value,
            OptimizeMethod::Maximize => -value,
        }
    }

    /// Orders `a` before `b` when `a` is the better objective value.
    ///
    /// Incomparable values (NaN) are treated as equal.
    pub fn compare<T: PartialOrd>(self, a: &T, b: &T) -> Ordering {
        let natural = a.partial_cmp(b).unwrap_or(Ordering::Equal);
        match self {
            OptimizeMethod::Minimize => natural,
            OptimizeMethod::Maximize => natural.reverse(),
        }
    }

    pub fn is_better<T: PartialOrd>(self, a: &T, b: &T) -> bool {
        self.compare(a, b) == Ordering::Less
    }

    /// Index of the best value; the first one wins on ties.
    pub fn best_index<T: PartialOrd>(self, values: &[T]) -> Result<usize, EmptyInputError> {
        let mut iter = values.iter().enumerate();
        let (mut best_idx, mut best) = iter.next().ok_or(EmptyInputError)?;
        for (idx, value) in iter {
            if self.is_better(value, best) {
                best_idx = idx;
                best = value;
            }
        }
        Ok(best_idx)
    }

    /// Minimum for [`OptimizeMethod::Minimize`], maximum for [`OptimizeMethod::Maximize`].
    pub fn best<T: PartialOrd + Clone>(self, values: &[T]) -> Result<T, EmptyInputError> {
        let idx = self.best_index(values)?;
        Ok(values[idx].clone())
    }

    /// Stable sort, best value first. The input is left untouched.
    pub fn sort<T: PartialOrd + Clone>(self, values: &[T]) -> Vec<T> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| self.compare(a, b));
        sorted
    }
}

impl fmt::Display for OptimizeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptimizeMethod {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "minimize" | "min" => Ok(OptimizeMethod::Minimize),
            "maximize" | "max" => Ok(OptimizeMethod::Maximize),
            other => Err(format!("unknown optimize method '{other}'")),
        }
    }
}
