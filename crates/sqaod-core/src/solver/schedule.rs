use serde::{Deserialize, Serialize};

use crate::error::SolverError;

const DEFAULT_G_START: f64 = 5.0;
const DEFAULT_G_END: f64 = 0.01;
const DEFAULT_TAU: f64 = 0.99;
const DEFAULT_KT: f64 = 0.02;

/// Transverse field schedule: `G` decays geometrically from `g_start` by `tau`
/// per step while it stays above `g_end`, at a fixed temperature `kt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnnealSchedule {
    pub g_start: f64,
    pub g_end: f64,
    pub tau: f64,
    pub kt: f64,
    /// Trotter count; solvers pick `max(1, n / 4)` when unset.
    pub trotters: Option<usize>,
}

impl Default for AnnealSchedule {
    fn default() -> Self {
        Self {
            g_start: DEFAULT_G_START,
            g_end: DEFAULT_G_END,
            tau: DEFAULT_TAU,
            kt: DEFAULT_KT,
            trotters: None,
        }
    }
}

impl AnnealSchedule {
    pub fn validate(&self) -> Result<(), SolverError> {
        if !(self.g_end > 0.0) {
            return Err(SolverError::InvalidSchedule(
                "g_end must be greater than zero".to_string(),
            ));
        }
        if !(self.g_start > self.g_end) {
            return Err(SolverError::InvalidSchedule(
                "g_start must exceed g_end".to_string(),
            ));
        }
        if !(self.tau > 0.0 && self.tau < 1.0) {
            return Err(SolverError::InvalidSchedule(
                "tau must lie strictly between 0 and 1".to_string(),
            ));
        }
        if !(self.kt > 0.0) {
            return Err(SolverError::InvalidSchedule(
                "kt must be greater than zero".to_string(),
            ));
        }
        if self.trotters == Some(0) {
            return Err(SolverError::InvalidTrotterCount(0));
        }
        Ok(())
    }

    /// Field strength for every anneal step.
    pub fn fields(&self) -> impl Iterator<Item = f64> + '_ {
        std::iter::successors(Some(self.g_start), move |g| Some(g * self.tau))
            .take_while(move |g| *g > self.g_end)
    }

    pub fn step_count(&self) -> usize {
        self.fields().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_is_valid_and_finite() {
        let schedule = AnnealSchedule::default();
        schedule.validate().expect("defaults validate");
        let steps = schedule.step_count();
        assert!(steps > 600 && steps < 700, "unexpected step count {steps}");
    }

    #[test]
    fn fields_decay_geometrically() {
        let schedule = AnnealSchedule {
            g_start: 1.0,
            g_end: 0.1,
            tau: 0.5,
            ..AnnealSchedule::default()
        };
        let fields: Vec<f64> = schedule.fields().collect();
        assert_eq!(fields, vec![1.0, 0.5, 0.25, 0.125]);
    }

    #[test]
    fn rejects_degenerate_parameters() {
        let base = AnnealSchedule::default();
        for broken in [
            AnnealSchedule { tau: 1.0, ..base.clone() },
            AnnealSchedule { kt: 0.0, ..base.clone() },
            AnnealSchedule { g_end: 0.0, ..base.clone() },
            AnnealSchedule { g_start: 0.001, ..base.clone() },
            AnnealSchedule { g_end: f64::NAN, ..base.clone() },
        ] {
            assert!(matches!(
                broken.validate(),
                Err(SolverError::InvalidSchedule(_))
            ));
        }
        let zero_trotters = AnnealSchedule {
            trotters: Some(0),
            ..base
        };
        assert_eq!(
            zero_trotters.validate(),
            Err(SolverError::InvalidTrotterCount(0))
        );
    }
}
