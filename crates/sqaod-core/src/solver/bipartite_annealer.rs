//! Simulated quantum annealing over a bipartite graph.
//!
//! Each of the `m` trotter slices holds a spin configuration for both layers.
//! A step sweeps layer 1 with layer 0 held fixed, then layer 0 with layer 1
//! held fixed, using single-spin Metropolis updates.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{Level, event};

use super::{AnnealSchedule, SolveOutcome, Solver, default_trotters, trotter_coupling};
use crate::direction::OptimizeMethod;
use crate::error::SolverError;
use crate::formulas::BipartiteIsing;
use crate::formulas::bipartite;
use crate::model::{Assignment, Bits, BitsPair, Matrix};
use crate::selector::{GraphType, SolverType};

#[derive(Debug, Default, Clone, Copy)]
struct AnnealFlags {
    trotters_given: bool,
    q_set: bool,
    prepared: bool,
}

pub struct BipartiteGraphAnnealer {
    rng: Option<StdRng>,
    method: OptimizeMethod,
    /// Spin model with the direction sign already applied.
    model: Option<BipartiteIsing>,
    m: usize,
    flags: AnnealFlags,
    /// `m × N0` spins.
    q0: Matrix,
    /// `m × N1` spins.
    q1: Matrix,
    energies: Vec<f64>,
    solutions: Vec<BitsPair>,
    spins: Vec<(Vec<i8>, Vec<i8>)>,
}

impl Default for BipartiteGraphAnnealer {
    fn default() -> Self {
        Self::new()
    }
}

impl BipartiteGraphAnnealer {
    pub fn new() -> Self {
        Self {
            rng: None,
            method: OptimizeMethod::Minimize,
            model: None,
            m: 0,
            flags: AnnealFlags::default(),
            q0: Matrix::zeros(0, 0),
            q1: Matrix::zeros(0, 0),
            energies: Vec::new(),
            solutions: Vec::new(),
            spins: Vec::new(),
        }
    }

    pub fn seed(&mut self, seed: u64) {
        self.rng = Some(StdRng::seed_from_u64(seed));
    }

    /// `(N0, N1, m)`; `m` is zero until trotters are chosen.
    pub fn problem_size(&self) -> Option<(usize, usize, usize)> {
        let (n0, n1) = self.model.as_ref()?.size();
        Some((n0, n1, self.m))
    }

    pub fn set_problem(
        &mut self,
        b0: &[f64],
        b1: &[f64],
        w: &Matrix,
        method: OptimizeMethod,
    ) -> Result<(), SolverError> {
        let model = bipartite::hjc(b0, b1, w)?.signed(method);
        let (n0, n1) = model.size();
        self.method = method;
        self.model = Some(model);
        self.flags.q_set = false;
        self.flags.prepared = false;
        if self.flags.trotters_given {
            self.allocate(n0, n1);
        }
        Ok(())
    }

    pub fn set_num_trotters(&mut self, trotters: usize) -> Result<(), SolverError> {
        if trotters == 0 {
            return Err(SolverError::InvalidTrotterCount(trotters));
        }
        let (n0, n1) = self.size()?;
        self.m = trotters;
        self.flags.trotters_given = true;
        self.flags.q_set = false;
        self.flags.prepared = false;
        self.allocate(n0, n1);
        Ok(())
    }

    /// Sets every trotter slice to the given assignment.
    pub fn set_x(&mut self, x0: &Bits, x1: &Bits) -> Result<(), SolverError> {
        let (n0, n1) = self.size()?;
        if x0.len() != n0 {
            return Err(SolverError::shape("annealer x0", (1, n0), (1, x0.len())));
        }
        if x1.len() != n1 {
            return Err(SolverError::shape("annealer x1", (1, n1), (1, x1.len())));
        }
        self.ensure_trotters()?;
        let (s0, s1) = (x0.to_spins(), x1.to_spins());
        for im in 0..self.m {
            for (iq, &q) in s0.iter().enumerate() {
                self.q0.set(im, iq, q);
            }
            for (iq, &q) in s1.iter().enumerate() {
                self.q1.set(im, iq, q);
            }
        }
        self.flags.q_set = true;
        Ok(())
    }

    pub fn randomize_q(&mut self) -> Result<(), SolverError> {
        self.size()?;
        self.ensure_trotters()?;
        let rng = self.rng.get_or_insert_with(StdRng::from_entropy);
        for q in [&mut self.q0, &mut self.q1] {
            for im in 0..q.rows() {
                for iq in 0..q.cols() {
                    q.set(im, iq, if rng.gen_bool(0.5) { 1.0 } else { -1.0 });
                }
            }
        }
        self.flags.q_set = true;
        Ok(())
    }

    /// Fills in whatever the caller did not configure: an entropy seed, the
    /// default trotter count and random spins.
    pub fn init_anneal(&mut self) -> Result<(), SolverError> {
        self.size()?;
        self.rng.get_or_insert_with(StdRng::from_entropy);
        self.ensure_trotters()?;
        if !self.flags.q_set {
            self.randomize_q()?;
        }
        self.flags.prepared = true;
        Ok(())
    }

    pub fn anneal_one_step(&mut self, g: f64, kt: f64) -> Result<(), SolverError> {
        if !self.flags.prepared {
            return Err(SolverError::NotInitialized("anneal_one_step"));
        }
        let model = self.model.as_ref().ok_or(SolverError::ProblemNotSet)?;
        let rng = self
            .rng
            .as_mut()
            .ok_or(SolverError::NotInitialized("anneal_one_step"))?;
        anneal_half_step(rng, &mut self.q1, &model.h1, &model.j, &self.q0, g, kt);
        let jt = model.j.transpose();
        anneal_half_step(rng, &mut self.q0, &model.h0, &jt, &self.q1, g, kt);
        Ok(())
    }

    /// Reads bits back out of the spins and evaluates every trotter slice.
    pub fn fin_anneal(&mut self) -> Result<(), SolverError> {
        if !self.flags.prepared {
            return Err(SolverError::NotInitialized("fin_anneal"));
        }
        let model = self.model.as_ref().ok_or(SolverError::ProblemNotSet)?;
        self.energies.clear();
        self.solutions.clear();
        self.spins.clear();
        for im in 0..self.m {
            let (q0, q1) = (self.q0.row(im), self.q1.row(im));
            self.energies.push(self.method.sign(model.energy(q0, q1)));
            self.solutions
                .push(BitsPair::new(Bits::from_spins(q0), Bits::from_spins(q1)));
            self.spins.push((to_spin_values(q0), to_spin_values(q1)));
        }
        log_anneal_result(self.method, model.size(), self.m, &self.energies);
        Ok(())
    }

    /// Energies of the last [`Self::fin_anneal`], one per trotter, in the caller's sign.
    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    pub fn solutions(&self) -> &[BitsPair] {
        &self.solutions
    }

    pub fn spins(&self) -> &[(Vec<i8>, Vec<i8>)] {
        &self.spins
    }

    /// Spin-form coefficients of the problem as given, without the direction sign.
    pub fn hjc(&self) -> Option<BipartiteIsing> {
        self.model.clone().map(|model| model.signed(self.method))
    }

    fn size(&self) -> Result<(usize, usize), SolverError> {
        self.model
            .as_ref()
            .map(BipartiteIsing::size)
            .ok_or(SolverError::ProblemNotSet)
    }

    fn ensure_trotters(&mut self) -> Result<(), SolverError> {
        if !self.flags.trotters_given {
            let (n0, n1) = self.size()?;
            self.set_num_trotters(default_trotters(n0 + n1))?;
        }
        Ok(())
    }

    fn allocate(&mut self, n0: usize, n1: usize) {
        self.q0 = Matrix::zeros(self.m, n0);
        self.q1 = Matrix::zeros(self.m, n1);
    }
}

impl Solver for BipartiteGraphAnnealer {
    fn graph_type(&self) -> GraphType {
        GraphType::Rbm
    }

    fn solver_type(&self) -> SolverType {
        SolverType::Anneal
    }

    fn optimize_method(&self) -> OptimizeMethod {
        self.method
    }

    fn seed(&mut self, seed: u64) {
        BipartiteGraphAnnealer::seed(self, seed);
    }

    fn solve(&mut self, schedule: &AnnealSchedule) -> Result<SolveOutcome, SolverError> {
        schedule.validate()?;
        if let Some(trotters) = schedule.trotters {
            self.set_num_trotters(trotters)?;
        }
        self.randomize_q()?;
        self.init_anneal()?;
        let mut steps = 0usize;
        for g in schedule.fields() {
            self.anneal_one_step(g, schedule.kt)?;
            steps += 1;
        }
        self.fin_anneal()?;
        let solutions = self
            .solutions
            .iter()
            .cloned()
            .map(Assignment::Bipartite)
            .collect();
        SolveOutcome::collect(self.method, self.energies.clone(), solutions, steps)
    }
}

/// One Metropolis sweep over `q_anneal` (`m × N`) with the other layer fixed.
///
/// `j` is shaped `N × N_fixed` so that `j · q_fixed[im]` is the local field
/// contributed by the fixed layer.
fn anneal_half_step<R: Rng + ?Sized>(
    rng: &mut R,
    q_anneal: &mut Matrix,
    h: &[f64],
    j: &Matrix,
    q_fixed: &Matrix,
    g: f64,
    kt: f64,
) {
    let (m, n) = q_anneal.dim();
    if m == 0 || n == 0 {
        return;
    }
    let local: Vec<Vec<f64>> = (0..m).map(|im| j.mul_vec(q_fixed.row(im))).collect();
    let two_div_m = 2.0 / m as f64;
    let coupling = trotter_coupling(g, kt, m);
    let inv_kt = 1.0 / kt;

    for _ in 0..n * m {
        let iq = rng.gen_range(0..n);
        let im = rng.gen_range(0..m);
        let q = q_anneal.get(im, iq);
        let mut de = -two_div_m * q * (h[iq] + local[im][iq]);
        if m > 1 {
            let prev = (im + m - 1) % m;
            let next = (im + 1) % m;
            de -= q * (q_anneal.get(prev, iq) + q_anneal.get(next, iq)) * coupling;
        }
        let threshold = if de < 0.0 { 1.0 } else { (-de * inv_kt).exp() };
        if threshold > rng.gen_range(0.0..1.0) {
            q_anneal.set(im, iq, -q);
        }
    }
}

pub(super) fn to_spin_values(q: &[f64]) -> Vec<i8> {
    q.iter().map(|&v| if v > 0.0 { 1 } else { -1 }).collect()
}

fn log_anneal_result(
    method: OptimizeMethod,
    (n0, n1): (usize, usize),
    trotters: usize,
    energies: &[f64],
) {
    if !tracing::enabled!(target: "sqaod::anneal", Level::INFO) {
        return;
    }

    let best = method.best(energies).ok();
    event!(
        target: "sqaod::anneal",
        Level::INFO,
        graph = "rbm",
        method = %method,
        n0,
        n1,
        trotters,
        best_energy = best,
    );
}
