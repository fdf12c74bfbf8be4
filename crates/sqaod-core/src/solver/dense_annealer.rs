//! Simulated quantum annealing over a dense graph.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{Level, event};

use super::bipartite_annealer::to_spin_values;
use super::{AnnealSchedule, SolveOutcome, Solver, default_trotters, trotter_coupling};
use crate::direction::OptimizeMethod;
use crate::error::SolverError;
use crate::formulas::{DenseIsing, dense};
use crate::model::{Assignment, Bits, Matrix, dot};
use crate::selector::{GraphType, SolverType};

pub struct DenseGraphAnnealer {
    rng: Option<StdRng>,
    method: OptimizeMethod,
    model: Option<DenseIsing>,
    m: usize,
    trotters_given: bool,
    q_set: bool,
    prepared: bool,
    /// `m × N` spins.
    q: Matrix,
    energies: Vec<f64>,
    solutions: Vec<Bits>,
    spins: Vec<Vec<i8>>,
}

impl Default for DenseGraphAnnealer {
    fn default() -> Self {
        Self::new()
    }
}

impl DenseGraphAnnealer {
    pub fn new() -> Self {
        Self {
            rng: None,
            method: OptimizeMethod::Minimize,
            model: None,
            m: 0,
            trotters_given: false,
            q_set: false,
            prepared: false,
            q: Matrix::zeros(0, 0),
            energies: Vec::new(),
            solutions: Vec::new(),
            spins: Vec::new(),
        }
    }

    pub fn seed(&mut self, seed: u64) {
        self.rng = Some(StdRng::seed_from_u64(seed));
    }

    /// `(N, m)`; `m` is zero until trotters are chosen.
    pub fn problem_size(&self) -> Option<(usize, usize)> {
        Some((self.model.as_ref()?.size(), self.m))
    }

    pub fn set_problem(&mut self, w: &Matrix, method: OptimizeMethod) -> Result<(), SolverError> {
        let model = dense::hjc(w)?.signed(method);
        let n = model.size();
        self.method = method;
        self.model = Some(model);
        self.q_set = false;
        self.prepared = false;
        if self.trotters_given {
            self.q = Matrix::zeros(self.m, n);
        }
        Ok(())
    }

    pub fn set_num_trotters(&mut self, trotters: usize) -> Result<(), SolverError> {
        if trotters == 0 {
            return Err(SolverError::InvalidTrotterCount(trotters));
        }
        let n = self.size()?;
        self.m = trotters;
        self.trotters_given = true;
        self.q_set = false;
        self.prepared = false;
        self.q = Matrix::zeros(self.m, n);
        Ok(())
    }

    pub fn set_x(&mut self, x: &Bits) -> Result<(), SolverError> {
        let n = self.size()?;
        if x.len() != n {
            return Err(SolverError::shape("annealer x", (1, n), (1, x.len())));
        }
        self.ensure_trotters()?;
        let spins = x.to_spins();
        for im in 0..self.m {
            for (iq, &q) in spins.iter().enumerate() {
                self.q.set(im, iq, q);
            }
        }
        self.q_set = true;
        Ok(())
    }

    pub fn randomize_q(&mut self) -> Result<(), SolverError> {
        self.size()?;
        self.ensure_trotters()?;
        let rng = self.rng.get_or_insert_with(StdRng::from_entropy);
        for im in 0..self.q.rows() {
            for iq in 0..self.q.cols() {
                self.q.set(im, iq, if rng.gen_bool(0.5) { 1.0 } else { -1.0 });
            }
        }
        self.q_set = true;
        Ok(())
    }

    pub fn init_anneal(&mut self) -> Result<(), SolverError> {
        self.size()?;
        self.rng.get_or_insert_with(StdRng::from_entropy);
        self.ensure_trotters()?;
        if !self.q_set {
            self.randomize_q()?;
        }
        self.prepared = true;
        Ok(())
    }

    /// `N·m` single-spin Metropolis trials at transverse field `g`.
    pub fn anneal_one_step(&mut self, g: f64, kt: f64) -> Result<(), SolverError> {
        if !self.prepared {
            return Err(SolverError::NotInitialized("anneal_one_step"));
        }
        let model = self.model.as_ref().ok_or(SolverError::ProblemNotSet)?;
        let rng = self
            .rng
            .as_mut()
            .ok_or(SolverError::NotInitialized("anneal_one_step"))?;
        let (m, n) = self.q.dim();
        if m == 0 || n == 0 {
            return Ok(());
        }
        let two_div_m = 2.0 / m as f64;
        let coupling = trotter_coupling(g, kt, m);
        let inv_kt = 1.0 / kt;

        for _ in 0..n * m {
            let iq = rng.gen_range(0..n);
            let im = rng.gen_range(0..m);
            let q = self.q.get(im, iq);
            // J is symmetric, so each coupling appears twice in qᵀJq.
            let field = model.h[iq] + 2.0 * dot(model.j.row(iq), self.q.row(im));
            let mut de = -two_div_m * q * field;
            if m > 1 {
                let prev = (im + m - 1) % m;
                let next = (im + 1) % m;
                de -= q * (self.q.get(prev, iq) + self.q.get(next, iq)) * coupling;
            }
            let threshold = if de < 0.0 { 1.0 } else { (-de * inv_kt).exp() };
            if threshold > rng.gen_range(0.0..1.0) {
                self.q.set(im, iq, -q);
            }
        }
        Ok(())
    }

    pub fn fin_anneal(&mut self) -> Result<(), SolverError> {
        if !self.prepared {
            return Err(SolverError::NotInitialized("fin_anneal"));
        }
        let model = self.model.as_ref().ok_or(SolverError::ProblemNotSet)?;
        self.energies.clear();
        self.solutions.clear();
        self.spins.clear();
        for im in 0..self.m {
            let q = self.q.row(im);
            self.energies.push(self.method.sign(model.energy(q)));
            self.solutions.push(Bits::from_spins(q));
            self.spins.push(to_spin_values(q));
        }
        log_anneal_result(self.method, model.size(), self.m, &self.energies);
        Ok(())
    }

    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    pub fn solutions(&self) -> &[Bits] {
        &self.solutions
    }

    pub fn spins(&self) -> &[Vec<i8>] {
        &self.spins
    }

    pub fn hjc(&self) -> Option<DenseIsing> {
        self.model.clone().map(|model| model.signed(self.method))
    }

    fn size(&self) -> Result<usize, SolverError> {
        self.model
            .as_ref()
            .map(DenseIsing::size)
            .ok_or(SolverError::ProblemNotSet)
    }

    fn ensure_trotters(&mut self) -> Result<(), SolverError> {
        if !self.trotters_given {
            let n = self.size()?;
            self.set_num_trotters(default_trotters(n))?;
        }
        Ok(())
    }
}

impl Solver for DenseGraphAnnealer {
    fn graph_type(&self) -> GraphType {
        GraphType::Dense
    }

    fn solver_type(&self) -> SolverType {
        SolverType::Anneal
    }

    fn optimize_method(&self) -> OptimizeMethod {
        self.method
    }

    fn seed(&mut self, seed: u64) {
        DenseGraphAnnealer::seed(self, seed);
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
            .map(Assignment::Dense)
            .collect();
        SolveOutcome::collect(self.method, self.energies.clone(), solutions, steps)
    }
}

fn log_anneal_result(method: OptimizeMethod, n: usize, trotters: usize, energies: &[f64]) {
    if !tracing::enabled!(target: "sqaod::anneal", Level::INFO) {
        return;
    }

    let best = method.best(energies).ok();
    event!(
        target: "sqaod::anneal",
        Level::INFO,
        graph = "dense",
        method = %method,
        n,
        trotters,
        best_energy = best,
    );
}
