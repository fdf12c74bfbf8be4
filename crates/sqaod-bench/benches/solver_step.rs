use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand::rngs::StdRng;
use sqaod_core::formulas::random::{random_bipartite, random_symmetric_w};
use sqaod_core::solver::{
    BipartiteGraphAnnealer, BipartiteGraphBFSolver, DenseGraphAnnealer, DenseGraphBFSolver,
};
use sqaod_core::MINIMIZE;

fn anneal_step_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("anneal_one_step");
    for n in [16usize, 64] {
        let w = random_symmetric_w(n, &mut StdRng::seed_from_u64(n as u64));
        let mut annealer = DenseGraphAnnealer::new();
        annealer.set_problem(&w, MINIMIZE).expect("dense problem");
        annealer.seed(1);
        annealer.init_anneal().expect("prepared");
        group.bench_function(format!("dense_{n}"), |b| {
            b.iter(|| annealer.anneal_one_step(black_box(0.5), 0.02).expect("step"))
        });

        let (b0, b1, w) = random_bipartite(n, n / 2, &mut StdRng::seed_from_u64(n as u64));
        let mut annealer = BipartiteGraphAnnealer::new();
        annealer.set_problem(&b0, &b1, &w, MINIMIZE).expect("bipartite problem");
        annealer.seed(1);
        annealer.init_anneal().expect("prepared");
        group.bench_function(format!("rbm_{n}x{}", n / 2), |b| {
            b.iter(|| annealer.anneal_one_step(black_box(0.5), 0.02).expect("step"))
        });
    }
    group.finish();
}

fn brute_force_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("brute_force_search");
    let w = random_symmetric_w(12, &mut StdRng::seed_from_u64(12));
    let mut dense = DenseGraphBFSolver::new();
    dense.set_problem(&w, MINIMIZE).expect("dense problem");
    group.bench_function("dense_12", |b| b.iter(|| dense.search().expect("search")));

    let (b0, b1, w) = random_bipartite(6, 6, &mut StdRng::seed_from_u64(6));
    let mut rbm = BipartiteGraphBFSolver::new();
    rbm.set_problem(&b0, &b1, &w, MINIMIZE).expect("bipartite problem");
    group.bench_function("rbm_6x6", |b| b.iter(|| rbm.search().expect("search")));
    group.finish();
}

criterion_group!(benches, anneal_step_bench, brute_force_bench);
criterion_main!(benches);
