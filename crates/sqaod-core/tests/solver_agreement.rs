use rand::SeedableRng;
use rand::rngs::StdRng;
use sqaod_core::model::Assignment;
use sqaod_core::{
    ANNEAL, AnnealSchedule, BRUTEFORCE, DENSE, MAXIMIZE, MINIMIZE, OptimizeMethod, Problem, RBM,
    create_solver,
};

fn schedule() -> AnnealSchedule {
    AnnealSchedule {
        g_start: 3.0,
        g_end: 0.01,
        tau: 0.97,
        kt: 0.02,
        trotters: Some(8),
    }
}

fn check_instance(problem: &Problem, method: OptimizeMethod, seed: u64) {
    let graph = problem.graph_type();
    let mut exact = create_solver(graph, BRUTEFORCE, problem, method).unwrap();
    let exact = exact.solve(&schedule()).unwrap();

    let mut annealer = create_solver(graph, ANNEAL, problem, method).unwrap();
    annealer.seed(seed);
    let annealed = annealer.solve(&schedule()).unwrap();

    // Every reported energy describes the reported assignment.
    for (assignment, &energy) in annealed.solutions.iter().zip(&annealed.energies) {
        let expected = problem.energy(assignment).unwrap();
        assert!((expected - energy).abs() < 1e-9, "{expected} vs {energy}");
    }
    assert_eq!(annealed.best_energy, method.best(&annealed.energies).unwrap());
    assert_eq!(annealed.steps, schedule().step_count());

    // Brute force bounds the annealer from the optimising side.
    assert!(!method.is_better(&annealed.best_energy, &(exact.best_energy - method.sign(1e-9))));
    for assignment in &exact.solutions {
        let energy = problem.energy(assignment).unwrap();
        assert!((energy - exact.best_energy).abs() < 1e-9);
    }
}

#[test]
fn dense_solvers_agree_on_random_instances() {
    let mut rng = StdRng::seed_from_u64(20240601);
    for instance in 0..3u64 {
        let problem = Problem::random_dense(6, &mut rng);
        for method in [MINIMIZE, MAXIMIZE] {
            check_instance(&problem, method, 100 + instance);
        }
    }
}

#[test]
fn bipartite_solvers_agree_on_random_instances() {
    let mut rng = StdRng::seed_from_u64(20240602);
    for instance in 0..3u64 {
        let problem = Problem::random_bipartite(3, 4, &mut rng);
        for method in [MINIMIZE, MAXIMIZE] {
            check_instance(&problem, method, 200 + instance);
        }
    }
}

#[test]
fn maximizing_is_minimizing_the_negated_problem() {
    let problem = Problem::random_dense(5, &mut StdRng::seed_from_u64(11));
    let Problem::Dense { w } = &problem else {
        unreachable!("random_dense builds a dense problem");
    };
    let negated = Problem::Dense {
        w: MAXIMIZE.sign(w.clone()),
    };

    let mut high = create_solver(DENSE, BRUTEFORCE, &problem, MAXIMIZE).unwrap();
    let mut low = create_solver(DENSE, BRUTEFORCE, &negated, MINIMIZE).unwrap();
    let high = high.solve(&AnnealSchedule::default()).unwrap();
    let low = low.solve(&AnnealSchedule::default()).unwrap();

    assert!((high.best_energy + low.best_energy).abs() < 1e-12);
    assert_eq!(high.solutions, low.solutions);
}

#[test]
fn sorted_trotter_energies_lead_with_the_best() {
    let problem = Problem::random_bipartite(4, 4, &mut StdRng::seed_from_u64(12));
    for method in [MINIMIZE, MAXIMIZE] {
        let mut annealer = create_solver(RBM, ANNEAL, &problem, method).unwrap();
        annealer.seed(3);
        let outcome = annealer.solve(&schedule()).unwrap();
        let sorted = method.sort(&outcome.energies);
        assert_eq!(sorted.len(), outcome.energies.len());
        assert_eq!(sorted[0], outcome.best_energy);
        assert!(matches!(outcome.best, Assignment::Bipartite(_)));
    }
}
