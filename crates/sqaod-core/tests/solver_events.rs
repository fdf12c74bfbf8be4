use std::sync::{Arc, Mutex};

use rand::SeedableRng;
use rand::rngs::StdRng;
use sqaod_core::{
    ANNEAL, AnnealSchedule, BRUTEFORCE, GraphType, MINIMIZE, Problem, SolverType, create_solver,
};
use tracing::{Event, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Records the target of every event that passes the filter.
#[derive(Clone, Default)]
struct TargetRecorder {
    targets: Arc<Mutex<Vec<String>>>,
}

impl TargetRecorder {
    fn count(&self, target: &str) -> usize {
        self.targets
            .lock()
            .unwrap()
            .iter()
            .filter(|seen| seen.as_str() == target)
            .count()
    }
}

impl<S: Subscriber> Layer<S> for TargetRecorder {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.targets
            .lock()
            .unwrap()
            .push(event.metadata().target().to_string());
    }
}

fn solve_under(directives: &str, graph: GraphType, solver: SolverType) -> TargetRecorder {
    let recorder = TargetRecorder::default();
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::new(directives))
        .with(recorder.clone());

    let mut rng = StdRng::seed_from_u64(77);
    let problem = match graph {
        GraphType::Rbm => Problem::random_bipartite(3, 3, &mut rng),
        _ => Problem::random_dense(5, &mut rng),
    };
    let schedule = AnnealSchedule {
        trotters: Some(2),
        ..AnnealSchedule::default()
    };

    tracing::subscriber::with_default(subscriber, || {
        let mut built = create_solver(graph, solver, &problem, MINIMIZE).unwrap();
        built.seed(5);
        built.solve(&schedule).unwrap();
    });
    recorder
}

#[test]
fn anneal_events_pass_a_target_scoped_filter() {
    for graph in [GraphType::Dense, GraphType::Rbm] {
        let broad = solve_under("info", graph, ANNEAL);
        assert_eq!(broad.count("sqaod::anneal"), 1, "{graph}");

        let scoped = solve_under("warn,sqaod::anneal=info", graph, ANNEAL);
        assert_eq!(scoped.count("sqaod::anneal"), 1, "{graph}");
    }
}

#[test]
fn search_events_pass_a_target_scoped_filter() {
    for graph in [GraphType::Dense, GraphType::Rbm] {
        let scoped = solve_under("warn,sqaod::search=info", graph, BRUTEFORCE);
        assert_eq!(scoped.count("sqaod::search"), 1, "{graph}");
    }
}

#[test]
fn silenced_targets_emit_nothing() {
    let recorder = solve_under("info,sqaod::anneal=off", GraphType::Dense, ANNEAL);
    assert_eq!(recorder.count("sqaod::anneal"), 0);
}
