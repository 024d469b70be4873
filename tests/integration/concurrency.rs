use ipylua::LoadOutcome;

use crate::common::{eval, plain, session};

const THREADS: usize = 8;

#[test]
fn test_concurrent_load_runs_fragment_once() {
    let source = "concurrent_hits = (concurrent_hits or 0) + 1";
    let outcomes: Vec<LoadOutcome> = crossbeam::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| scope.spawn(move |_| session().load_code("concurrent-once", source).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap();

    let loaded = outcomes
        .iter()
        .filter(|o| matches!(o, LoadOutcome::Loaded(_)))
        .count();
    assert_eq!(loaded, 1);
    assert!(outcomes
        .iter()
        .all(|o| matches!(o, LoadOutcome::Loaded(_) | LoadOutcome::AlreadyLoaded)));
    assert_eq!(plain(&eval("concurrent-hits", "concurrent_hits")), "1");
}

#[test]
fn test_concurrent_loads_of_distinct_fragments() {
    let outcomes: Vec<LoadOutcome> = crossbeam::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                scope.spawn(move |_| {
                    let name = format!("concurrent-frag-{}", i);
                    let source = format!("concurrent_frag_{} = (concurrent_frag_{} or 0) + 1", i, i);
                    session().load_code(&name, source).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap();

    assert!(outcomes.iter().all(|o| matches!(o, LoadOutcome::Loaded(_))));
    let fragments = session().loaded_fragments();
    for i in 0..THREADS {
        let counter = eval("concurrent-frag-check", &format!("concurrent_frag_{}", i));
        assert_eq!(plain(&counter), "1");
        let name = format!("concurrent-frag-{}", i);
        assert_eq!(fragments.iter().filter(|f| **f == name).count(), 1);
    }
}

#[test]
fn test_concurrent_evals_get_their_own_results() {
    crossbeam::scope(|scope| {
        for thread in 0..THREADS {
            scope.spawn(move |_| {
                for i in 0..20 {
                    let name = format!("concurrent-{}-{}", thread, i);
                    let result = eval(&name, &format!("{} * 1000 + {}", thread, i));
                    assert_eq!(plain(&result), (thread * 1000 + i).to_string());
                }
            });
        }
    })
    .unwrap();
}

#[test]
fn test_evaluation_is_never_observed_midway() {
    crossbeam::scope(|scope| {
        scope.spawn(|_| {
            for _ in 0..5 {
                eval(
                    "concurrent-busy",
                    "concurrent_busy = true for i = 1, 200000 do end concurrent_busy = false",
                );
            }
        });
        scope.spawn(|_| {
            for _ in 0..50 {
                let seen = plain(&eval("concurrent-observer", "concurrent_busy == true")).to_string();
                assert_eq!(seen, "false");
            }
        });
    })
    .unwrap();
}
