//! Integration test: slime mould search properties

use ndarray::{Array1, Array2};
use sma_tuner::optimizer::{
    Bound, HyperparamSet, OptimizeDirection, ParameterValue, Problem, ProblemConfig, SearchSpace,
    SlimeMould, SmaConfig,
};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use sma_tuner::utils::{DatasetConfig, PreparedData};
use sma_tuner::TunerError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 100 rows, 3 features, 50/50 labels with overlapping classes
fn toy_data() -> Arc<PreparedData> {
    let n = 100;
    let y = Array1::from_shape_fn(n, |i| (i % 2) as f64);
    let x = Array2::from_shape_fn((n, 3), |(i, j)| {
        let label = (i % 2) as f64;
        let t = i as f64;
        match j {
            0 => (label * 2.0 - 1.0) + 0.8 * (t * 1.3).sin(),
            1 => (t * 0.7).cos(),
            _ => 0.5 * label + 0.4 * (t * 0.37).sin(),
        }
    });
    let names = vec!["f0".to_string(), "f1".to_string(), "f2".to_string()];
    Arc::new(PreparedData::from_arrays(x, y, names, &DatasetConfig::default()).unwrap())
}

fn sgd_problem(data: Arc<PreparedData>) -> Problem {
    Problem::from_config(ProblemConfig::new().with_data(data)).unwrap()
}

#[test]
fn test_toy_dataset_scenario() {
    let problem = sgd_problem(toy_data());
    let sma = SlimeMould::new(SmaConfig::new().with_epoch(5).with_pop_size(10).with_random_state(3)).unwrap();
    let result = sma.solve(&problem);

    assert_eq!(result.history.len(), 5);
    assert_eq!(result.history.epochs(), vec![0, 1, 2, 3, 4]);
    assert_eq!(result.n_evaluations, 60);

    for record in result.history.records() {
        assert!((0.0..=1.0).contains(&record.current_best));
        assert!((0.0..=1.0).contains(&record.global_best));
    }

    let global = result.history.global_best();
    assert!(global[4] >= global[0]);
    assert_eq!(result.best_fitness, global[4]);

    // The best position decodes to a legal configuration
    let params = &result.best_params;
    let alpha = params.get_float("alpha").unwrap();
    assert!((1e-8..=10.0).contains(&alpha));
    assert!(["l1", "l2", "elasticnet"].contains(&params.get_str("penalty").unwrap()));
}

#[test]
fn test_global_best_never_decreases() {
    let problem = sgd_problem(toy_data());
    let sma = SlimeMould::new(SmaConfig::new().with_epoch(8).with_pop_size(6).with_random_state(21)).unwrap();
    let result = sma.solve(&problem);

    let global = result.history.global_best();
    assert_eq!(global.len(), 8);
    assert!(global.windows(2).all(|w| w[1] >= w[0]));
}

#[test]
fn test_same_seed_same_result() {
    let data = toy_data();
    let config = SmaConfig::new().with_epoch(4).with_pop_size(5).with_random_state(99);

    let first = SlimeMould::new(config.clone()).unwrap().solve(&sgd_problem(Arc::clone(&data)));
    let second = SlimeMould::new(config).unwrap().solve(&sgd_problem(data));

    assert_eq!(first.best_position, second.best_position);
    assert_eq!(first.best_params, second.best_params);
    assert_eq!(first.history.current_best(), second.history.current_best());
    assert_eq!(first.history.global_best(), second.history.global_best());
}

#[test]
fn test_zero_population_is_rejected_before_any_evaluation() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let space = SearchSpace::sgd_default();
    let _problem = Problem::new(
        space,
        move |_: &HyperparamSet| {
            counter.fetch_add(1, Ordering::SeqCst);
            1.0
        },
        OptimizeDirection::Maximize,
    );

    let err = SlimeMould::new(SmaConfig::new().with_pop_size(0).with_epoch(5)).unwrap_err();
    assert!(matches!(err, TunerError::InvalidConfig(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_evaluation_count() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let problem = Problem::new(
        SearchSpace::sgd_default(),
        move |p: &HyperparamSet| {
            counter.fetch_add(1, Ordering::SeqCst);
            -p.get_float("alpha").unwrap_or(0.0)
        },
        OptimizeDirection::Maximize,
    );

    let result = SlimeMould::new(SmaConfig::new().with_epoch(7).with_pop_size(4).with_random_state(1))
        .unwrap()
        .solve(&problem);

    assert_eq!(calls.load(Ordering::SeqCst), 4 * 8);
    assert_eq!(result.n_evaluations, 32);
}

#[test]
fn test_categorical_only_space() {
    let space = SearchSpace::new(vec![Bound::categorical("letter", ["a", "b", "c"]).unwrap()]).unwrap();
    let params = space.decode(&[5.0]);
    assert_eq!(params.get("letter"), Some(&ParameterValue::String("c".to_string())));

    // Only 'b' scores; the search should find it
    let problem = Problem::new(
        space,
        |p: &HyperparamSet| if p.get_str("letter") == Some("b") { 1.0 } else { 0.0 },
        OptimizeDirection::Maximize,
    );
    let result = SlimeMould::new(SmaConfig::new().with_epoch(5).with_pop_size(10).with_random_state(0))
        .unwrap()
        .solve(&problem);

    assert_eq!(result.best_fitness, 1.0);
    assert_eq!(result.best_params.get_str("letter"), Some("b"));
}

#[test]
fn test_minimization_direction() {
    let space = SearchSpace::new(vec![Bound::float("x", -10.0, 10.0).unwrap()]).unwrap();
    let problem = Problem::new(
        space,
        |p: &HyperparamSet| {
            let x = p.get_float("x").unwrap_or(0.0);
            (x - 3.0).powi(2)
        },
        OptimizeDirection::Minimize,
    );
    let result = SlimeMould::new(SmaConfig::new().with_epoch(25).with_pop_size(15).with_random_state(5))
        .unwrap()
        .solve(&problem);

    let global = result.history.global_best();
    assert!(global.windows(2).all(|w| w[1] <= w[0]));
    assert!(result.best_fitness < 1.0, "best {}", result.best_fitness);
}

#[test]
fn test_ties_keep_the_first_sampled_agent() {
    let space = SearchSpace::new(vec![Bound::float("x", 0.0, 1.0).unwrap(), abc_bound()]).unwrap();

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
    let first = space.sample_position(&mut rng);

    for direction in [OptimizeDirection::Maximize, OptimizeDirection::Minimize] {
        let problem = Problem::new(space.clone(), |_: &HyperparamSet| 0.5, direction);
        let result = SlimeMould::new(SmaConfig::new().with_epoch(3).with_pop_size(5).with_random_state(1))
            .unwrap()
            .solve(&problem);

        assert_eq!(result.best_position, first);
        assert_eq!(result.best_params, space.decode(&first));
        assert!(result.history.global_best().iter().all(|&g| g == 0.5));
    }
}

fn abc_bound() -> Bound {
    Bound::categorical("letter", ["a", "b", "c"]).unwrap()
}
