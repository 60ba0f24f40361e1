//! Slime Mould Algorithm
//!
//! Population-based search where each individual either moves towards the
//! global best (guided by two random partners and a rank-dependent weight) or
//! contracts around its own position. A small probability `p_t` resamples an
//! individual uniformly. The contraction coefficient shrinks to zero over the
//! epoch budget, so the search moves from exploration to exploitation.

use super::config::{OptimizeDirection, SmaConfig};
use super::history::{population_diversity, FitnessRecord, History};
use super::problem::Problem;
use super::result::OptimizationResult;
use crate::error::Result;
use rand::prelude::*;
use rand::seq::index;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::time::Instant;
use tracing::{debug, info};

/// Keeps the weight ratio finite when the population has converged
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
struct Agent {
    position: Vec<f64>,
    fitness: f64,
}

/// Slime mould optimizer
#[derive(Debug, Clone)]
pub struct SlimeMould {
    config: SmaConfig,
}

impl SlimeMould {
    /// Validate the configuration. Nothing is evaluated here.
    pub fn new(config: SmaConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SmaConfig {
        &self.config
    }

    /// Run the full epoch budget against `problem`
    pub fn solve(&self, problem: &Problem) -> OptimizationResult {
        let start = Instant::now();
        let direction = problem.direction();
        let space = problem.space();
        let dims = space.dims();
        let pop_size = self.config.pop_size;
        let epochs = self.config.epoch;

        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };
        let mut n_evaluations = 0usize;

        info!(pop_size, epochs, dims, direction = ?direction, "Starting slime mould search");

        let mut pop: Vec<Agent> = Vec::with_capacity(pop_size);
        for _ in 0..pop_size {
            let position = space.sample_position(&mut rng);
            let fitness = problem.objective(&position);
            n_evaluations += 1;
            pop.push(Agent { position, fitness });
        }

        let mut g_best = best_agent(&pop, direction).clone();
        let mut history = History::with_capacity(epochs);
        let mut weights = vec![vec![0.0; dims]; pop_size];

        for epoch in 0..epochs {
            let epoch_start = Instant::now();

            pop.sort_by(|a, b| direction.compare(a.fitness, b.fitness));
            let worst = pop[pop_size - 1].fitness;
            let ss = (g_best.fitness - worst).abs() + EPSILON;

            for (rank, (agent, w)) in pop.iter().zip(weights.iter_mut()).enumerate() {
                let ratio = (g_best.fitness - agent.fitness).abs() / ss;
                let log_term = if ratio.is_finite() { (ratio + 1.0).log10() } else { 0.0 };
                let upper_half = rank <= pop_size / 2;
                for wj in w.iter_mut() {
                    let r: f64 = rng.gen();
                    *wj = if upper_half { 1.0 + r * log_term } else { 1.0 - r * log_term };
                }
            }

            let progress = (epoch + 1) as f64 / epochs as f64;
            let a = (1.0 - progress).atanh();
            let b = 1.0 - progress;

            for idx in 0..pop_size {
                let mut position = if rng.gen::<f64>() < self.config.p_t {
                    space.sample_position(&mut rng)
                } else {
                    let p = (pop[idx].fitness - g_best.fitness).abs().tanh();
                    let p = if p.is_nan() { 0.0 } else { p };
                    let vb: Vec<f64> = (0..dims).map(|_| symmetric(&mut rng, a)).collect();
                    let vc: Vec<f64> = (0..dims).map(|_| symmetric(&mut rng, b)).collect();
                    let (id_a, id_b) = pick_partners(&mut rng, pop_size, idx);

                    let x_a = &pop[id_a].position;
                    let x_b = &pop[id_b].position;
                    let x_i = &pop[idx].position;
                    let w = &weights[idx];

                    (0..dims)
                        .map(|j| {
                            if rng.gen::<f64>() < p {
                                g_best.position[j] + vb[j] * (w[j] * x_a[j] - x_b[j])
                            } else {
                                vc[j] * x_i[j]
                            }
                        })
                        .collect()
                };

                space.correct(&mut position);
                let fitness = problem.objective(&position);
                n_evaluations += 1;

                if direction.is_better(fitness, pop[idx].fitness) {
                    pop[idx] = Agent { position, fitness };
                }
            }

            let current = best_agent(&pop, direction);
            let current_best = current.fitness;
            if direction.is_better(current.fitness, g_best.fitness) {
                g_best = current.clone();
            }

            let positions: Vec<Vec<f64>> = pop.iter().map(|agent| agent.position.clone()).collect();
            let diversity = population_diversity(&positions);
            let runtime_secs = epoch_start.elapsed().as_secs_f64();

            debug!(
                epoch,
                current_best,
                global_best = g_best.fitness,
                diversity,
                runtime_secs,
                "Epoch complete"
            );

            history.push(FitnessRecord {
                epoch,
                current_best,
                global_best: g_best.fitness,
                diversity,
                runtime_secs,
            });
        }

        let best_params = problem.decode(&g_best.position);
        let duration_secs = start.elapsed().as_secs_f64();

        info!(
            best_fitness = g_best.fitness,
            n_evaluations,
            duration_secs,
            params = %best_params,
            "Slime mould search finished"
        );

        OptimizationResult {
            best_position: g_best.position,
            best_params,
            best_fitness: g_best.fitness,
            history,
            n_evaluations,
            duration_secs,
        }
    }
}

/// First agent with the best fitness
fn best_agent(pop: &[Agent], direction: OptimizeDirection) -> &Agent {
    pop.iter().fold(&pop[0], |best, agent| {
        if direction.is_better(agent.fitness, best.fitness) {
            agent
        } else {
            best
        }
    })
}

/// Uniform draw in `[-half_width, half_width)`; zero width yields zero
fn symmetric<R: Rng>(rng: &mut R, half_width: f64) -> f64 {
    (rng.gen::<f64>() * 2.0 - 1.0) * half_width
}

/// Two distinct partners other than `idx`, reusing indices when fewer exist
fn pick_partners<R: Rng>(rng: &mut R, pop_size: usize, idx: usize) -> (usize, usize) {
    match pop_size {
        0 | 1 => (idx, idx),
        2 => (1 - idx, 1 - idx),
        _ => {
            let picks = index::sample(rng, pop_size - 1, 2);
            let skip = |k: usize| if k >= idx { k + 1 } else { k };
            (skip(picks.index(0)), skip(picks.index(1)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::search_space::{Bound, HyperparamSet, SearchSpace};

    fn sphere_problem(direction: OptimizeDirection) -> Problem {
        let space = SearchSpace::new(vec![
            Bound::float("x", -5.0, 5.0).unwrap(),
            Bound::float("y", -5.0, 5.0).unwrap(),
        ])
        .unwrap();
        let sign = match direction {
            OptimizeDirection::Minimize => 1.0,
            OptimizeDirection::Maximize => -1.0,
        };
        Problem::new(
            space,
            move |p: &HyperparamSet| {
                let x = p.get_float("x").unwrap_or(0.0);
                let y = p.get_float("y").unwrap_or(0.0);
                sign * (x * x + y * y)
            },
            direction,
        )
    }

    #[test]
    fn test_partners_are_distinct_from_self() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        for idx in 0..5 {
            for _ in 0..50 {
                let (a, b) = pick_partners(&mut rng, 5, idx);
                assert_ne!(a, idx);
                assert_ne!(b, idx);
                assert_ne!(a, b);
                assert!(a < 5 && b < 5);
            }
        }
        assert_eq!(pick_partners(&mut rng, 1, 0), (0, 0));
        assert_eq!(pick_partners(&mut rng, 2, 0), (1, 1));
    }

    #[test]
    fn test_symmetric_zero_width() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        assert_eq!(symmetric(&mut rng, 0.0), 0.0);
        let v = symmetric(&mut rng, 2.0);
        assert!((-2.0..2.0).contains(&v));
    }

    #[test]
    fn test_minimizes_sphere() {
        let problem = sphere_problem(OptimizeDirection::Minimize);
        let sma = SlimeMould::new(SmaConfig::new().with_epoch(30).with_pop_size(20).with_random_state(1)).unwrap();
        let result = sma.solve(&problem);

        assert_eq!(result.history.len(), 30);
        assert_eq!(result.n_evaluations, 20 * 31);
        assert!(result.best_fitness < 0.5, "best {}", result.best_fitness);

        let curve = result.history.global_best();
        assert!(curve.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn test_maximizes_negated_sphere() {
        let problem = sphere_problem(OptimizeDirection::Maximize);
        let sma = SlimeMould::new(SmaConfig::new().with_epoch(20).with_pop_size(15).with_random_state(9)).unwrap();
        let result = sma.solve(&problem);

        let curve = result.history.global_best();
        assert!(curve.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(result.best_fitness, *curve.last().unwrap());
        for record in result.history.records() {
            assert!(record.current_best <= record.global_best);
        }
    }

    #[test]
    fn test_single_individual_single_epoch() {
        let problem = sphere_problem(OptimizeDirection::Minimize);
        let sma = SlimeMould::new(SmaConfig::new().with_epoch(1).with_pop_size(1).with_random_state(4)).unwrap();
        let result = sma.solve(&problem);

        assert_eq!(result.history.len(), 1);
        assert_eq!(result.n_evaluations, 2);
        assert_eq!(result.history.records()[0].diversity, 0.0);
    }

    #[test]
    fn test_seeded_runs_match() {
        let problem = sphere_problem(OptimizeDirection::Minimize);
        let config = SmaConfig::new().with_epoch(10).with_pop_size(8).with_random_state(77);
        let first = SlimeMould::new(config.clone()).unwrap().solve(&problem);
        let second = SlimeMould::new(config).unwrap().solve(&problem);

        assert_eq!(first.best_position, second.best_position);
        assert_eq!(first.history.global_best(), second.history.global_best());
    }
}
