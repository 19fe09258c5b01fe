//! Round-based parallel annealing.
//!
//! Each round hands the current best state to `n_threads` fresh annealers on
//! a fixed rayon pool, waits for them up to a deadline, and keeps the best
//! result. The next round starts from that best, so rounds are strictly
//! ordered while the work within a round is independent.
//!
//! Workers still running at the deadline are told to stop through a shared
//! flag; whatever they return afterwards is discarded.

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{Annealer, Optimizer, ScaledTemperature, Scorer, TemperatureFunction};

/// Builds a worker's annealer from its temperature schedule and seed.
pub type AnnealerFactory<S> =
    Arc<dyn Fn(Arc<dyn TemperatureFunction>, u64) -> Annealer<S> + Send + Sync>;

/// Round parameters.
#[derive(Debug, Clone)]
pub struct ConcurrentConfig {
    pub n_threads: usize,
    pub steps_per_iteration: u64,
    pub iteration_timeout: Duration,
    pub no_progress_cancel: Duration,
    pub seed: u64,
}

impl Default for ConcurrentConfig {
    fn default() -> Self {
        Self {
            n_threads: 4,
            steps_per_iteration: 1000,
            iteration_timeout: Duration::from_secs(10),
            no_progress_cancel: Duration::from_secs(20 * 60),
            seed: 0,
        }
    }
}

/// Outcome of one round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundReport {
    pub round: u64,
    pub temperature: f64,
    pub best_score: f64,
    /// Workers that reported before the deadline.
    pub received: usize,
    pub elapsed: Duration,
}

/// Pool of `size` threads named `annealer-{i}`. A panicking worker is
/// logged and its round result is simply never received.
fn worker_pool(size: usize) -> Result<ThreadPool, ThreadPoolBuildError> {
    ThreadPoolBuilder::new()
        .num_threads(size)
        .thread_name(|i| format!("annealer-{i}"))
        .panic_handler(|_| error!("annealer worker panicked"))
        .build()
}

/// Best state so far, shared between the coordinator and its workers.
type SharedBest<S> = Arc<Mutex<Option<(S, f64)>>>;

/// Replaces the best only on a strictly greater score.
fn offer<S>(best: &Mutex<Option<(S, f64)>>, state: S, score: f64) -> bool {
    let mut guard = best.lock();
    match guard.as_ref() {
        Some((_, current)) if score <= *current => false,
        _ => {
            *guard = Some((state, score));
            true
        }
    }
}

/// Parallel annealing with a barrier on the best state after every round.
///
/// # Temperature
/// Round `r` of `n` runs at `primary(r, n)`, which scales every worker's
/// `sub` schedule for that round.
pub struct ConcurrentOptimizer<S> {
    factory: AnnealerFactory<S>,
    scorer: Arc<dyn Scorer<S>>,
    primary: Arc<dyn TemperatureFunction>,
    sub: Arc<dyn TemperatureFunction>,
    config: ConcurrentConfig,
    pool: ThreadPool,
    best: SharedBest<S>,
    history: Vec<RoundReport>,
    rounds_run: u64,
}

impl<S: Clone + Send + 'static> ConcurrentOptimizer<S> {
    /// Starts the worker pool.
    ///
    /// # Errors
    /// If the rayon pool cannot be built.
    pub fn new(
        factory: AnnealerFactory<S>,
        scorer: Arc<dyn Scorer<S>>,
        primary: Arc<dyn TemperatureFunction>,
        sub: Arc<dyn TemperatureFunction>,
        config: ConcurrentConfig,
    ) -> Result<Self, ThreadPoolBuildError> {
        let pool = worker_pool(config.n_threads.max(1))?;
        Ok(Self {
            factory,
            scorer,
            primary,
            sub,
            config,
            pool,
            best: Arc::new(Mutex::new(None)),
            history: Vec::new(),
            rounds_run: 0,
        })
    }

    pub fn config(&self) -> &ConcurrentConfig {
        &self.config
    }

    /// Best state and score so far.
    pub fn best(&self) -> Option<(S, f64)> {
        self.best.lock().clone()
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best.lock().as_ref().map(|(_, score)| *score)
    }

    /// Every round run so far.
    pub fn history(&self) -> &[RoundReport] {
        &self.history
    }

    /// Runs rounds until `duration` has passed.
    ///
    /// The primary temperature follows elapsed over total milliseconds.
    pub fn iterate_for(&mut self, duration: Duration, initial: S) -> S {
        let started = Instant::now();
        let total_ms = duration.as_millis().max(1) as u64;
        self.seed_best(initial.clone());
        let mut last_improvement = Instant::now();
        let mut round = 0;

        while started.elapsed() < duration {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            let t = self.primary.temperature(elapsed_ms, total_ms);
            if self.round(round, t) {
                last_improvement = Instant::now();
            } else if last_improvement.elapsed() >= self.config.no_progress_cancel {
                info!("no improvement for {:?}; stopping", self.config.no_progress_cancel);
                break;
            }
            round += 1;
        }
        self.best().map_or(initial, |(state, _)| state)
    }

    fn seed_best(&self, initial: S) {
        let score = self.scorer.score(&initial);
        offer(&self.best, initial, score);
    }

    fn worker_seed(&self, worker: usize) -> u64 {
        let index = self.rounds_run * self.config.n_threads as u64 + worker as u64;
        self.config
            .seed
            .wrapping_add(index)
            .wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }

    /// Runs one round at temperature `t`. Returns whether the best improved.
    fn round(&mut self, round: u64, t: f64) -> bool {
        let started = Instant::now();
        let Some((start, before)) = self.best() else {
            return false;
        };
        info!("round {round}: temperature {t:.4}, best {before:.4}");

        let schedule: Arc<dyn TemperatureFunction> =
            Arc::new(ScaledTemperature::new(Arc::clone(&self.sub), t));
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel::<f64>();
        let n = self.config.n_threads.max(1);

        for worker in 0..n {
            let mut annealer = (self.factory)(Arc::clone(&schedule), self.worker_seed(worker))
                .with_cancellation(Arc::clone(&cancel));
            let state = start.clone();
            let steps = self.config.steps_per_iteration;
            let best = Arc::clone(&self.best);
            let cancel = Arc::clone(&cancel);
            let tx = tx.clone();
            self.pool.spawn(move || {
                let (state, score) = annealer.run(steps, state);
                {
                    let mut guard = best.lock();
                    if cancel.load(Ordering::Relaxed) {
                        return;
                    }
                    if guard.as_ref().map_or(true, |(_, current)| score > *current) {
                        *guard = Some((state, score));
                    }
                }
                let _ = tx.send(score);
            });
        }
        drop(tx);
        self.rounds_run += 1;

        let deadline = started + self.config.iteration_timeout;
        let mut received = 0;
        while received < n {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(score) => {
                    received += 1;
                    debug!("round {round}: worker finished at {score:.4}");
                }
                Err(RecvTimeoutError::Timeout) => {
                    // flip under the lock so no late result lands after this
                    let _guard = self.best.lock();
                    cancel.store(true, Ordering::Relaxed);
                    warn!("round {round}: {} worker(s) timed out", n - received);
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("round {round}: {} worker(s) failed", n - received);
                    break;
                }
            }
        }

        let after = self.best_score().unwrap_or(before);
        let elapsed = started.elapsed();
        info!("round {round}: best {after:.4} after {elapsed:?}");
        self.history.push(RoundReport {
            round,
            temperature: t,
            best_score: after,
            received,
            elapsed,
        });
        after > before
    }
}

impl<S: Clone + Send + 'static> Optimizer<S> for ConcurrentOptimizer<S> {
    /// Runs `steps` rounds.
    fn iterate(&mut self, steps: u64, initial: S) -> S {
        self.seed_best(initial.clone());
        let mut last_improvement = Instant::now();
        for round in 0..steps {
            let t = self.primary.temperature(round, steps);
            if self.round(round, t) {
                last_improvement = Instant::now();
            } else if last_improvement.elapsed() >= self.config.no_progress_cancel {
                info!("no improvement for {:?}; stopping", self.config.no_progress_cancel);
                break;
            }
        }
        self.best().map_or(initial, |(state, _)| state)
    }

    fn scorer(&self) -> &dyn Scorer<S> {
        self.scorer.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::annealer::tests::{Parabola, Step};
    use crate::optimizer::{Perturber, TemperatureKind};
    use rand::RngCore;
    use std::thread;

    fn parabola_factory() -> AnnealerFactory<i64> {
        Arc::new(|temperature, seed| {
            Annealer::new(Arc::new(Parabola), Arc::new(Step), temperature, seed)
        })
    }

    fn optimizer(config: ConcurrentConfig) -> ConcurrentOptimizer<i64> {
        ConcurrentOptimizer::new(
            parabola_factory(),
            Arc::new(Parabola),
            Arc::new(TemperatureKind::LinearInclusive),
            Arc::new(ScaledTemperature::new(Arc::new(TemperatureKind::Quadratic), 100.0)),
            config,
        )
        .unwrap()
    }

    #[test]
    fn test_rounds_reach_optimum() {
        let mut opt = optimizer(ConcurrentConfig {
            n_threads: 3,
            steps_per_iteration: 300,
            seed: 17,
            ..ConcurrentConfig::default()
        });
        let best = opt.iterate(10, -60);
        assert_eq!(best, 6);
        assert_eq!(opt.best_score(), Some(0.0));
        assert_eq!(opt.history().len(), 10);
        assert!(opt.history().iter().all(|r| r.received == 3));
    }

    #[test]
    fn test_best_score_non_decreasing() {
        let mut opt = optimizer(ConcurrentConfig {
            n_threads: 4,
            steps_per_iteration: 20,
            seed: 5,
            ..ConcurrentConfig::default()
        });
        let initial_score = Parabola.score(&-500);
        opt.iterate(15, -500);
        let scores: Vec<f64> = opt.history().iter().map(|r| r.best_score).collect();
        assert!(scores[0] >= initial_score);
        assert!(scores.windows(2).all(|w| w[0] <= w[1]), "{scores:?}");
    }

    #[test]
    fn test_round_temperature_follows_primary() {
        let mut opt = optimizer(ConcurrentConfig {
            n_threads: 1,
            steps_per_iteration: 5,
            ..ConcurrentConfig::default()
        });
        opt.iterate(4, 0);
        let temps: Vec<f64> = opt.history().iter().map(|r| r.temperature).collect();
        assert_eq!(temps, vec![1.0, 0.75, 0.5, 0.25]);
    }

    /// Sleeps on every step, so rounds overrun any short deadline.
    struct Slow;

    impl Perturber<i64> for Slow {
        fn perturb(&self, x: &i64, _t: f64, _rng: &mut dyn RngCore) -> i64 {
            thread::sleep(Duration::from_millis(5));
            x + 1
        }
    }

    #[test]
    fn test_timed_out_workers_are_discarded() {
        let factory: AnnealerFactory<i64> = Arc::new(|temperature, seed| {
            Annealer::new(Arc::new(Parabola), Arc::new(Slow), temperature, seed)
        });
        let mut opt = ConcurrentOptimizer::new(
            factory,
            Arc::new(Parabola),
            Arc::new(TemperatureKind::LinearInclusive),
            Arc::new(TemperatureKind::Quadratic),
            ConcurrentConfig {
                n_threads: 2,
                steps_per_iteration: 10_000,
                iteration_timeout: Duration::from_millis(30),
                ..ConcurrentConfig::default()
            },
        )
        .unwrap();
        let best = opt.iterate(2, 0);
        assert_eq!(best, 0);
        assert_eq!(opt.best_score(), Some(-36.0));
        assert!(opt.history().iter().all(|r| r.received == 0));
    }

    struct Exploding;

    impl Perturber<i64> for Exploding {
        fn perturb(&self, _x: &i64, _t: f64, _rng: &mut dyn RngCore) -> i64 {
            panic!("perturber failed");
        }
    }

    #[test]
    fn test_panicking_workers_keep_best() {
        let factory: AnnealerFactory<i64> = Arc::new(|temperature, seed| {
            Annealer::new(Arc::new(Parabola), Arc::new(Exploding), temperature, seed)
        });
        let mut opt = ConcurrentOptimizer::new(
            factory,
            Arc::new(Parabola),
            Arc::new(TemperatureKind::LinearInclusive),
            Arc::new(TemperatureKind::Quadratic),
            ConcurrentConfig {
                n_threads: 3,
                steps_per_iteration: 10,
                iteration_timeout: Duration::from_secs(5),
                ..ConcurrentConfig::default()
            },
        )
        .unwrap();
        let best = opt.iterate(2, 2);
        assert_eq!(best, 2);
        assert_eq!(opt.best_score(), Some(-16.0));
        assert_eq!(opt.history().len(), 2);
        assert!(opt.history().iter().all(|r| r.received == 0));
    }

    #[test]
    fn test_iterate_for_stops_without_progress() {
        let mut opt = optimizer(ConcurrentConfig {
            n_threads: 2,
            steps_per_iteration: 10,
            no_progress_cancel: Duration::ZERO,
            seed: 1,
            ..ConcurrentConfig::default()
        });
        // already optimal: the first round cannot improve
        let best = opt.iterate_for(Duration::from_secs(30), 6);
        assert_eq!(best, 6);
        assert_eq!(opt.history().len(), 1);
    }

    #[test]
    fn test_offer_requires_strict_improvement() {
        let best = Mutex::new(None);
        assert!(offer(&best, 1, 1.0));
        assert!(!offer(&best, 2, 1.0));
        assert!(offer(&best, 3, 2.0));
        assert_eq!(*best.lock(), Some((3, 2.0)));
    }
}
