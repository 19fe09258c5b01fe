//! Single-threaded annealing loop.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{
    AcceptanceFunction, Optimizer, Perturber, Scorer, StandardAcceptance, TemperatureFunction,
};

/// Simulated annealing over states of type `S`.
///
/// # Algorithm
/// For each step `s` of `n`:
/// 1. `t = temperature(s, n)`
/// 2. perturb the current state at `t`
/// 3. record the candidate if it beats the best seen
/// 4. move to it if the acceptance function agrees
///
/// The best state is tracked separately from the current one, since the
/// walk may leave it.
pub struct Annealer<S> {
    scorer: Arc<dyn Scorer<S>>,
    perturber: Arc<dyn Perturber<S>>,
    temperature: Arc<dyn TemperatureFunction>,
    acceptance: Arc<dyn AcceptanceFunction>,
    rng: SmallRng,
    cancel: Option<Arc<AtomicBool>>,
}

impl<S: Clone> Annealer<S> {
    pub fn new(
        scorer: Arc<dyn Scorer<S>>,
        perturber: Arc<dyn Perturber<S>>,
        temperature: Arc<dyn TemperatureFunction>,
        seed: u64,
    ) -> Self {
        Self {
            scorer,
            perturber,
            temperature,
            acceptance: Arc::new(StandardAcceptance),
            rng: SmallRng::seed_from_u64(seed),
            cancel: None,
        }
    }

    pub fn with_acceptance(mut self, acceptance: Arc<dyn AcceptanceFunction>) -> Self {
        self.acceptance = acceptance;
        self
    }

    /// Stops the loop early once `cancel` is set.
    pub fn with_cancellation(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed))
    }

    /// Runs `steps` steps from `initial`; returns the best state and its score.
    pub fn run(&mut self, steps: u64, initial: S) -> (S, f64) {
        let mut current_score = self.scorer.score(&initial);
        let mut best = (initial.clone(), current_score);
        let mut current = initial;

        for step in 0..steps {
            if self.cancelled() {
                break;
            }
            let t = self.temperature.temperature(step, steps);
            let candidate = self.perturber.perturb(&current, t, &mut self.rng);
            let candidate_score = self.scorer.score(&candidate);
            if candidate_score > best.1 {
                best = (candidate.clone(), candidate_score);
            }
            if self
                .acceptance
                .accept(current_score, candidate_score, t, &mut self.rng)
            {
                current = candidate;
                current_score = candidate_score;
            }
        }
        best
    }
}

impl<S: Clone> Optimizer<S> for Annealer<S> {
    fn iterate(&mut self, steps: u64, initial: S) -> S {
        self.run(steps, initial).0
    }

    fn scorer(&self) -> &dyn Scorer<S> {
        self.scorer.as_ref()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::optimizer::{GreedyAcceptance, ScaledTemperature, TemperatureKind};
    use rand::{Rng, RngCore};

    /// `-(x - 6)^2`, peaking at 6.
    pub(crate) struct Parabola;

    impl Scorer<i64> for Parabola {
        fn score(&self, x: &i64) -> f64 {
            -((x - 6) as f64).powi(2)
        }
    }

    /// Steps ±1 with equal probability.
    pub(crate) struct Step;

    impl Perturber<i64> for Step {
        fn perturb(&self, x: &i64, _t: f64, rng: &mut dyn RngCore) -> i64 {
            if rng.random_bool(0.5) {
                x + 1
            } else {
                x - 1
            }
        }
    }

    fn annealer(seed: u64) -> Annealer<i64> {
        Annealer::new(
            Arc::new(Parabola),
            Arc::new(Step),
            Arc::new(ScaledTemperature::new(Arc::new(TemperatureKind::Quadratic), 1000.0)),
            seed,
        )
    }

    #[test]
    fn test_converges_on_parabola() {
        let mut a = annealer(42);
        assert_eq!(a.iterate(1000, -103), 6);
    }

    #[test]
    fn test_same_seed_same_result() {
        assert_eq!(annealer(9).run(300, -50), annealer(9).run(300, -50));
    }

    #[test]
    fn test_best_never_below_initial() {
        let mut a = annealer(1);
        let (best, score) = a.run(10, 6);
        assert_eq!(best, 6);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_greedy_only_climbs() {
        let mut a = annealer(5).with_acceptance(Arc::new(GreedyAcceptance));
        let (best, _) = a.run(2000, -20);
        assert_eq!(best, 6);
    }

    #[test]
    fn test_cancelled_returns_initial() {
        let cancel = Arc::new(AtomicBool::new(true));
        let mut a = annealer(3).with_cancellation(cancel);
        assert_eq!(a.run(1000, -103), (-103, -(109f64.powi(2))));
    }
}
