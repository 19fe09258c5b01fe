//! Simulated annealing.
//!
//! The search is assembled from four seams, each generic over the state
//! type `S`:
//!
//! - [`Scorer`]: fitness, higher is better
//! - [`Perturber`]: random neighbor, magnitude shrinking with temperature
//! - [`TemperatureFunction`]: step index → temperature
//! - [`AcceptanceFunction`]: whether to move to a candidate
//!
//! An [`Annealer`] runs them single-threaded. A [`ConcurrentOptimizer`]
//! runs several annealers per round on a worker pool and restarts every
//! round from the best state found so far.
//!
//! Randomness is passed explicitly, so a seeded run is reproducible.
//!
//! # Reference
//! Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"

mod acceptance;
mod annealer;
mod concurrent;
mod temperature;

pub use acceptance::{GreedyAcceptance, StandardAcceptance};
pub use annealer::Annealer;
pub use concurrent::{AnnealerFactory, ConcurrentConfig, ConcurrentOptimizer, RoundReport};
pub use temperature::{ScaledTemperature, TemperatureKind};

use rand::RngCore;
use std::fmt::Debug;

/// Fitness of a state. Must be deterministic.
pub trait Scorer<S>: Send + Sync {
    fn score(&self, state: &S) -> f64;
}

/// Produces a random neighbor of a state.
pub trait Perturber<S>: Send + Sync {
    /// `temperature` is typically in `[0, 1]`; implementations may ignore it.
    fn perturb(&self, state: &S, temperature: f64, rng: &mut dyn RngCore) -> S;
}

/// Cooling schedule.
pub trait TemperatureFunction: Send + Sync + Debug {
    /// Temperature at `step` of `total`. Non-increasing in `step`.
    fn temperature(&self, step: u64, total: u64) -> f64;
}

/// Move rule between the current state and a candidate.
pub trait AcceptanceFunction: Send + Sync + Debug {
    fn accept(
        &self,
        old_score: f64,
        new_score: f64,
        temperature: f64,
        rng: &mut dyn RngCore,
    ) -> bool;
}

/// A search that improves a state.
pub trait Optimizer<S> {
    /// Runs `steps` units of work from `initial` and returns the best state seen.
    fn iterate(&mut self, steps: u64, initial: S) -> S;

    fn scorer(&self) -> &dyn Scorer<S>;
}
