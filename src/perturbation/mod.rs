//! Schedule perturbers.
//!
//! Runtime-selectable neighbor moves via [`PerturberKind`], plus combinators
//! to chain them ([`SequencedPerturber`]), rescale their temperature
//! ([`ScaledPerturber`]) and retry them until a condition holds
//! ([`RetryingPerturber`]).
//!
//! # Moves
//!
//! | Kind | Effect | Sections touched |
//! |------|--------|------------------|
//! | GREEDY | place unscheduled sections where valid | `max(1, ⌊n·t⌋)` |
//! | DESTRUCTIVE | force unscheduled sections in, evicting conflicts | `max(1, ⌊n·t⌋)` |
//! | DESTRUCTIVE_BY_ROOM | force unscheduled sections into free room slots | `max(1, ⌊n·t⌋)` |
//! | SWAPPING | exchange the sections of two placements | `⌊50·t⌋ + 1` swaps |
//!
//! `n` is the number of unscheduled sections and `t` the temperature.
//!
//! # Usage
//!
//! ```
//! use u_splash::perturbation::{PerturberComponent, PerturberKind};
//!
//! let c: PerturberComponent = serde_json::from_str(r#"{"name": "SWAPPING"}"#).unwrap();
//! assert_eq!(c.name, PerturberKind::Swapping);
//! assert_eq!(c.temperature_factor, 1.0);
//! ```

use log::debug;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::models::{
    ClassPeriodId, PeriodOwner, ProgramGraph, RoomId, Schedule, SectionId, StartAssignment,
};
use crate::optimizer::Perturber;

/// Named schedule moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PerturberKind {
    Greedy,
    Destructive,
    DestructiveByRoom,
    Swapping,
}

impl Perturber<Schedule> for PerturberKind {
    fn perturb(&self, schedule: &Schedule, temperature: f64, rng: &mut dyn RngCore) -> Schedule {
        match self {
            PerturberKind::Greedy => place_unscheduled(schedule, temperature, rng, false),
            PerturberKind::Destructive => place_unscheduled(schedule, temperature, rng, true),
            PerturberKind::DestructiveByRoom => fill_free_rooms(schedule, temperature, rng),
            PerturberKind::Swapping => swap_sections(schedule, temperature, rng),
        }
    }
}

fn one() -> f64 {
    1.0
}

/// One configured move with its temperature factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerturberComponent {
    pub name: PerturberKind,
    #[serde(default = "one")]
    pub temperature_factor: f64,
}

impl PerturberComponent {
    pub fn new(name: PerturberKind) -> Self {
        Self {
            name,
            temperature_factor: 1.0,
        }
    }

    pub fn with_temperature_factor(mut self, factor: f64) -> Self {
        self.temperature_factor = factor;
        self
    }

    /// The move, rescaled unless its factor is 1.
    pub fn build(&self) -> Arc<dyn Perturber<Schedule>> {
        if self.temperature_factor == 1.0 {
            Arc::new(self.name)
        } else {
            Arc::new(ScaledPerturber::<Schedule>::new(Arc::new(self.name), self.temperature_factor))
        }
    }
}

/// How many of `n` items a move touches at temperature `t`.
fn batch_size(n: usize, temperature: f64) -> usize {
    ((n as f64 * temperature.clamp(0.0, 1.0)).floor() as usize).clamp(1, n.max(1))
}

/// A random start for `section` in a compatible room at a period its
/// teachers can make, if one fits.
fn random_start(
    program: &ProgramGraph,
    section: SectionId,
    rng: &mut dyn RngCore,
) -> Option<StartAssignment> {
    let room = *program.compatible_rooms(section).choose(rng)?;
    let periods = program.compatible_periods(section);
    if periods.is_empty() {
        return None;
    }
    let period = *periods.iter().nth(rng.random_range(0..periods.len()))?;
    StartAssignment::new(program, period, room, section).ok()
}

fn place_unscheduled(
    schedule: &Schedule,
    temperature: f64,
    rng: &mut dyn RngCore,
    force: bool,
) -> Schedule {
    let mut unscheduled = schedule.unscheduled_sections();
    if unscheduled.is_empty() {
        return schedule.clone();
    }
    unscheduled.shuffle(rng);
    let count = batch_size(unscheduled.len(), temperature);

    let program = schedule.program().clone();
    let mut current = schedule.clone();
    for &section in unscheduled.iter().take(count) {
        let Some(candidate) = random_start(&program, section, rng) else {
            debug!("no placement drawn for {section}");
            continue;
        };
        let (validator, next) = if force {
            current.force_assign_start(candidate)
        } else {
            current.assign_start(candidate)
        };
        if !validator.is_valid() {
            debug!("skipped {candidate}: {validator}");
        }
        current = next;
    }
    current
}

fn fill_free_rooms(schedule: &Schedule, temperature: f64, rng: &mut dyn RngCore) -> Schedule {
    let mut unscheduled = schedule.unscheduled_sections();
    if unscheduled.is_empty() {
        return schedule.clone();
    }
    let program = schedule.program().clone();
    let mut free: Vec<(RoomId, ClassPeriodId)> = program
        .rooms()
        .iter()
        .flat_map(|r| {
            program
                .available_periods(PeriodOwner::Room(r.id))
                .iter()
                .map(move |&p| (r.id, p))
        })
        .filter(|&(room, period)| schedule.occurring_at(period, room).is_none())
        .collect();
    unscheduled.shuffle(rng);
    free.shuffle(rng);
    let count = batch_size(unscheduled.len(), temperature);

    let mut current = schedule.clone();
    for (&section, &(room, period)) in unscheduled.iter().zip(free.iter()).take(count) {
        let Ok(candidate) = StartAssignment::new(&program, period, room, section) else {
            continue;
        };
        let (validator, next) = current.force_assign_start(candidate);
        if !validator.is_valid() {
            debug!("skipped {candidate}: {validator}");
        }
        current = next;
    }
    current
}

fn swap_sections(schedule: &Schedule, temperature: f64, rng: &mut dyn RngCore) -> Schedule {
    let swaps = (50.0 * temperature.max(0.0)).floor() as usize + 1;
    let program = schedule.program().clone();
    let mut current = schedule.clone();
    for _ in 0..swaps {
        let n = current.assignment_count();
        if n < 2 {
            break;
        }
        let (Some(a), Some(b)) = (
            current.assignment_at(rng.random_range(0..n)),
            current.assignment_at(rng.random_range(0..n)),
        ) else {
            continue;
        };
        if a.section() == b.section() {
            continue;
        }
        let (Ok(a_new), Ok(b_new)) = (
            StartAssignment::new(&program, a.period(), a.room(), b.section()),
            StartAssignment::new(&program, b.period(), b.room(), a.section()),
        ) else {
            continue;
        };
        let (_, cleared) = current.remove_section(a.section());
        let (_, cleared) = cleared.remove_section(b.section());
        let (first, half) = cleared.assign_start(a_new);
        if !first.is_valid() {
            continue;
        }
        let (second, swapped) = half.assign_start(b_new);
        if second.is_valid() {
            current = swapped;
        }
    }
    current
}

/// Applies each perturber in turn to the previous one's output.
#[derive(Clone)]
pub struct SequencedPerturber<S> {
    perturbers: Vec<Arc<dyn Perturber<S>>>,
}

impl<S> SequencedPerturber<S> {
    pub fn new(perturbers: Vec<Arc<dyn Perturber<S>>>) -> Self {
        Self { perturbers }
    }

    pub fn len(&self) -> usize {
        self.perturbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.perturbers.is_empty()
    }
}

impl<S: Clone> Perturber<S> for SequencedPerturber<S> {
    fn perturb(&self, state: &S, temperature: f64, rng: &mut dyn RngCore) -> S {
        self.perturbers
            .iter()
            .fold(state.clone(), |s, p| p.perturb(&s, temperature, rng))
    }
}

/// Multiplies the temperature before delegating.
#[derive(Clone)]
pub struct ScaledPerturber<S> {
    inner: Arc<dyn Perturber<S>>,
    factor: f64,
}

impl<S> ScaledPerturber<S> {
    pub fn new(inner: Arc<dyn Perturber<S>>, factor: f64) -> Self {
        Self { inner, factor }
    }
}

impl<S> Perturber<S> for ScaledPerturber<S> {
    fn perturb(&self, state: &S, temperature: f64, rng: &mut dyn RngCore) -> S {
        self.inner.perturb(state, temperature * self.factor, rng)
    }
}

/// Perturbs until `accept(old, new)` holds, up to `attempts` tries.
///
/// Returns the original state when no attempt passes.
pub struct RetryingPerturber<S, P, F> {
    inner: P,
    accept: F,
    attempts: usize,
    _state: PhantomData<fn(&S) -> S>,
}

impl<S, P, F> RetryingPerturber<S, P, F>
where
    P: Perturber<S>,
    F: Fn(&S, &S) -> bool + Send + Sync,
{
    pub fn new(inner: P, accept: F, attempts: usize) -> Self {
        Self {
            inner,
            accept,
            attempts,
            _state: PhantomData,
        }
    }
}

impl<S, P, F> Perturber<S> for RetryingPerturber<S, P, F>
where
    S: Clone,
    P: Perturber<S>,
    F: Fn(&S, &S) -> bool + Send + Sync,
{
    fn perturb(&self, state: &S, temperature: f64, rng: &mut dyn RngCore) -> S {
        for _ in 0..self.attempts {
            let candidate = self.inner.perturb(state, temperature, rng);
            if (self.accept)(state, &candidate) {
                return candidate;
            }
        }
        state.clone()
    }
}
