//! End-to-end driver.
//!
//! [`SplashScheduler`] wires a program and an [`OptimizerSpec`] into a
//! [`ConcurrentOptimizer`] over [`Schedule`]s and reports the best result.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use u_splash::config::OptimizerSpec;
//! use u_splash::models::{ProgramGraph, ProgramSpec};
//! use u_splash::scheduler::SplashScheduler;
//!
//! # fn main() -> u_splash::Result<()> {
//! let program = Arc::new(ProgramGraph::new(ProgramSpec::from_json("{}")?)?);
//! let spec = OptimizerSpec::from_json(r#"{
//!     "scorers": [{"name": "SECTIONS_SCHEDULED"}],
//!     "perturbers": [{"name": "GREEDY"}, {"name": "DESTRUCTIVE"}]
//! }"#)?;
//! let scheduler = SplashScheduler::new(program, spec);
//! let outcome = scheduler.run(scheduler.initial_schedule(&[])?)?;
//! println!("{} sections at score {}", outcome.assignments.len(), outcome.score);
//! # Ok(())
//! # }
//! ```

use log::info;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::OptimizerSpec;
use crate::error::{Result, ScheduleError};
use crate::logic::ScheduleLogic;
use crate::models::{ProgramGraph, Schedule, ScheduleFactory, SerialAssignment};
use crate::optimizer::{
    Annealer, AnnealerFactory, ConcurrentOptimizer, Optimizer, Perturber, Scorer,
};
use crate::perturbation::SequencedPerturber;
use crate::scoring::{CompositeScorer, ScheduleMetrics};

/// Result of an optimization run.
#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    pub schedule: Schedule,
    pub score: f64,
    /// The schedule as serializable triples, pinned ones marked.
    pub assignments: Vec<SerialAssignment>,
    pub metrics: ScheduleMetrics,
}

/// Splash scheduling driver.
pub struct SplashScheduler {
    spec: OptimizerSpec,
    factory: ScheduleFactory,
}

impl SplashScheduler {
    pub fn new(program: Arc<ProgramGraph>, spec: OptimizerSpec) -> Self {
        let logic = Arc::new(ScheduleLogic::from_spec(&spec.logic));
        Self {
            factory: ScheduleFactory::new(program, logic),
            spec,
        }
    }

    pub fn spec(&self) -> &OptimizerSpec {
        &self.spec
    }

    pub fn factory(&self) -> &ScheduleFactory {
        &self.factory
    }

    /// Applies every locked placement, then `assignments`, to an empty
    /// schedule.
    ///
    /// # Errors
    /// The first triple that cannot be placed.
    pub fn initial_schedule(
        &self,
        assignments: &[SerialAssignment],
    ) -> std::result::Result<Schedule, ScheduleError> {
        let mut all: Vec<SerialAssignment> = self.spec.logic.locked.clone();
        all.extend(
            assignments
                .iter()
                .filter(|a| !all_contains_section(&self.spec.logic.locked, a)),
        );
        self.factory.from_assignments(&all)
    }

    /// Runs `n_iterations` rounds from `initial`.
    ///
    /// # Errors
    /// An invalid configuration, or worker threads that cannot be started.
    pub fn run(&self, initial: Schedule) -> Result<ScheduleOutcome> {
        let (mut optimizer, scorer) = self.optimizer()?;
        let started = Instant::now();
        let best = optimizer.iterate(self.spec.n_iterations, initial);
        info!(
            "optimized in {:?} over {} rounds",
            started.elapsed(),
            optimizer.history().len()
        );
        Ok(self.outcome(best, scorer.as_ref()))
    }

    /// Runs rounds until `duration` has passed.
    pub fn run_for(&self, duration: Duration, initial: Schedule) -> Result<ScheduleOutcome> {
        let (mut optimizer, scorer) = self.optimizer()?;
        let best = optimizer.iterate_for(duration, initial);
        info!("optimized for {duration:?} over {} rounds", optimizer.history().len());
        Ok(self.outcome(best, scorer.as_ref()))
    }

    fn optimizer(&self) -> Result<(ConcurrentOptimizer<Schedule>, Arc<CompositeScorer>)> {
        self.spec.validate()?;
        let scorer = Arc::new(CompositeScorer::new(self.spec.scorers.iter().copied()));
        let perturber: Arc<dyn Perturber<Schedule>> = Arc::new(SequencedPerturber::new(
            self.spec.perturbers.iter().map(|c| c.build()).collect(),
        ));

        let annealer_scorer: Arc<dyn Scorer<Schedule>> = scorer.clone();
        let factory: AnnealerFactory<Schedule> = Arc::new(move |temperature, seed| {
            Annealer::new(
                Arc::clone(&annealer_scorer),
                Arc::clone(&perturber),
                temperature,
                seed,
            )
        });
        let optimizer = ConcurrentOptimizer::new(
            factory,
            scorer.clone(),
            Arc::new(self.spec.primary_temperature),
            Arc::new(self.spec.sub_temperature),
            self.spec.concurrent_config(),
        )?;
        Ok((optimizer, scorer))
    }

    fn outcome(&self, schedule: Schedule, scorer: &CompositeScorer) -> ScheduleOutcome {
        ScheduleOutcome {
            score: scorer.score(&schedule),
            assignments: schedule.to_assignments(),
            metrics: ScheduleMetrics::calculate(&schedule),
            schedule,
        }
    }
}

fn all_contains_section(locked: &[SerialAssignment], a: &SerialAssignment) -> bool {
    locked.iter().any(|l| l.section == a.section)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::logic::RuleKind;
    use crate::models::fixtures::*;
    use crate::perturbation::{PerturberComponent, PerturberKind};
    use crate::scoring::{ScorerComponent, ScorerKind};

    fn spec() -> OptimizerSpec {
        let mut spec = OptimizerSpec {
            scorers: vec![
                ScorerComponent::new(ScorerKind::SectionsScheduled),
                ScorerComponent::new(ScorerKind::BackToBackClasses).with_multiplier(0.1),
            ],
            perturbers: vec![
                PerturberComponent::new(PerturberKind::Greedy),
                PerturberComponent::new(PerturberKind::Destructive).with_temperature_factor(0.5),
                PerturberComponent::new(PerturberKind::Swapping),
            ],
            n_threads: 2,
            steps_per_optimizer_iteration: 200,
            n_iterations: 5,
            seed: Some(3),
            ..OptimizerSpec::default()
        };
        spec.logic.seed = Some(3);
        spec
    }

    #[test]
    fn test_run_finds_four_sections() {
        // Origami needs 10-11 in Harper135 or Harper142; Zombies holds the
        // first all morning and Math needs the second at 11, so at most four
        // sections fit.
        let scheduler = SplashScheduler::new(shared_graph(saturday_morning()), spec());
        let outcome = scheduler.run(scheduler.initial_schedule(&[]).unwrap()).unwrap();
        assert!(outcome.schedule.is_completely_valid());
        assert_eq!(outcome.assignments.len(), outcome.schedule.assignment_count());
        assert!(outcome.metrics.sections_scheduled <= 4);
        assert!(outcome.metrics.sections_scheduled >= 3, "{:?}", outcome.metrics);
        assert!(outcome.score <= 4.0);
    }

    #[test]
    fn test_run_keeps_locked_placement() {
        let mut spec = spec();
        spec.logic.rules = RuleKind::DEFAULT_CHAIN.to_vec();
        spec.logic.rules.push(RuleKind::Locked);
        spec.logic.locked = vec![SerialAssignment::new(ORIGAMI_1, HARPER142, P10AM).locked()];
        let scheduler = SplashScheduler::new(shared_graph(saturday_morning()), spec);

        let initial = scheduler.initial_schedule(&[]).unwrap();
        assert_eq!(initial.assignment_count(), 1);
        let outcome = scheduler.run(initial).unwrap();
        let origami = outcome.schedule.assignment_for(ORIGAMI_1).unwrap();
        assert_eq!((origami.room(), origami.period()), (HARPER142, P10AM));
        assert!(outcome.assignments.iter().any(|a| a.section == ORIGAMI_1 && a.locked));
    }

    #[test]
    fn test_initial_schedule_keeps_locked_over_earlier_triple() {
        let mut spec = spec();
        spec.logic.locked = vec![SerialAssignment::new(SCIENCE_1, HARPER142, P10AM)];
        let scheduler = SplashScheduler::new(shared_graph(saturday_morning()), spec);
        // Math shares Carol and sorts ahead of Science at 10AM
        let err = scheduler
            .initial_schedule(&[SerialAssignment::new(MATH_1, HARPER141, P10AM)])
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Conflict { section: MATH_1, .. }));

        let initial = scheduler.initial_schedule(&[]).unwrap();
        let science = initial.assignment_for(SCIENCE_1).unwrap();
        assert!(initial.logic().is_locked(&science));
    }

    #[test]
    fn test_run_for_is_time_bounded() {
        let mut spec = spec();
        spec.steps_per_optimizer_iteration = 50;
        let scheduler = SplashScheduler::new(shared_graph(saturday_morning()), spec);
        let started = Instant::now();
        let outcome = scheduler
            .run_for(Duration::from_millis(300), scheduler.factory().empty())
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(15));
        assert!(outcome.schedule.is_completely_valid());
        assert!(outcome.metrics.sections_scheduled >= 1);
    }

    #[test]
    fn test_initial_schedule_is_strict() {
        let scheduler = SplashScheduler::new(shared_graph(saturday_morning()), spec());
        let err = scheduler
            .initial_schedule(&[
                SerialAssignment::new(MATH_1, HARPER141, P10AM),
                SerialAssignment::new(SCIENCE_1, HARPER142, P10AM),
            ])
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Conflict { .. }));
    }

    #[test]
    fn test_invalid_spec() {
        let mut spec = spec();
        spec.scorers.clear();
        let scheduler = SplashScheduler::new(shared_graph(saturday_morning()), spec);
        let err = scheduler.run(scheduler.factory().empty()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
