//! Conflict engine.
//!
//! A [`ScheduleLogic`] is an ordered chain of [`ScheduleRule`]s. Every rule
//! inspects a candidate start, then each period of its run, against the
//! current schedule, and reports into one shared [`ScheduleValidator`]:
//!
//! - **local conflicts**: the candidate itself is wrong (room too small,
//!   teacher unavailable, ...). Only a different placement fixes it.
//! - **global conflicts**: named scheduled assignments clash with the
//!   candidate. Evicting them fixes it.
//!
//! Rules are selected by name through the closed [`RuleKind`] registry.
//!
//! # Usage
//!
//! ```
//! use u_splash::logic::{RuleKind, ScheduleLogic};
//! use u_splash::config::LogicSpec;
//!
//! let logic = ScheduleLogic::from_spec(&LogicSpec::default());
//! assert_eq!(logic.rule_names(), RuleKind::DEFAULT_CHAIN.map(|k| k.name()).to_vec());
//! ```

mod validator;
pub mod rules;

pub use validator::{Candidate, GlobalConflict, LocalConflict, ScheduleValidator};

use log::{trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::config::LogicSpec;
use crate::models::{PresentAssignment, Schedule, SectionId, SerialAssignment, StartAssignment};

/// A conflict rule.
///
/// Both hooks default to doing nothing, so a rule implements only the
/// level it cares about.
pub trait ScheduleRule: Send + Sync + Debug {
    /// Rule name as it appears in configuration and conflict reports.
    fn name(&self) -> &'static str;

    /// Checks the candidate's whole run.
    fn validate_start(
        &self,
        _validator: &mut ScheduleValidator,
        _schedule: &Schedule,
        _candidate: &StartAssignment,
    ) {
    }

    /// Checks one period of the candidate's run.
    fn validate_present(
        &self,
        _validator: &mut ScheduleValidator,
        _schedule: &Schedule,
        _candidate: &PresentAssignment,
    ) {
    }
}

/// Registry of conflict rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleKind {
    DuplicateSections,
    TeacherConflict,
    LocalConflict,
    RoomConflict,
    RoomProperties,
    Resources,
    Prerequisites,
    GradeRange,
    TeacherGroupCap,
    Lunch,
    Locked,
}

impl RuleKind {
    /// The chain used when none is configured.
    pub const DEFAULT_CHAIN: [RuleKind; 5] = [
        RuleKind::DuplicateSections,
        RuleKind::TeacherConflict,
        RuleKind::LocalConflict,
        RuleKind::RoomConflict,
        RuleKind::RoomProperties,
    ];

    pub const ALL: [RuleKind; 11] = [
        RuleKind::DuplicateSections,
        RuleKind::TeacherConflict,
        RuleKind::LocalConflict,
        RuleKind::RoomConflict,
        RuleKind::RoomProperties,
        RuleKind::Resources,
        RuleKind::Prerequisites,
        RuleKind::GradeRange,
        RuleKind::TeacherGroupCap,
        RuleKind::Lunch,
        RuleKind::Locked,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RuleKind::DuplicateSections => "DUPLICATE_SECTIONS",
            RuleKind::TeacherConflict => "TEACHER_CONFLICT",
            RuleKind::LocalConflict => "LOCAL_CONFLICT",
            RuleKind::RoomConflict => "ROOM_CONFLICT",
            RuleKind::RoomProperties => "ROOM_PROPERTIES",
            RuleKind::Resources => "RESOURCES",
            RuleKind::Prerequisites => "PREREQUISITES",
            RuleKind::GradeRange => "GRADE_RANGE",
            RuleKind::TeacherGroupCap => "TEACHER_GROUP_CAP",
            RuleKind::Lunch => "LUNCH",
            RuleKind::Locked => "LOCKED",
        }
    }

    /// Constructs the rule. Randomized rules draw from `seed`.
    pub fn build(
        self,
        spec: &LogicSpec,
        locked: &LockedPlacements,
        seed: u64,
    ) -> Arc<dyn ScheduleRule> {
        match self {
            RuleKind::DuplicateSections => Arc::new(rules::DuplicateSections),
            RuleKind::TeacherConflict => Arc::new(rules::TeacherConflict),
            RuleKind::RoomConflict => Arc::new(rules::RoomConflict),
            RuleKind::LocalConflict => Arc::new(rules::LocalConflict::new(
                spec.min_class_cap_ratio,
                spec.max_est_class_size_ratio(),
            )),
            RuleKind::RoomProperties => Arc::new(rules::RoomProperties),
            RuleKind::Resources => Arc::new(rules::Resources::seeded(seed)),
            RuleKind::Prerequisites => Arc::new(rules::Prerequisites),
            RuleKind::GradeRange => Arc::new(rules::GradeRange),
            RuleKind::TeacherGroupCap => Arc::new(rules::TeacherGroupCap::seeded(seed)),
            RuleKind::Lunch => Arc::new(rules::Lunch),
            RuleKind::Locked => Arc::new(rules::Locked::new(locked.clone())),
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Placements pinned by configuration.
#[derive(Debug, Clone, Default)]
pub struct LockedPlacements(Arc<HashMap<SectionId, SerialAssignment>>);

impl LockedPlacements {
    pub fn new(locked: impl IntoIterator<Item = SerialAssignment>) -> Self {
        Self(Arc::new(
            locked.into_iter().map(|a| (a.section, a)).collect(),
        ))
    }

    /// The pinned placement of a section, if it has one.
    pub fn get(&self, section: SectionId) -> Option<&SerialAssignment> {
        self.0.get(&section)
    }

    /// Whether `start` is exactly a pinned placement.
    pub fn contains(&self, start: &StartAssignment) -> bool {
        self.0
            .get(&start.section())
            .is_some_and(|l| l.room == start.room() && l.period == start.period())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SerialAssignment> {
        self.0.values()
    }
}

/// An ordered rule chain sharing one validator per candidate.
#[derive(Debug, Clone, Default)]
pub struct ScheduleLogic {
    rules: Vec<Arc<dyn ScheduleRule>>,
    locked: LockedPlacements,
}

impl ScheduleLogic {
    /// A chain with no rules: every candidate is valid.
    pub fn new() -> Self {
        Self::default()
    }

    /// [`RuleKind::DEFAULT_CHAIN`] with default parameters.
    pub fn default_chain() -> Self {
        Self::from_spec(&LogicSpec::default())
    }

    /// Builds the configured chain in order.
    pub fn from_spec(spec: &LogicSpec) -> Self {
        if spec.min_class_cap_ratio < 1.0 && spec.rules.contains(&RuleKind::LocalConflict) {
            warn!(
                "min_class_cap_ratio {} lets classes outgrow their rooms",
                spec.min_class_cap_ratio
            );
        }
        let locked = LockedPlacements::new(spec.locked.iter().copied());
        let seed = spec.seed.unwrap_or_else(rand::random);
        let rules = spec
            .rules
            .iter()
            .enumerate()
            .map(|(i, kind)| kind.build(spec, &locked, seed.wrapping_add(i as u64)))
            .collect();
        Self { rules, locked }
    }

    /// Appends a rule to the chain.
    pub fn with_rule<R: ScheduleRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn locked(&self) -> &LockedPlacements {
        &self.locked
    }

    /// Whether `start` is a pinned placement.
    pub fn is_locked(&self, start: &StartAssignment) -> bool {
        self.locked.contains(start)
    }

    /// Runs every rule on `candidate`, then on each period of its run.
    ///
    /// A pinned placement is exempt from local conflicts.
    pub fn validate(&self, schedule: &Schedule, candidate: &StartAssignment) -> ScheduleValidator {
        let mut validator = if self.is_locked(candidate) {
            trace!("{candidate} is locked; local checks skipped");
            ScheduleValidator::exempt_from_local(*candidate)
        } else {
            ScheduleValidator::new(*candidate)
        };
        for rule in &self.rules {
            validator.enter_rule(rule.name());
            rule.validate_start(&mut validator, schedule, candidate);
        }
        for present in candidate.present_assignments(schedule.program()) {
            for rule in &self.rules {
                validator.enter_rule(rule.name());
                rule.validate_present(&mut validator, schedule, &present);
            }
        }
        validator
    }
}
