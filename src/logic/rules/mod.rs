//! Built-in conflict rules.
//!
//! # Categories
//!
//! - **Double booking** (global): DUPLICATE_SECTIONS, TEACHER_CONFLICT,
//!   ROOM_CONFLICT
//! - **Fit** ([`capacity`]): LOCAL_CONFLICT, ROOM_PROPERTIES, RESOURCES,
//!   TEACHER_GROUP_CAP
//! - **Timing** ([`timing`]): PREREQUISITES, GRADE_RANGE, LUNCH
//! - **Pinning**: LOCKED

pub mod capacity;
pub mod timing;

pub use capacity::{LocalConflict, Resources, RoomProperties, TeacherGroupCap};
pub use timing::{GradeRange, Lunch, Prerequisites};

use super::{LockedPlacements, ScheduleRule, ScheduleValidator};
use crate::models::{PresentAssignment, Schedule, StartAssignment};

/// Whether two sections share at least one teacher.
pub(crate) fn share_teacher(schedule: &Schedule, a: &StartAssignment, b: &StartAssignment) -> bool {
    let program = schedule.program();
    let theirs = program.teachers_for(b.section());
    program
        .teachers_for(a.section())
        .iter()
        .any(|t| theirs.contains(t))
}

/// A section may be scheduled once.
#[derive(Debug, Clone, Copy)]
pub struct DuplicateSections;

impl ScheduleRule for DuplicateSections {
    fn name(&self) -> &'static str {
        "DUPLICATE_SECTIONS"
    }

    fn validate_start(
        &self,
        validator: &mut ScheduleValidator,
        schedule: &Schedule,
        candidate: &StartAssignment,
    ) {
        let existing = schedule.assignment_for(candidate.section());
        validator.validate_global(*candidate, existing, || {
            format!("{} is already scheduled", candidate.section())
        });
    }
}

/// A teacher teaches one section at a time.
#[derive(Debug, Clone, Copy)]
pub struct TeacherConflict;

impl ScheduleRule for TeacherConflict {
    fn name(&self) -> &'static str {
        "TEACHER_CONFLICT"
    }

    fn validate_present(
        &self,
        validator: &mut ScheduleValidator,
        schedule: &Schedule,
        candidate: &PresentAssignment,
    ) {
        let clashes = schedule
            .occurring_at_period_slot(candidate.slot())
            .into_iter()
            .filter(|o| o.section() != candidate.section())
            .filter(|o| share_teacher(schedule, &candidate.start(), &o.start()))
            .map(|o| o.start());
        validator.validate_global(*candidate, clashes, || {
            format!("a teacher of {} is busy at {}", candidate.section(), candidate.period())
        });
    }
}

/// A room hosts one section at a time.
#[derive(Debug, Clone, Copy)]
pub struct RoomConflict;

impl ScheduleRule for RoomConflict {
    fn name(&self) -> &'static str {
        "ROOM_CONFLICT"
    }

    fn validate_present(
        &self,
        validator: &mut ScheduleValidator,
        schedule: &Schedule,
        candidate: &PresentAssignment,
    ) {
        let occupant = schedule
            .occurring_at_slot(candidate.slot(), candidate.room())
            .filter(|o| o.section() != candidate.section())
            .map(|o| o.start());
        validator.validate_global(*candidate, occupant, || {
            format!("{} is occupied at {}", candidate.room(), candidate.period())
        });
    }
}

/// Pinned placements stay put and keep their room and teachers to themselves.
#[derive(Debug, Clone)]
pub struct Locked {
    locked: LockedPlacements,
}

impl Locked {
    pub fn new(locked: LockedPlacements) -> Self {
        Self { locked }
    }
}

impl ScheduleRule for Locked {
    fn name(&self) -> &'static str {
        "LOCKED"
    }

    fn validate_start(
        &self,
        validator: &mut ScheduleValidator,
        _schedule: &Schedule,
        candidate: &StartAssignment,
    ) {
        if let Some(pinned) = self.locked.get(candidate.section()) {
            validator.validate_local(
                pinned.room == candidate.room() && pinned.period == candidate.period(),
                *candidate,
                || format!("{} is locked to {} at {}", pinned.section, pinned.room, pinned.period),
            );
        }
    }

    fn validate_present(
        &self,
        validator: &mut ScheduleValidator,
        schedule: &Schedule,
        candidate: &PresentAssignment,
    ) {
        if self.locked.is_empty() {
            return;
        }
        for other in schedule.occurring_at_period_slot(candidate.slot()) {
            let start = other.start();
            if other.section() == candidate.section() || !self.locked.contains(&start) {
                continue;
            }
            let clash = start.room() == candidate.room()
                || share_teacher(schedule, &candidate.start(), &start);
            validator.validate_local(!clash, *candidate, || {
                format!("overlaps locked {start}")
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogicSpec;
    use crate::logic::ScheduleLogic;
    use crate::models::fixtures::*;
    use crate::models::{ScheduleFactory, SerialAssignment};
    use std::sync::Arc;

    fn factory(logic: ScheduleLogic) -> ScheduleFactory {
        ScheduleFactory::new(shared_graph(saturday_morning()), Arc::new(logic))
    }

    #[test]
    fn test_duplicate_section() {
        let f = factory(ScheduleLogic::new().with_rule(DuplicateSections));
        let s = f.empty();
        let first = StartAssignment::new(s.program(), P10AM, HARPER141, MATH_1).unwrap();
        let again = StartAssignment::new(s.program(), P12PM, HARPER135, MATH_1).unwrap();
        let (_, s) = s.assign_start(first);
        let v = s.validate(&again);
        assert!(v.is_locally_valid());
        assert_eq!(v.conflicting_starts().into_iter().collect::<Vec<_>>(), vec![first]);
    }

    #[test]
    fn test_teacher_conflict_names_clash() {
        let f = factory(ScheduleLogic::new().with_rule(TeacherConflict));
        let s = f.empty();
        let science = StartAssignment::new(s.program(), P10AM, HARPER142, SCIENCE_1).unwrap();
        let math = StartAssignment::new(s.program(), P10AM, HARPER141, MATH_1).unwrap();
        let origami = StartAssignment::new(s.program(), P10AM, HARPER135, ORIGAMI_1).unwrap();
        let (_, s) = s.assign_start(science);
        assert!(s.validate(&origami).is_valid());
        let v = s.validate(&math);
        assert_eq!(v.global_conflicts().len(), 1);
        assert!(v.conflicting_starts().contains(&science));
    }

    #[test]
    fn test_room_conflict_second_period() {
        let f = factory(ScheduleLogic::new().with_rule(RoomConflict));
        let s = f.empty();
        let math = StartAssignment::new(s.program(), P11AM, HARPER135, MATH_1).unwrap();
        let zombies = StartAssignment::new(s.program(), P10AM, HARPER135, ZOMBIES_1).unwrap();
        let (_, s) = s.assign_start(math);
        // Zombies starts earlier but runs into Math's period
        let v = s.validate(&zombies);
        assert_eq!(v.conflicting_starts().into_iter().collect::<Vec<_>>(), vec![math]);
    }

    #[test]
    fn test_locked_pins_position() {
        let spec = LogicSpec {
            rules: vec![crate::logic::RuleKind::Locked],
            locked: vec![SerialAssignment::new(MATH_1, HARPER141, P10AM).locked()],
            ..LogicSpec::default()
        };
        let f = factory(ScheduleLogic::from_spec(&spec));
        let s = f.empty();
        let elsewhere = StartAssignment::new(s.program(), P12PM, HARPER141, MATH_1).unwrap();
        assert!(!s.validate(&elsewhere).is_locally_valid());

        let pinned = StartAssignment::new(s.program(), P10AM, HARPER141, MATH_1).unwrap();
        let (v, s) = s.assign_start(pinned);
        assert!(v.is_valid());

        // Science shares Carol with the locked Math
        let science = StartAssignment::new(s.program(), P10AM, HARPER142, SCIENCE_1).unwrap();
        let v = s.validate(&science);
        assert!(!v.is_locally_valid());
        // force cannot evict a locked placement
        let (_, after) = s.force_assign_start(science);
        assert_eq!(after.assignment_for(MATH_1), Some(pinned));

        // unrelated teacher in another room is fine
        let origami = StartAssignment::new(s.program(), P10AM, HARPER142, ORIGAMI_1).unwrap();
        assert!(s.validate(&origami).is_valid());
    }
}
