//! Persistent schedule.
//!
//! A [`Schedule`] is an immutable value built from two persistent maps:
//! - a per-room index `room → (start slot → section)`, and
//! - a section index `section → StartAssignment`.
//!
//! Only start periods are stored. Which section is *present* in a room at
//! a given period is derived: the nearest start at or before the period in
//! the same block, provided its run reaches that far. That no two runs
//! overlap is guaranteed by the conflict rules, not by the maps.
//!
//! Every update returns a new schedule sharing all untouched structure with
//! its predecessor, so schedules are cheap to clone and safe to hand to
//! other threads.
//!
//! # Reference
//! Okasaki (1998), "Purely Functional Data Structures", Ch. 2

use log::debug;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use super::{
    ClassPeriodId, PeriodSlot, PresentAssignment, ProgramGraph, RoomId, SectionId,
    SerialAssignment, StartAssignment,
};
use crate::error::ScheduleError;
use crate::logic::{ScheduleLogic, ScheduleValidator};
use crate::persistent::PersistentMap;

type RoomIndex = PersistentMap<RoomId, PersistentMap<PeriodSlot, SectionId>>;

/// An immutable room/period assignment of sections.
#[derive(Clone)]
pub struct Schedule {
    program: Arc<ProgramGraph>,
    logic: Arc<ScheduleLogic>,
    rooms: RoomIndex,
    sections: PersistentMap<SectionId, StartAssignment>,
}

impl Schedule {
    /// An empty schedule with one empty period map per room.
    pub fn empty(program: Arc<ProgramGraph>, logic: Arc<ScheduleLogic>) -> Self {
        let rooms = program
            .rooms()
            .iter()
            .map(|r| (r.id, PersistentMap::new()))
            .collect();
        Self {
            program,
            logic,
            rooms,
            sections: PersistentMap::new(),
        }
    }

    pub fn program(&self) -> &Arc<ProgramGraph> {
        &self.program
    }

    pub fn logic(&self) -> &Arc<ScheduleLogic> {
        &self.logic
    }

    // ======================== Queries ========================

    /// The section starting at `period` in `room`.
    pub fn starting_at(&self, period: ClassPeriodId, room: RoomId) -> Option<StartAssignment> {
        self.starting_at_slot(self.program.slot_of(period), room)
    }

    pub fn starting_at_slot(&self, slot: PeriodSlot, room: RoomId) -> Option<StartAssignment> {
        let section = self.rooms.get(&room)?.get(&slot)?;
        self.sections.get(section).copied()
    }

    /// The nearest start at or before `period` in `room`, within the same block.
    pub fn starting_before(&self, room: RoomId, period: ClassPeriodId) -> Option<StartAssignment> {
        self.starting_before_slot(room, self.program.slot_of(period))
    }

    pub fn starting_before_slot(&self, room: RoomId, slot: PeriodSlot) -> Option<StartAssignment> {
        let (start, section) = self.rooms.get(&room)?.floor_entry(&slot)?;
        if start.block != slot.block {
            return None;
        }
        self.sections.get(section).copied()
    }

    /// The section in session at `period` in `room`.
    pub fn occurring_at(&self, period: ClassPeriodId, room: RoomId) -> Option<PresentAssignment> {
        self.occurring_at_slot(self.program.slot_of(period), room)
    }

    pub fn occurring_at_slot(&self, slot: PeriodSlot, room: RoomId) -> Option<PresentAssignment> {
        self.starting_before_slot(room, slot)?
            .present_at(&self.program, slot)
    }

    /// Every section in session at `period`, across all rooms.
    pub fn occurring_at_period(&self, period: ClassPeriodId) -> Vec<PresentAssignment> {
        self.occurring_at_period_slot(self.program.slot_of(period))
    }

    pub fn occurring_at_period_slot(&self, slot: PeriodSlot) -> Vec<PresentAssignment> {
        self.rooms
            .keys()
            .filter_map(|&room| self.occurring_at_slot(slot, room))
            .collect()
    }

    /// Where a section is scheduled, if anywhere.
    #[inline]
    pub fn assignment_for(&self, section: SectionId) -> Option<StartAssignment> {
        self.sections.get(&section).copied()
    }

    /// All start assignments in section order.
    pub fn start_assignments(&self) -> impl Iterator<Item = StartAssignment> + '_ {
        self.sections.values().copied()
    }

    /// Start assignments in a room, in timeline order.
    pub fn assignments_in_room(&self, room: RoomId) -> Vec<StartAssignment> {
        self.rooms
            .get(&room)
            .into_iter()
            .flat_map(|m| m.values())
            .filter_map(|s| self.sections.get(s).copied())
            .collect()
    }

    /// The start assignment at `index` in section order.
    pub fn assignment_at(&self, index: usize) -> Option<StartAssignment> {
        self.sections.get_index(index).map(|(_, a)| *a)
    }

    /// Number of scheduled sections.
    #[inline]
    pub fn assignment_count(&self) -> usize {
        self.sections.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn is_scheduled(&self, section: SectionId) -> bool {
        self.sections.contains_key(&section)
    }

    pub fn scheduled_sections(&self) -> impl Iterator<Item = SectionId> + '_ {
        self.sections.keys().copied()
    }

    /// Sections of the program not placed anywhere, in program order.
    pub fn unscheduled_sections(&self) -> Vec<SectionId> {
        self.program
            .sections()
            .iter()
            .map(|s| s.id)
            .filter(|s| !self.sections.contains_key(s))
            .collect()
    }

    /// Fraction of a room's available periods that are occupied.
    ///
    /// Returns `None` for a room with no available periods.
    pub fn room_utilization(&self, room: RoomId) -> Option<f64> {
        let available = self.program[room].available_periods.len();
        if available == 0 {
            return None;
        }
        let occupied: u32 = self
            .assignments_in_room(room)
            .iter()
            .map(|a| a.length())
            .sum();
        Some(occupied as f64 / available as f64)
    }

    #[cfg(test)]
    pub(crate) fn room_map(&self, room: RoomId) -> Option<&PersistentMap<PeriodSlot, SectionId>> {
        self.rooms.get(&room)
    }

    // ======================== Updates ========================

    /// Runs the conflict rules against `candidate` and each of its periods.
    pub fn validate(&self, candidate: &StartAssignment) -> ScheduleValidator {
        self.logic.validate(self, candidate)
    }

    /// Places `candidate` if no rule objects.
    ///
    /// On failure the returned schedule is this one, unchanged.
    pub fn assign_start(&self, candidate: StartAssignment) -> (ScheduleValidator, Schedule) {
        let validator = self.validate(&candidate);
        if validator.is_valid() {
            (validator, self.with_start(candidate))
        } else {
            (validator, self.clone())
        }
    }

    /// Places `candidate`, evicting every assignment it globally conflicts with.
    ///
    /// # Algorithm
    /// 1. Validate against this schedule; if any local conflict, reject.
    /// 2. Union the conflicting assignments of every global conflict.
    /// 3. Remove each of them once.
    /// 4. `assign_start` on the result, honoring its outcome.
    ///
    /// Conflicts are computed once, against the schedule before eviction.
    /// If the final placement still fails, this schedule is returned
    /// unchanged alongside the final validator.
    pub fn force_assign_start(&self, candidate: StartAssignment) -> (ScheduleValidator, Schedule) {
        let validator = self.validate(&candidate);
        if !validator.is_locally_valid() {
            return (validator, self.clone());
        }
        let evicted = validator.conflicting_starts();
        let cleared = evicted
            .iter()
            .fold(self.clone(), |schedule, start| schedule.without(start));
        if !evicted.is_empty() {
            debug!("placing {candidate} evicts {} assignment(s)", evicted.len());
        }
        let (validator, placed) = cleared.assign_start(candidate);
        if validator.is_valid() {
            (validator, placed)
        } else {
            debug!("forced placement of {candidate} still conflicts: {validator}");
            (validator, self.clone())
        }
    }

    /// Removes the section starting at `period` in `room`, if any.
    pub fn remove_starting_at(
        &self,
        period: ClassPeriodId,
        room: RoomId,
    ) -> (Option<StartAssignment>, Schedule) {
        match self.starting_at(period, room) {
            Some(start) => (Some(start), self.without(&start)),
            None => (None, self.clone()),
        }
    }

    /// Unschedules a section wherever it is.
    pub fn remove_section(&self, section: SectionId) -> (Option<StartAssignment>, Schedule) {
        match self.assignment_for(section) {
            Some(start) => (Some(start), self.without(&start)),
            None => (None, self.clone()),
        }
    }

    /// Rebuilds this schedule from empty, one `assign_start` at a time in
    /// timeline order, and reports whether every placement succeeds.
    ///
    /// A global consistency check; not meant for the optimizer's hot path.
    pub fn is_completely_valid(&self) -> bool {
        let starts = placement_order(&self.logic, self.start_assignments().map(|a| (false, a)));
        let mut rebuilt = Schedule::empty(self.program.clone(), self.logic.clone());
        for start in starts {
            let (validator, next) = rebuilt.assign_start(start);
            if !validator.is_valid() {
                debug!("schedule is inconsistent at {start}: {validator}");
                return false;
            }
            rebuilt = next;
        }
        true
    }

    /// Serializes to `(section, room, period)` triples in section order.
    pub fn to_assignments(&self) -> Vec<SerialAssignment> {
        self.start_assignments()
            .map(|a| a.to_serial(self.logic.is_locked(&a)))
            .collect()
    }

    fn with_start(&self, start: StartAssignment) -> Schedule {
        let room_map = self
            .rooms
            .get(&start.room())
            .cloned()
            .unwrap_or_default()
            .insert(start.slot(), start.section());
        Schedule {
            program: self.program.clone(),
            logic: self.logic.clone(),
            rooms: self.rooms.insert(start.room(), room_map),
            sections: self.sections.insert(start.section(), start),
        }
    }

    fn without(&self, start: &StartAssignment) -> Schedule {
        let rooms = match self.rooms.get(&start.room()) {
            Some(room_map) => self
                .rooms
                .insert(start.room(), room_map.remove(&start.slot())),
            None => self.rooms.clone(),
        };
        Schedule {
            program: self.program.clone(),
            logic: self.logic.clone(),
            rooms,
            sections: self.sections.remove(&start.section()),
        }
    }
}

impl fmt::Debug for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schedule")
            .field("program", &self.program.name())
            .field("assignments", &self.sections.values().collect::<Vec<_>>())
            .finish()
    }
}

/// Creates schedules bound to one program graph and rule chain.
#[derive(Debug, Clone)]
pub struct ScheduleFactory {
    program: Arc<ProgramGraph>,
    logic: Arc<ScheduleLogic>,
}

impl ScheduleFactory {
    pub fn new(program: Arc<ProgramGraph>, logic: Arc<ScheduleLogic>) -> Self {
        Self { program, logic }
    }

    pub fn program(&self) -> &Arc<ProgramGraph> {
        &self.program
    }

    /// A schedule with nothing placed.
    pub fn empty(&self) -> Schedule {
        Schedule::empty(self.program.clone(), self.logic.clone())
    }

    /// Rebuilds a schedule from serialized triples.
    ///
    /// Triples are applied in timeline order through `assign_start`.
    ///
    /// # Errors
    /// The first triple that names an unknown entity, does not fit its
    /// block, or conflicts with the triples placed before it.
    pub fn from_assignments(
        &self,
        assignments: &[SerialAssignment],
    ) -> Result<Schedule, ScheduleError> {
        let resolved = assignments
            .iter()
            .map(|a| Ok((a.locked, a.resolve(&self.program)?)))
            .collect::<Result<Vec<_>, ScheduleError>>()?;
        let starts = placement_order(&self.logic, resolved);

        let mut schedule = self.empty();
        for start in starts {
            let (validator, next) = schedule.assign_start(start);
            if !validator.is_valid() {
                return Err(ScheduleError::Conflict {
                    section: start.section(),
                    period: start.period(),
                    reason: validator.to_string(),
                });
            }
            schedule = next;
        }
        Ok(schedule)
    }

    /// Like [`from_assignments`](Self::from_assignments), but skips and logs
    /// triples that cannot be placed instead of failing.
    pub fn from_assignments_lenient(&self, assignments: &[SerialAssignment]) -> Schedule {
        let mut resolved = Vec::with_capacity(assignments.len());
        for serial in assignments {
            match serial.resolve(&self.program) {
                Ok(start) => resolved.push((serial.locked, start)),
                Err(err) => log::warn!("skipping initial assignment: {err}"),
            }
        }
        placement_order(&self.logic, resolved)
            .into_iter().fold(self.empty(), |schedule, start| {
            let (validator, next) = schedule.assign_start(start);
            if !validator.is_valid() {
                log::warn!("skipping initial assignment {start}: {validator}");
            }
            next
        })
    }
}

/// Locked placements first, then the rest, each group in start order. A
/// start is locked when flagged so or when the logic pins it.
fn placement_order(
    logic: &ScheduleLogic,
    starts: impl IntoIterator<Item = (bool, StartAssignment)>,
) -> Vec<StartAssignment> {
    let mut keyed: Vec<(bool, StartAssignment)> = starts
        .into_iter()
        .map(|(locked, start)| (!(locked || logic.is_locked(&start)), start))
        .collect();
    keyed.sort_unstable();
    keyed.into_iter().map(|(_, start)| start).collect()
}

/// Asserts the structural invariants of a schedule: both indexes agree and
/// no two runs occupy the same room at the same period.
#[cfg(test)]
pub(crate) fn assert_consistent(schedule: &Schedule) {
    use std::collections::HashSet;

    let mut occupied = HashSet::new();
    let mut indexed = 0;
    for (room, starts) in &schedule.rooms {
        for (slot, section) in starts {
            indexed += 1;
            let start = schedule
                .sections
                .get(section)
                .unwrap_or_else(|| panic!("{section} in room index but not section index"));
            assert_eq!(start.room(), *room);
            assert_eq!(start.slot(), *slot);
            for offset in 0..start.length() {
                assert!(
                    occupied.insert((*room, slot.advance(offset))),
                    "{room} double-booked at {}",
                    slot.advance(offset)
                );
            }
        }
    }
    assert_eq!(indexed, schedule.sections.len());
    let distinct: BTreeSet<_> = schedule.scheduled_sections().collect();
    assert_eq!(distinct.len(), schedule.assignment_count());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::ScheduleLogic;
    use crate::models::fixtures::*;
    use crate::models::{PeriodSpec, ProgramSpec, Room, Section, Teacher, TimeBlockSpec, Course};
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn factory() -> ScheduleFactory {
        ScheduleFactory::new(
            shared_graph(saturday_morning()),
            Arc::new(ScheduleLogic::default_chain()),
        )
    }

    fn start(
        s: &Schedule,
        period: ClassPeriodId,
        room: RoomId,
        section: SectionId,
    ) -> StartAssignment {
        StartAssignment::new(s.program(), period, room, section).unwrap()
    }

    fn place(s: &Schedule, period: ClassPeriodId, room: RoomId, section: SectionId) -> Schedule {
        let (validator, next) = s.assign_start(start(s, period, room, section));
        assert!(validator.is_valid(), "{validator}");
        next
    }

    #[test]
    fn test_empty() {
        let s = factory().empty();
        assert!(s.is_empty());
        assert_eq!(s.unscheduled_sections().len(), 5);
        assert!(s.starting_at(P10AM, HARPER135).is_none());
        assert!(s.occurring_at_period(P10AM).is_empty());
    }

    #[test]
    fn test_queries() {
        let s = place(&factory().empty(), P10AM, HARPER142, ORIGAMI_1);
        let origami = s.assignment_for(ORIGAMI_1).unwrap();

        assert_eq!(s.starting_at(P10AM, HARPER142), Some(origami));
        assert_eq!(s.starting_at(P11AM, HARPER142), None);
        assert_eq!(s.starting_before(HARPER142, P11AM), Some(origami));
        assert_eq!(s.occurring_at(P11AM, HARPER142).map(|p| p.offset()), Some(1));
        assert!(s.occurring_at(P12PM, HARPER142).is_none());
        assert_eq!(s.occurring_at_period(P11AM).len(), 1);
        assert_eq!(s.assignments_in_room(HARPER142), vec![origami]);
        assert_eq!(s.assignment_count(), 1);
        assert!((s.room_utilization(HARPER142).unwrap() - 1.0).abs() < 1e-10);
        assert!(!s.unscheduled_sections().contains(&ORIGAMI_1));
    }

    #[test]
    fn test_teacher_conflict_rejected() {
        // Carol teaches both Science and Math
        let s = place(&factory().empty(), P10AM, HARPER142, SCIENCE_1);
        let (validator, after) = s.assign_start(start(&s, P10AM, HARPER141, MATH_1));
        assert!(!validator.is_valid());
        assert!(validator.is_locally_valid());
        assert!(after.assignment_for(MATH_1).is_none());
        assert_eq!(after.assignment_count(), 1);
    }

    #[test]
    fn test_room_conflict_rejected_both_orders() {
        let s = place(&factory().empty(), P10AM, HARPER142, ORIGAMI_1);
        let (validator, _) = s.assign_start(start(&s, P11AM, HARPER142, MATH_1));
        assert!(!validator.is_valid());

        let s = place(&factory().empty(), P11AM, HARPER142, MATH_1);
        let (validator, _) = s.assign_start(start(&s, P10AM, HARPER142, ORIGAMI_1));
        assert!(!validator.is_valid());
    }

    #[test]
    fn test_local_rejection_unavailable_teacher() {
        // two periods, one room, one teacher free only in the first
        let spec = ProgramSpec::new("tiny")
            .with_time_block(
                TimeBlockSpec::new(1, "Block")
                    .with_period(PeriodSpec::new(0, "P0"))
                    .with_period(PeriodSpec::new(1, "P1")),
            )
            .with_teacher(Teacher::new(1, "T").with_periods([ClassPeriodId(0)]))
            .with_room(Room::new(1, "R", 10).with_periods([ClassPeriodId(0), ClassPeriodId(1)]))
            .with_course(
                Course::new(1, "C")
                    .with_size(5, 10)
                    .with_teacher(crate::models::TeacherId(1)),
            )
            .with_section(Section::new(1, 1, 1));
        let f = ScheduleFactory::new(shared_graph(spec), Arc::new(ScheduleLogic::default_chain()));
        let s = f.empty();

        let late = start(&s, ClassPeriodId(1), RoomId(1), SectionId(1));
        let (validator, unchanged) = s.assign_start(late);
        assert!(!validator.is_locally_valid());
        assert!(unchanged.is_empty());

        let early = start(&s, ClassPeriodId(0), RoomId(1), SectionId(1));
        let (validator, placed) = s.assign_start(early);
        assert!(validator.is_valid());
        assert_eq!(placed.assignment_for(SectionId(1)), Some(early));
    }

    #[test]
    fn test_force_evicts_teacher_conflict() {
        let s = place(&factory().empty(), P10AM, HARPER141, MATH_1);
        let (validator, after) = s.force_assign_start(start(&s, P10AM, HARPER142, SCIENCE_1));
        assert!(validator.is_valid());
        assert!(after.assignment_for(MATH_1).is_none());
        assert!(after.assignment_for(SCIENCE_1).is_some());
        assert!(after.starting_at(P10AM, HARPER141).is_none());
        // the original is untouched
        assert!(s.assignment_for(MATH_1).is_some());
    }

    #[test]
    fn test_force_removes_exactly_the_conflicts() {
        let s = factory().empty();
        let s = place(&s, P10AM, HARPER141, MATH_1);
        let s = place(&s, P10AM, HARPER142, ORIGAMI_1);
        let s = place(&s, P11AM, HARPER130, PIRATES_1);
        let s = place(&s, P10AM, HARPER135, ZOMBIES_1);

        // Science at Harper142 10AM clashes with Math (Carol) and Origami (room)
        let (validator, after) = s.force_assign_start(start(&s, P10AM, HARPER142, SCIENCE_1));
        assert!(validator.is_valid());

        let evicted: BTreeSet<_> = s
            .scheduled_sections()
            .filter(|sec| !after.is_scheduled(*sec))
            .collect();
        assert_eq!(evicted, [MATH_1, ORIGAMI_1].into_iter().collect());
        assert_eq!(after.assignment_for(PIRATES_1), s.assignment_for(PIRATES_1));
        assert_eq!(after.assignment_for(ZOMBIES_1), s.assignment_for(ZOMBIES_1));
        // untouched rooms share structure with the old schedule
        assert!(after.room_map(HARPER130).unwrap().ptr_eq(s.room_map(HARPER130).unwrap()));
        assert!(after.room_map(HARPER135).unwrap().ptr_eq(s.room_map(HARPER135).unwrap()));
        assert_consistent(&after);
    }

    #[test]
    fn test_force_rejects_local_conflict() {
        let s = place(&factory().empty(), P11AM, HARPER130, PIRATES_1);
        // Bob is only free at 11AM
        let (validator, after) = s.force_assign_start(start(&s, P12PM, HARPER130, PIRATES_1));
        assert!(!validator.is_locally_valid());
        assert_eq!(after.assignment_for(PIRATES_1), s.assignment_for(PIRATES_1));
    }

    #[test]
    fn test_force_moves_duplicate_section() {
        let s = place(&factory().empty(), P10AM, HARPER141, MATH_1);
        let (validator, after) = s.force_assign_start(start(&s, P11AM, HARPER135, MATH_1));
        assert!(validator.is_valid());
        assert_eq!(after.assignment_for(MATH_1).map(|a| a.period()), Some(P11AM));
        assert_eq!(after.assignment_count(), 1);
        assert_consistent(&after);
    }

    #[test]
    fn test_remove_starting_at() {
        let s = place(&factory().empty(), P10AM, HARPER142, ORIGAMI_1);
        let (removed, after) = s.remove_starting_at(P10AM, HARPER142);
        assert_eq!(removed.map(|a| a.section()), Some(ORIGAMI_1));
        assert!(after.is_empty());
        assert!(after.occurring_at(P11AM, HARPER142).is_none());

        let (removed, same) = s.remove_starting_at(P11AM, HARPER142);
        assert!(removed.is_none());
        assert_eq!(same.assignment_count(), 1);
    }

    #[test]
    fn test_random_operations_stay_consistent() {
        let f = factory();
        let program = f.program().clone();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut s = f.empty();
        for _ in 0..300 {
            let section = program.sections()[rng.random_range(0..program.sections().len())].id;
            let room = program.rooms()[rng.random_range(0..program.rooms().len())].id;
            let period = program.periods()[rng.random_range(0..program.periods().len())].id;
            let Ok(candidate) = StartAssignment::new(&program, period, room, section) else {
                continue;
            };
            s = match rng.random_range(0..3) {
                0 => s.assign_start(candidate).1,
                1 => s.force_assign_start(candidate).1,
                _ => s.remove_starting_at(period, room).1,
            };
            assert_consistent(&s);
        }
        assert!(s.is_completely_valid());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let f = factory();
        let s = place(&f.empty(), P10AM, HARPER142, ORIGAMI_1);
        let s = place(&s, P11AM, HARPER130, PIRATES_1);
        let s = place(&s, P10AM, HARPER135, ZOMBIES_1);

        let triples = s.to_assignments();
        let json = serde_json::to_string(&triples).unwrap();
        let parsed: Vec<SerialAssignment> = serde_json::from_str(&json).unwrap();
        let back = f.from_assignments(&parsed).unwrap();

        let triples = |s: &Schedule| -> BTreeSet<_> {
            s.to_assignments()
                .into_iter()
                .map(|t| (t.section, t.room, t.period))
                .collect()
        };
        assert_eq!(triples(&s), triples(&back));
    }

    #[test]
    fn test_from_assignments_rejects_conflict() {
        let f = factory();
        let triples = [
            SerialAssignment::new(ORIGAMI_1, HARPER142, P10AM),
            SerialAssignment::new(MATH_1, HARPER142, P11AM),
        ];
        assert!(matches!(
            f.from_assignments(&triples),
            Err(ScheduleError::Conflict { section: MATH_1, .. })
        ));
        // lenient loading keeps what fits
        let s = f.from_assignments_lenient(&triples);
        assert_eq!(s.assignment_count(), 1);
    }

    #[test]
    fn test_from_assignments_places_locked_first() {
        // Math in Harper141 sorts ahead of Science in Harper142, and both
        // need Carol at 10AM
        let f = factory();
        let triples = [
            SerialAssignment::new(MATH_1, HARPER141, P10AM),
            SerialAssignment::new(SCIENCE_1, HARPER142, P10AM).locked(),
        ];
        assert!(matches!(
            f.from_assignments(&triples),
            Err(ScheduleError::Conflict { section: MATH_1, .. })
        ));
        let s = f.from_assignments_lenient(&triples);
        assert_eq!(s.assignment_count(), 1);
        let science = s.assignment_for(SCIENCE_1).unwrap();
        assert_eq!((science.room(), science.period()), (HARPER142, P10AM));
        assert!(s.assignment_for(MATH_1).is_none());
    }

    #[test]
    fn test_from_assignments_unknown_entity() {
        let f = factory();
        let triples = [SerialAssignment::new(SectionId(999), HARPER142, P10AM)];
        assert!(matches!(
            f.from_assignments(&triples),
            Err(ScheduleError::UnknownEntity { .. })
        ));
    }
}
