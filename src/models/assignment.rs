//! Start and present assignments.
//!
//! A [`StartAssignment`] binds a section to the room and period where it
//! begins. Each period the section then occupies is a [`PresentAssignment`].
//! Both are small `Copy` values derived against a program graph; neither is
//! owned by the graph.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ClassPeriodId, EntityKind, PeriodSlot, ProgramGraph, RoomId, SectionId};
use crate::error::ScheduleError;

/// A section beginning at a period in a room.
///
/// Invariant: the section's run fits inside the period's time block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StartAssignment {
    slot: PeriodSlot,
    room: RoomId,
    section: SectionId,
    period: ClassPeriodId,
    length: u32,
}

impl StartAssignment {
    /// Creates a start assignment, checking that every id exists and that
    /// the section fits before its block ends.
    pub fn new(
        program: &ProgramGraph,
        period: ClassPeriodId,
        room: RoomId,
        section: SectionId,
    ) -> Result<Self, ScheduleError> {
        let p = program
            .get_period(period)
            .ok_or(ScheduleError::UnknownEntity {
                kind: EntityKind::ClassPeriod,
                id: period.0,
            })?;
        if program.get_room(room).is_none() {
            return Err(ScheduleError::UnknownEntity {
                kind: EntityKind::Room,
                id: room.0,
            });
        }
        let length = program
            .get_section(section)
            .ok_or(ScheduleError::UnknownEntity {
                kind: EntityKind::Section,
                id: section.0,
            })?
            .period_length;
        let block_len = program[p.block].len() as u32;
        if p.index + length > block_len {
            return Err(ScheduleError::DoesNotFit { section, period });
        }
        Ok(Self {
            slot: p.slot(),
            room,
            section,
            period,
            length,
        })
    }

    #[inline]
    pub fn period(&self) -> ClassPeriodId {
        self.period
    }

    #[inline]
    pub fn room(&self) -> RoomId {
        self.room
    }

    #[inline]
    pub fn section(&self) -> SectionId {
        self.section
    }

    /// Timeline position of the first period.
    #[inline]
    pub fn slot(&self) -> PeriodSlot {
        self.slot
    }

    /// Number of periods the section runs for.
    #[inline]
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Timeline position of the last period.
    #[inline]
    pub fn last_slot(&self) -> PeriodSlot {
        self.slot.advance(self.length - 1)
    }

    /// Whether the section is in session at `slot`.
    #[inline]
    pub fn covers(&self, slot: PeriodSlot) -> bool {
        slot.block == self.slot.block
            && slot.index >= self.slot.index
            && slot.index < self.slot.index + self.length
    }

    /// Whether two runs share any period.
    pub fn overlaps(&self, other: &StartAssignment) -> bool {
        self.slot.block == other.slot.block
            && self.slot.index < other.slot.index + other.length
            && other.slot.index < self.slot.index + self.length
    }

    /// The present assignment at `slot`, if the section is in session then.
    pub fn present_at(
        &self,
        program: &ProgramGraph,
        slot: PeriodSlot,
    ) -> Option<PresentAssignment> {
        if !self.covers(slot) {
            return None;
        }
        Some(PresentAssignment {
            start: *self,
            offset: slot.index - self.slot.index,
            period: program.period_at(slot)?,
        })
    }

    /// Every period of the run, in order.
    pub fn present_assignments<'a>(
        &self,
        program: &'a ProgramGraph,
    ) -> impl Iterator<Item = PresentAssignment> + 'a {
        let start = *self;
        let block = &program[self.slot.block].periods;
        (0..self.length).map(move |offset| PresentAssignment {
            start,
            offset,
            period: block[(start.slot.index + offset) as usize],
        })
    }

    /// The `(section, room, period)` triple for this assignment.
    pub fn to_serial(&self, locked: bool) -> SerialAssignment {
        SerialAssignment {
            section: self.section,
            room: self.room,
            period: self.period,
            locked,
        }
    }
}

impl fmt::Display for StartAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {} from {}", self.section, self.room, self.period)
    }
}

/// One period of a section's run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PresentAssignment {
    start: StartAssignment,
    offset: u32,
    period: ClassPeriodId,
}

impl PresentAssignment {
    /// The assignment this period belongs to.
    #[inline]
    pub fn start(&self) -> StartAssignment {
        self.start
    }

    /// Offset from the start of the run, in `0..length`.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    #[inline]
    pub fn period(&self) -> ClassPeriodId {
        self.period
    }

    #[inline]
    pub fn slot(&self) -> PeriodSlot {
        self.start.slot.advance(self.offset)
    }

    #[inline]
    pub fn room(&self) -> RoomId {
        self.start.room
    }

    #[inline]
    pub fn section(&self) -> SectionId {
        self.start.section
    }
}

impl fmt::Display for PresentAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {} at {}", self.start.section, self.start.room, self.period)
    }
}

/// Serialized form of a start assignment.
///
/// This is both the initial-schedule input and the final-schedule output
/// format, so the two round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerialAssignment {
    pub section: SectionId,
    pub room: RoomId,
    pub period: ClassPeriodId,
    /// Pinned placement the optimizer may not move.
    #[serde(default)]
    pub locked: bool,
}

impl SerialAssignment {
    pub fn new(section: SectionId, room: RoomId, period: ClassPeriodId) -> Self {
        Self {
            section,
            room,
            period,
            locked: false,
        }
    }

    /// Marks the placement as locked.
    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    /// Resolves the triple against a program graph.
    pub fn resolve(&self, program: &ProgramGraph) -> Result<StartAssignment, ScheduleError> {
        StartAssignment::new(program, self.period, self.room, self.section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::*;

    #[test]
    fn test_new_checks_fit() {
        let g = saturday_morning_graph();
        // Zombies runs three periods: only 10AM fits
        assert!(StartAssignment::new(&g, P10AM, HARPER135, ZOMBIES_1).is_ok());
        assert_eq!(
            StartAssignment::new(&g, P11AM, HARPER135, ZOMBIES_1),
            Err(ScheduleError::DoesNotFit {
                section: ZOMBIES_1,
                period: P11AM
            })
        );
    }

    #[test]
    fn test_new_unknown_entity() {
        let g = saturday_morning_graph();
        assert!(matches!(
            StartAssignment::new(&g, ClassPeriodId(99), HARPER135, MATH_1),
            Err(ScheduleError::UnknownEntity {
                kind: EntityKind::ClassPeriod,
                ..
            })
        ));
        assert!(matches!(
            StartAssignment::new(&g, P10AM, RoomId(1), MATH_1),
            Err(ScheduleError::UnknownEntity {
                kind: EntityKind::Room,
                ..
            })
        ));
    }

    #[test]
    fn test_present_assignments() {
        let g = saturday_morning_graph();
        let start = StartAssignment::new(&g, P10AM, HARPER142, ORIGAMI_1).unwrap();
        let presents: Vec<_> = start.present_assignments(&g).collect();
        assert_eq!(presents.len(), 2);
        assert_eq!(presents[0].period(), P10AM);
        assert_eq!(presents[1].period(), P11AM);
        assert_eq!(presents[1].offset(), 1);
        assert_eq!(presents[1].start(), start);
        assert_eq!(start.last_slot(), g.slot_of(P11AM));
    }

    #[test]
    fn test_covers_and_overlaps() {
        let g = saturday_morning_graph();
        let origami = StartAssignment::new(&g, P10AM, HARPER142, ORIGAMI_1).unwrap();
        let math = StartAssignment::new(&g, P11AM, HARPER142, MATH_1).unwrap();
        let late = StartAssignment::new(&g, P12PM, HARPER135, MATH_1).unwrap();
        assert!(origami.covers(g.slot_of(P11AM)));
        assert!(!origami.covers(g.slot_of(P12PM)));
        assert!(origami.overlaps(&math));
        assert!(!origami.overlaps(&late));
        assert_eq!(origami.present_at(&g, g.slot_of(P11AM)).map(|p| p.offset()), Some(1));
        assert!(origami.present_at(&g, g.slot_of(P12PM)).is_none());
    }

    #[test]
    fn test_serial_roundtrip() {
        let g = saturday_morning_graph();
        let start = StartAssignment::new(&g, P11AM, HARPER130, PIRATES_1).unwrap();
        let serial = start.to_serial(false);
        let json = serde_json::to_string(&serial).unwrap();
        let back: SerialAssignment = serde_json::from_str(&json).unwrap();
        assert_eq!(back.resolve(&g).unwrap(), start);
    }
}
