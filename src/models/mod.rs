//! Splash program and schedule models.
//!
//! A program is described once by a [`ProgramSpec`] construction record and
//! frozen into an immutable [`ProgramGraph`], shared behind an `Arc` by every
//! [`Schedule`] built against it.
//!
//! # Entities
//!
//! | Type | Role |
//! |------|------|
//! | [`TimeBlock`] / [`ClassPeriod`] | Contiguous runs of teaching periods |
//! | [`Teacher`] / [`TeacherGroup`] | Who teaches, and when they are free |
//! | [`Room`] / [`Building`] | Where, with capacity and availability |
//! | [`RoomProperty`] / [`Resource`] | Room features courses may require |
//! | [`Course`] / [`Section`] | What is taught, in how many periods |
//!
//! # Placements
//!
//! A [`StartAssignment`] places a section's first period in a room; each
//! period of its run is a [`PresentAssignment`]. [`SerialAssignment`] is the
//! `(section, room, period)` triple used for input and output.

mod assignment;
mod course;
mod ids;
mod period;
mod program;
mod resource;
mod schedule;

#[cfg(test)]
pub(crate) mod fixtures;

pub use assignment::{PresentAssignment, SerialAssignment, StartAssignment};
pub use course::{Course, Section, Teacher, TeacherGroup};
pub use ids::{
    BuildingId, ClassPeriodId, CourseId, EntityKind, PeriodSlot, PropertyId, ResourceId, RoomId,
    SectionId, TeacherGroupId, TeacherId, TimeBlockId,
};
pub use period::{ClassPeriod, GradeRange, PeriodSpec, TimeBlock, TimeBlockSpec};
pub use program::{EntityRef, PeriodOwner, ProgramGraph, ProgramSpec};
pub use resource::{Building, Resource, Room, RoomProperty};
pub use schedule::{Schedule, ScheduleFactory};

#[cfg(test)]
pub(crate) use schedule::assert_consistent;
