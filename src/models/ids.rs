//! Typed entity identifiers.
//!
//! Every cross-entity relationship in a [`ProgramGraph`](super::ProgramGraph)
//! is stored as one of these ids and resolved through the owning graph.
//! Entities never hold references to each other.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }
    };
}

entity_id!(
    /// Identifies a [`Teacher`](super::Teacher).
    TeacherId,
    "teacher"
);
entity_id!(
    /// Identifies a [`Room`](super::Room).
    RoomId,
    "room"
);
entity_id!(
    /// Identifies a [`Building`](super::Building).
    BuildingId,
    "building"
);
entity_id!(
    /// Identifies a [`Course`](super::Course).
    CourseId,
    "course"
);
entity_id!(
    /// Identifies a [`Section`](super::Section).
    SectionId,
    "section"
);
entity_id!(
    /// Identifies a [`TimeBlock`](super::TimeBlock).
    TimeBlockId,
    "block"
);
entity_id!(
    /// Identifies a [`ClassPeriod`](super::ClassPeriod).
    ClassPeriodId,
    "period"
);
entity_id!(
    /// Identifies a [`RoomProperty`](super::RoomProperty).
    PropertyId,
    "property"
);
entity_id!(
    /// Identifies a [`Resource`](super::Resource).
    ResourceId,
    "resource"
);
entity_id!(
    /// Identifies a [`TeacherGroup`](super::TeacherGroup).
    TeacherGroupId,
    "group"
);

/// Kinds of entity owned by a program graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Teacher,
    Room,
    Building,
    Course,
    Section,
    TimeBlock,
    ClassPeriod,
    Property,
    Resource,
    TeacherGroup,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Teacher => "teacher",
            EntityKind::Room => "room",
            EntityKind::Building => "building",
            EntityKind::Course => "course",
            EntityKind::Section => "section",
            EntityKind::TimeBlock => "time block",
            EntityKind::ClassPeriod => "class period",
            EntityKind::Property => "room property",
            EntityKind::Resource => "resource",
            EntityKind::TeacherGroup => "teacher group",
        };
        f.write_str(name)
    }
}

/// Position of a period inside the program's timeline.
///
/// Orders first by time block, then by index within the block. This is the
/// key order of each room's period map in a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodSlot {
    /// Owning time block.
    pub block: TimeBlockId,
    /// Zero-based index within the block.
    pub index: u32,
}

impl PeriodSlot {
    pub fn new(block: TimeBlockId, index: u32) -> Self {
        Self { block, index }
    }

    /// The slot `offset` periods later in the same block.
    #[inline]
    pub fn advance(self, offset: u32) -> Self {
        Self {
            block: self.block,
            index: self.index + offset,
        }
    }
}

impl fmt::Display for PeriodSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.block, self.index)
    }
}
