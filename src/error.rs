//! Error types.
//!
//! Conflicts between assignments are not errors: they are reported as data
//! through a [`ScheduleValidator`](crate::logic::ScheduleValidator). The types
//! here cover malformed input, i.e. program data that fails integrity checks,
//! placements that cannot exist at all, and bad optimizer configuration.

use crate::models::{ClassPeriodId, CourseId, EntityKind, SectionId, TimeBlockId};
use thiserror::Error;

/// Structural defect found while building a [`ProgramGraph`](crate::models::ProgramGraph).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphIntegrityError {
    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: EntityKind, id: u32 },

    #[error("{from} {from_id} references unknown {to} {to_id}")]
    DanglingReference {
        from: EntityKind,
        from_id: u32,
        to: EntityKind,
        to_id: u32,
    },

    #[error("{course} estimates {estimated} students but caps at {max}")]
    EstimatedExceedsMax {
        course: CourseId,
        estimated: u32,
        max: u32,
    },

    #[error("{section} has a period length of zero")]
    EmptySection { section: SectionId },

    #[error("{block} has no periods")]
    EmptyTimeBlock { block: TimeBlockId },

    #[error("prerequisites of {course} form a cycle")]
    CyclicPrerequisites { course: CourseId },
}

/// A placement or serialized schedule that cannot be applied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error("unknown {kind} id {id}")]
    UnknownEntity { kind: EntityKind, id: u32 },

    #[error("{section} does not fit in its block when starting at {period}")]
    DoesNotFit {
        section: SectionId,
        period: ClassPeriodId,
    },

    #[error("cannot place {section} at {period}: {reason}")]
    Conflict {
        section: SectionId,
        period: ClassPeriodId,
        reason: String,
    },
}

/// Invalid optimizer or logic configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no {role} configured")]
    Empty { role: &'static str },

    #[error("invalid value for {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Crate-wide error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Integrity(#[from] GraphIntegrityError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not start optimizer worker threads: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GraphIntegrityError::EstimatedExceedsMax {
            course: CourseId(3),
            estimated: 20,
            max: 10,
        };
        assert_eq!(err.to_string(), "course#3 estimates 20 students but caps at 10");

        let err = GraphIntegrityError::DanglingReference {
            from: EntityKind::Course,
            from_id: 1,
            to: EntityKind::Teacher,
            to_id: 9,
        };
        assert_eq!(err.to_string(), "course 1 references unknown teacher 9");
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = GraphIntegrityError::EmptySection {
            section: SectionId(4),
        }
        .into();
        assert!(matches!(err, Error::Integrity(_)));
        assert_eq!(err.to_string(), "section#4 has a period length of zero");
    }
}
