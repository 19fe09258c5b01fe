//! Integrity checks for program construction records.
//!
//! Run by [`ProgramGraph::new`](crate::models::ProgramGraph::new) before any
//! entity is indexed. Checking stops at the first violation. Detects:
//! - Duplicate ids within an entity kind
//! - Cross-references to entities that don't exist
//! - Courses whose estimated size exceeds their maximum size
//! - Zero-length sections and empty time blocks
//! - Circular prerequisite chains
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use crate::error::GraphIntegrityError;
use crate::models::{CourseId, EntityKind, ProgramSpec};
use std::collections::{HashMap, HashSet};

type Check = Result<(), GraphIntegrityError>;

/// Validates a construction record.
///
/// Checks, in order:
/// 1. No duplicate ids in any entity kind (periods are unique program-wide)
/// 2. Every time block has at least one period
/// 3. Teacher and room references (periods, properties, resources, buildings)
/// 4. Course references (teachers, properties, resources, prerequisites, rooms)
///    and `estimated_size <= max_size`
/// 5. Section references and `period_length >= 1`
/// 6. Teacher group members
/// 7. No circular prerequisite chains
///
/// # Returns
/// `Ok(())` if all checks pass, otherwise the first violation found.
pub fn check_integrity(spec: &ProgramSpec) -> Check {
    let teachers = unique_ids(EntityKind::Teacher, spec.teachers.iter().map(|t| t.id.0))?;
    let rooms = unique_ids(EntityKind::Room, spec.rooms.iter().map(|r| r.id.0))?;
    let buildings = unique_ids(EntityKind::Building, spec.buildings.iter().map(|b| b.id.0))?;
    let courses = unique_ids(EntityKind::Course, spec.courses.iter().map(|c| c.id.0))?;
    unique_ids(EntityKind::Section, spec.sections.iter().map(|s| s.id.0))?;
    unique_ids(EntityKind::TimeBlock, spec.time_blocks.iter().map(|b| b.id.0))?;
    let periods = unique_ids(
        EntityKind::ClassPeriod,
        spec.time_blocks
            .iter()
            .flat_map(|b| b.periods.iter().map(|p| p.id.0)),
    )?;
    let properties = unique_ids(EntityKind::Property, spec.properties.iter().map(|p| p.id.0))?;
    let resources = unique_ids(EntityKind::Resource, spec.resources.iter().map(|r| r.id.0))?;
    unique_ids(
        EntityKind::TeacherGroup,
        spec.teacher_groups.iter().map(|g| g.id.0),
    )?;

    for block in &spec.time_blocks {
        if block.periods.is_empty() {
            return Err(GraphIntegrityError::EmptyTimeBlock { block: block.id });
        }
    }

    for teacher in &spec.teachers {
        let from = (EntityKind::Teacher, teacher.id.0);
        resolve_all(
            from,
            EntityKind::ClassPeriod,
            &periods,
            teacher.available_periods.iter().map(|p| p.0),
        )?;
    }

    for room in &spec.rooms {
        let from = (EntityKind::Room, room.id.0);
        resolve_all(
            from,
            EntityKind::ClassPeriod,
            &periods,
            room.available_periods.iter().map(|p| p.0),
        )?;
        resolve_all(from, EntityKind::Property, &properties, room.properties.iter().map(|p| p.0))?;
        resolve_all(from, EntityKind::Resource, &resources, room.resources.iter().map(|r| r.0))?;
        resolve_all(from, EntityKind::Building, &buildings, room.building.iter().map(|b| b.0))?;
    }

    for course in &spec.courses {
        let from = (EntityKind::Course, course.id.0);
        resolve_all(from, EntityKind::Teacher, &teachers, course.teachers.iter().map(|t| t.0))?;
        resolve_all(
            from,
            EntityKind::Property,
            &properties,
            course.required_properties.iter().map(|p| p.0),
        )?;
        resolve_all(
            from,
            EntityKind::Resource,
            &resources,
            course.required_resources.iter().map(|r| r.0),
        )?;
        resolve_all(from, EntityKind::Course, &courses, course.prerequisites.iter().map(|c| c.0))?;
        resolve_all(from, EntityKind::Room, &rooms, course.preferred_rooms.iter().map(|r| r.0))?;
        if course.estimated_size > course.max_size {
            return Err(GraphIntegrityError::EstimatedExceedsMax {
                course: course.id,
                estimated: course.estimated_size,
                max: course.max_size,
            });
        }
    }

    for section in &spec.sections {
        let from = (EntityKind::Section, section.id.0);
        resolve_all(from, EntityKind::Course, &courses, std::iter::once(section.course.0))?;
        if section.period_length == 0 {
            return Err(GraphIntegrityError::EmptySection {
                section: section.id,
            });
        }
    }

    for group in &spec.teacher_groups {
        let from = (EntityKind::TeacherGroup, group.id.0);
        resolve_all(from, EntityKind::Teacher, &teachers, group.teachers.iter().map(|t| t.0))?;
    }

    detect_prerequisite_cycles(spec)
}

fn unique_ids(
    kind: EntityKind,
    ids: impl IntoIterator<Item = u32>,
) -> Result<HashSet<u32>, GraphIntegrityError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(GraphIntegrityError::DuplicateId { kind, id });
        }
    }
    Ok(seen)
}

fn resolve_all(
    (from, from_id): (EntityKind, u32),
    to: EntityKind,
    known: &HashSet<u32>,
    refs: impl IntoIterator<Item = u32>,
) -> Check {
    for to_id in refs {
        if !known.contains(&to_id) {
            return Err(GraphIntegrityError::DanglingReference {
                from,
                from_id,
                to,
                to_id,
            });
        }
    }
    Ok(())
}

/// Detects cycles in the prerequisite graph using DFS.
///
/// # Algorithm
/// Topological sort via DFS. A back-edge (reaching a course currently on
/// the recursion stack) means the chain can never be satisfied.
fn detect_prerequisite_cycles(spec: &ProgramSpec) -> Check {
    let adj: HashMap<CourseId, &[CourseId]> = spec
        .courses
        .iter()
        .map(|c| (c.id, c.prerequisites.as_slice()))
        .collect();

    let mut visited = HashSet::new();
    let mut in_stack = HashSet::new();

    for course in &spec.courses {
        if !visited.contains(&course.id)
            && has_cycle_dfs(course.id, &adj, &mut visited, &mut in_stack)
        {
            return Err(GraphIntegrityError::CyclicPrerequisites { course: course.id });
        }
    }
    Ok(())
}

fn has_cycle_dfs(
    node: CourseId,
    adj: &HashMap<CourseId, &[CourseId]>,
    visited: &mut HashSet<CourseId>,
    in_stack: &mut HashSet<CourseId>,
) -> bool {
    visited.insert(node);
    in_stack.insert(node);

    if let Some(prereqs) = adj.get(&node) {
        for &next in prereqs.iter() {
            if in_stack.contains(&next) {
                return true;
            }
            if !visited.contains(&next) && has_cycle_dfs(next, adj, visited, in_stack) {
                return true;
            }
        }
    }

    in_stack.remove(&node);
    false
}
