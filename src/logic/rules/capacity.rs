//! Fit rules: room size, room features, shared resources and group caps.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeSet;

use crate::logic::{ScheduleRule, ScheduleValidator};
use crate::models::{PeriodOwner, PresentAssignment, Schedule, StartAssignment};

/// Room-size ratios and period availability.
///
/// - `capacity / max_size >= min_class_cap_ratio`: the room seats the class
///   at its largest.
/// - `capacity / estimated_size <= max_est_class_size_ratio`: the room is
///   not wastefully large.
/// - every period of the run is available to the room and to every teacher.
#[derive(Debug, Clone, Copy)]
pub struct LocalConflict {
    min_class_cap_ratio: f64,
    max_est_class_size_ratio: f64,
}

impl LocalConflict {
    pub fn new(min_class_cap_ratio: f64, max_est_class_size_ratio: f64) -> Self {
        Self {
            min_class_cap_ratio,
            max_est_class_size_ratio,
        }
    }
}

impl Default for LocalConflict {
    fn default() -> Self {
        Self::new(1.0, f64::INFINITY)
    }
}

fn ratio(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        f64::INFINITY
    } else {
        numerator as f64 / denominator as f64
    }
}

impl ScheduleRule for LocalConflict {
    fn name(&self) -> &'static str {
        "LOCAL_CONFLICT"
    }

    fn validate_start(
        &self,
        validator: &mut ScheduleValidator,
        schedule: &Schedule,
        candidate: &StartAssignment,
    ) {
        let program = schedule.program();
        let course = program.course_of(candidate.section());
        let capacity = program[candidate.room()].capacity;

        let cap_ratio = ratio(capacity, course.max_size);
        validator.validate_local(cap_ratio >= self.min_class_cap_ratio, *candidate, || {
            format!(
                "{} seats {capacity}, {} takes up to {}",
                candidate.room(),
                course.title,
                course.max_size
            )
        });
        let est_ratio = ratio(capacity, course.estimated_size);
        validator.validate_local(est_ratio <= self.max_est_class_size_ratio, *candidate, || {
            format!(
                "{} seats {capacity}, too large for {} expected in {}",
                candidate.room(),
                course.estimated_size,
                course.title
            )
        });
    }

    fn validate_present(
        &self,
        validator: &mut ScheduleValidator,
        schedule: &Schedule,
        candidate: &PresentAssignment,
    ) {
        let program = schedule.program();
        let period = candidate.period();
        validator.validate_local(
            program.compatible_periods(candidate.section()).contains(&period),
            *candidate,
            || format!("a teacher of {} is unavailable at {period}", candidate.section()),
        );
        validator.validate_local(
            program
                .available_periods(PeriodOwner::Room(candidate.room()))
                .contains(&period),
            *candidate,
            || format!("{} is unavailable at {period}", candidate.room()),
        );
    }
}

/// The room offers every required property and is not reserved by a
/// binding property the course doesn't need.
#[derive(Debug, Clone, Copy)]
pub struct RoomProperties;

impl ScheduleRule for RoomProperties {
    fn name(&self) -> &'static str {
        "ROOM_PROPERTIES"
    }

    fn validate_start(
        &self,
        validator: &mut ScheduleValidator,
        schedule: &Schedule,
        candidate: &StartAssignment,
    ) {
        let program = schedule.program();
        let required = program.required_properties(candidate.section());
        let offered = program.room_properties(candidate.room());
        for property in required.iter().filter(|p| !offered.contains(p)) {
            validator.validate_local(false, *candidate, || {
                format!("{} lacks {property}", candidate.room())
            });
        }
        for property in program
            .binding_properties(candidate.room())
            .filter(|p| !required.contains(p))
        {
            validator.validate_local(false, *candidate, || {
                format!("{} is reserved for courses requiring {property}", candidate.room())
            });
        }
    }
}

/// Draws for breaking ties among evictable assignments. Keyed by `seed`, the
/// candidate and the contested `pool`, so repeated validations agree.
fn tie_break(seed: u64, candidate: &PresentAssignment, pool: u32) -> SmallRng {
    let key = [candidate.section().0, candidate.room().0, candidate.period().0, pool]
        .into_iter()
        .fold(seed, |h, v| {
            (h ^ u64::from(v))
                .wrapping_mul(0x9E37_79B9_7F4A_7C15)
                .rotate_left(29)
        });
    SmallRng::seed_from_u64(key)
}

/// Required resources come from the room or from a floating pool.
///
/// Sections in rooms lacking a resource share `floating_count` units per
/// period. When the pool would be overdrawn, enough randomly chosen
/// borrowers are named as conflicts to make room for the candidate.
#[derive(Debug, Clone, Copy)]
pub struct Resources {
    seed: u64,
}

impl Resources {
    pub fn seeded(seed: u64) -> Self {
        Self { seed }
    }
}

impl ScheduleRule for Resources {
    fn name(&self) -> &'static str {
        "RESOURCES"
    }

    fn validate_start(
        &self,
        validator: &mut ScheduleValidator,
        schedule: &Schedule,
        candidate: &StartAssignment,
    ) {
        let program = schedule.program();
        let required = program.resource_requirements(candidate.section());
        for resource in program
            .binding_resources(candidate.room())
            .filter(|r| !required.contains(r))
        {
            validator.validate_local(false, *candidate, || {
                format!("{} is reserved for courses requiring {resource}", candidate.room())
            });
        }
    }

    fn validate_present(
        &self,
        validator: &mut ScheduleValidator,
        schedule: &Schedule,
        candidate: &PresentAssignment,
    ) {
        let program = schedule.program();
        let in_room = program.room_resources(candidate.room());
        let borrowed = program
            .resource_requirements(candidate.section())
            .iter()
            .filter(|r| !in_room.contains(r));

        let concurrent = schedule.occurring_at_period_slot(candidate.slot());
        for &resource in borrowed {
            let mut borrowers: Vec<StartAssignment> = concurrent
                .iter()
                .filter(|o| o.section() != candidate.section())
                .filter(|o| program.resource_requirements(o.section()).contains(&resource))
                .filter(|o| !program.room_resources(o.room()).contains(&resource))
                .map(|o| o.start())
                .collect();
            let floating = program[resource].floating_count as usize;
            if borrowers.len() < floating {
                continue;
            }
            if floating == 0 {
                validator.validate_local(false, *candidate, || {
                    format!("{} lacks {resource} and none float", candidate.room())
                });
                continue;
            }
            let excess = borrowers.len() + 1 - floating;
            borrowers.sort_unstable();
            borrowers.shuffle(&mut tie_break(self.seed, candidate, resource.0));
            borrowers.truncate(excess);
            validator.validate_global(*candidate, borrowers, || {
                format!("all {floating} floating {resource} are in use at {}", candidate.period())
            });
        }
    }
}

/// At most `cap` teaching slots of a teacher group run at once.
///
/// Each member teaching a section counts once. When the candidate pushes a
/// group over its cap, randomly chosen concurrent sections are named as
/// conflicts until it fits.
#[derive(Debug, Clone, Copy)]
pub struct TeacherGroupCap {
    seed: u64,
}

impl TeacherGroupCap {
    pub fn seeded(seed: u64) -> Self {
        Self { seed }
    }
}

impl ScheduleRule for TeacherGroupCap {
    fn name(&self) -> &'static str {
        "TEACHER_GROUP_CAP"
    }

    fn validate_present(
        &self,
        validator: &mut ScheduleValidator,
        schedule: &Schedule,
        candidate: &PresentAssignment,
    ) {
        let program = schedule.program();
        let teachers = program.teachers_for(candidate.section());
        let groups: BTreeSet<_> = teachers
            .iter()
            .flat_map(|&t| program.groups_of(t).iter().copied())
            .collect();
        if groups.is_empty() {
            return;
        }
        let concurrent = schedule.occurring_at_period_slot(candidate.slot());

        for group_id in groups {
            let group = &program[group_id];
            let members = |section| {
                program
                    .teachers_for(section)
                    .iter()
                    .filter(|t| group.teachers.contains(t))
                    .count()
            };
            let own = members(candidate.section());
            if own > group.cap as usize {
                validator.validate_local(false, *candidate, || {
                    format!("{} alone exceeds the cap of {}", candidate.section(), group.name)
                });
                continue;
            }
            let mut others: Vec<(StartAssignment, usize)> = concurrent
                .iter()
                .filter(|o| o.section() != candidate.section())
                .map(|o| (o.start(), members(o.section())))
                .filter(|&(_, n)| n > 0)
                .collect();
            let mut load = own + others.iter().map(|&(_, n)| n).sum::<usize>();
            if load <= group.cap as usize {
                continue;
            }
            others.sort_unstable();
            others.shuffle(&mut tie_break(self.seed, candidate, group_id.0));
            let mut evicted = Vec::new();
            while load > group.cap as usize {
                match others.pop() {
                    Some((start, n)) => {
                        load -= n;
                        evicted.push(start);
                    }
                    None => break,
                }
            }
            validator.validate_global(*candidate, evicted, || {
                format!(
                    "{} would exceed its cap of {} at {}",
                    group.name,
                    group.cap,
                    candidate.period()
                )
            });
        }
    }
}
