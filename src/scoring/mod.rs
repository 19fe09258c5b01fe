//! Schedule scoring.
//!
//! A [`CompositeScorer`] sums weighted components, each
//! `multiplier · value^exponent` over one [`ScorerKind`] metric.
//!
//! # Metrics
//!
//! | Kind | Value |
//! |------|-------|
//! | SECTIONS_SCHEDULED | Sections placed |
//! | DISTINCT_COURSES_SCHEDULED | Courses with at least one section placed |
//! | TEACHERS_WITH_CLASSES_SCHEDULED | Teachers teaching at least once |
//! | CLASS_HOURS_SCHEDULED | Σ section length |
//! | STUDENT_CLASS_HOURS_SCHEDULED | Σ estimated size × length |
//! | BACK_TO_BACK_CLASSES | −(consecutive classes of a teacher in different places) |
//! | GLOBAL_ATTENDANCE_LEVELS | −Σ \|actual / expected − 1\| over periods |
//! | UNUSED_ROOMS | Available room-periods left empty |
//! | PREFERRED_ROOMS | Sections in one of their course's preferred rooms |
//! | ROOM_SIZE_FIT | −Σ \|capacity − max size\| / capacity |
//! | PREREQUISITE_ORDERING | Prerequisite pairs placed in order |
//!
//! Negative exponents and fractional powers apply to the magnitude; the
//! sign of the value is kept.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::models::{ClassPeriodId, PeriodOwner, Schedule, StartAssignment};
use crate::optimizer::Scorer;

/// Named schedule metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScorerKind {
    SectionsScheduled,
    DistinctCoursesScheduled,
    TeachersWithClassesScheduled,
    ClassHoursScheduled,
    StudentClassHoursScheduled,
    BackToBackClasses,
    GlobalAttendanceLevels,
    UnusedRooms,
    PreferredRooms,
    RoomSizeFit,
    PrerequisiteOrdering,
}

impl ScorerKind {
    /// Raw metric value.
    pub fn evaluate(self, schedule: &Schedule) -> f64 {
        match self {
            ScorerKind::SectionsScheduled => schedule.assignment_count() as f64,
            ScorerKind::DistinctCoursesScheduled => distinct_courses(schedule) as f64,
            ScorerKind::TeachersWithClassesScheduled => teachers_teaching(schedule) as f64,
            ScorerKind::ClassHoursScheduled => {
                schedule.start_assignments().map(|a| a.length() as f64).sum()
            }
            ScorerKind::StudentClassHoursScheduled => student_hours(schedule),
            ScorerKind::BackToBackClasses => -(back_to_back(schedule) as f64),
            ScorerKind::GlobalAttendanceLevels => -attendance_deviation(schedule),
            ScorerKind::UnusedRooms => unused_room_periods(schedule) as f64,
            ScorerKind::PreferredRooms => preferred_rooms(schedule) as f64,
            ScorerKind::RoomSizeFit => -room_size_misfit(schedule),
            ScorerKind::PrerequisiteOrdering => prerequisites_in_order(schedule) as f64,
        }
    }
}

fn one() -> f64 {
    1.0
}

/// One weighted term of a composite score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScorerComponent {
    pub name: ScorerKind,
    #[serde(default = "one")]
    pub exponent: f64,
    #[serde(default = "one")]
    pub multiplier: f64,
}

impl ScorerComponent {
    pub fn new(name: ScorerKind) -> Self {
        Self {
            name,
            exponent: 1.0,
            multiplier: 1.0,
        }
    }

    pub fn with_exponent(mut self, exponent: f64) -> Self {
        self.exponent = exponent;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn score(&self, schedule: &Schedule) -> f64 {
        let value = self.name.evaluate(schedule);
        let powered = if self.exponent == 1.0 {
            value
        } else {
            value.signum() * value.abs().powf(self.exponent)
        };
        self.multiplier * powered
    }
}

/// Sum of weighted components.
#[derive(Debug, Clone, Default)]
pub struct CompositeScorer {
    components: Vec<ScorerComponent>,
}

impl CompositeScorer {
    pub fn new(components: impl IntoIterator<Item = ScorerComponent>) -> Self {
        Self {
            components: components.into_iter().collect(),
        }
    }

    pub fn components(&self) -> &[ScorerComponent] {
        &self.components
    }
}

impl Scorer<Schedule> for CompositeScorer {
    fn score(&self, schedule: &Schedule) -> f64 {
        self.components.iter().map(|c| c.score(schedule)).sum()
    }
}

// ======================== Metrics ========================

fn distinct_courses(schedule: &Schedule) -> usize {
    let program = schedule.program();
    schedule
        .scheduled_sections()
        .map(|s| program[s].course)
        .collect::<BTreeSet<_>>()
        .len()
}

fn teachers_teaching(schedule: &Schedule) -> usize {
    let program = schedule.program();
    schedule
        .scheduled_sections()
        .flat_map(|s| program.teachers_for(s).iter().copied())
        .collect::<BTreeSet<_>>()
        .len()
}

fn student_hours(schedule: &Schedule) -> f64 {
    let program = schedule.program();
    schedule
        .start_assignments()
        .map(|a| program.course_of(a.section()).estimated_size as f64 * a.length() as f64)
        .sum()
}

/// Pairs of a teacher's classes that run back to back in different places.
fn back_to_back(schedule: &Schedule) -> usize {
    let program = schedule.program();
    let mut by_teacher: HashMap<_, Vec<StartAssignment>> = HashMap::new();
    for a in schedule.start_assignments() {
        for &t in program.teachers_for(a.section()) {
            by_teacher.entry(t).or_default().push(a);
        }
    }
    let mut count = 0;
    for runs in by_teacher.values_mut() {
        runs.sort();
        for pair in runs.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a.last_slot().advance(1) != b.slot() {
                continue;
            }
            let moved = match (program[a.room()].building, program[b.room()].building) {
                (Some(x), Some(y)) => x != y,
                _ => a.room() != b.room(),
            };
            if moved {
                count += 1;
            }
        }
    }
    count
}

/// Deviation of per-period attendance from each period's expected share.
fn attendance_deviation(schedule: &Schedule) -> f64 {
    let program = schedule.program();
    let mut actual: HashMap<ClassPeriodId, f64> = HashMap::new();
    for a in schedule.start_assignments() {
        let size = program.course_of(a.section()).max_size as f64;
        for p in a.present_assignments(program) {
            *actual.entry(p.period()).or_default() += size;
        }
    }
    let total: f64 = actual.values().sum();
    let periods = program.periods();
    if total == 0.0 || periods.is_empty() {
        return 0.0;
    }
    let per_period = total / periods.len() as f64;
    periods
        .iter()
        .filter(|p| p.attendance_ratio > 0.0)
        .map(|p| {
            let expected = p.attendance_ratio * per_period;
            let seen = actual.get(&p.id).copied().unwrap_or(0.0);
            (seen / expected - 1.0).abs()
        })
        .sum()
}

fn unused_room_periods(schedule: &Schedule) -> usize {
    let program = schedule.program();
    program
        .rooms()
        .iter()
        .map(|r| {
            let available = program.available_periods(PeriodOwner::Room(r.id)).len();
            let used: usize = schedule
                .assignments_in_room(r.id)
                .iter()
                .map(|a| a.length() as usize)
                .sum();
            available.saturating_sub(used)
        })
        .sum()
}

fn preferred_rooms(schedule: &Schedule) -> usize {
    let program = schedule.program();
    schedule
        .start_assignments()
        .filter(|a| program.course_of(a.section()).preferred_rooms.contains(&a.room()))
        .count()
}

fn room_size_misfit(schedule: &Schedule) -> f64 {
    let program = schedule.program();
    schedule
        .start_assignments()
        .map(|a| {
            let capacity = program[a.room()].capacity as f64;
            if capacity == 0.0 {
                return 0.0;
            }
            let size = program.course_of(a.section()).max_size as f64;
            (capacity - size).abs() / capacity
        })
        .sum()
}

fn prerequisites_in_order(schedule: &Schedule) -> usize {
    let program = schedule.program();
    schedule
        .start_assignments()
        .map(|a| {
            program
                .prerequisites(a.section())
                .iter()
                .filter(|&&course| {
                    program.sections_of_course(course).iter().any(|&s| {
                        schedule
                            .assignment_for(s)
                            .is_some_and(|p| p.last_slot() < a.slot())
                    })
                })
                .count()
        })
        .sum()
}

/// Summary of a schedule's quality, one value per metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleMetrics {
    pub sections_scheduled: usize,
    pub sections_unscheduled: usize,
    pub distinct_courses: usize,
    pub teachers_teaching: usize,
    pub class_hours: u32,
    pub student_class_hours: f64,
    pub back_to_back_moves: usize,
    pub attendance_deviation: f64,
    pub unused_room_periods: usize,
}

impl ScheduleMetrics {
    pub fn calculate(schedule: &Schedule) -> Self {
        Self {
            sections_scheduled: schedule.assignment_count(),
            sections_unscheduled: schedule.unscheduled_sections().len(),
            distinct_courses: distinct_courses(schedule),
            teachers_teaching: teachers_teaching(schedule),
            class_hours: schedule.start_assignments().map(|a| a.length()).sum(),
            student_class_hours: student_hours(schedule),
            back_to_back_moves: back_to_back(schedule),
            attendance_deviation: attendance_deviation(schedule),
            unused_room_periods: unused_room_periods(schedule),
        }
    }
}
