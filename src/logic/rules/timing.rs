//! Timing rules: prerequisite order, grade windows, lunch breaks.

use crate::logic::{ScheduleRule, ScheduleValidator};
use crate::models::{PeriodSlot, PresentAssignment, Schedule, StartAssignment};

/// Every prerequisite course has a section that ends before the candidate
/// starts.
///
/// Timeline order is block id, then period index.
#[derive(Debug, Clone, Copy)]
pub struct Prerequisites;

impl ScheduleRule for Prerequisites {
    fn name(&self) -> &'static str {
        "PREREQUISITES"
    }

    fn validate_start(
        &self,
        validator: &mut ScheduleValidator,
        schedule: &Schedule,
        candidate: &StartAssignment,
    ) {
        let program = schedule.program();
        for &course in program.prerequisites(candidate.section()) {
            let satisfied = program.sections_of_course(course).iter().any(|&s| {
                schedule
                    .assignment_for(s)
                    .is_some_and(|a| a.last_slot() < candidate.slot())
            });
            validator.validate_local(satisfied, *candidate, || {
                format!(
                    "no section of {} ends before {}",
                    program[course].title,
                    candidate.period()
                )
            });
        }
    }
}

/// A period restricted to some grades only hosts courses within them.
#[derive(Debug, Clone, Copy)]
pub struct GradeRange;

impl ScheduleRule for GradeRange {
    fn name(&self) -> &'static str {
        "GRADE_RANGE"
    }

    fn validate_present(
        &self,
        validator: &mut ScheduleValidator,
        schedule: &Schedule,
        candidate: &PresentAssignment,
    ) {
        let program = schedule.program();
        let period = &program[candidate.period()];
        let wanted = program.course_of(candidate.section()).grades;
        let (Some(allowed), Some(wanted)) = (period.grades, wanted) else {
            return;
        };
        validator.validate_local(allowed.encloses(&wanted), *candidate, || {
            format!(
                "{} is for grades {}-{}, course wants {}-{}",
                period.description, allowed.min, allowed.max, wanted.min, wanted.max
            )
        });
    }
}

/// A teacher keeps at least one lunch period free in each block.
#[derive(Debug, Clone, Copy)]
pub struct Lunch;

impl ScheduleRule for Lunch {
    fn name(&self) -> &'static str {
        "LUNCH"
    }

    fn validate_start(
        &self,
        validator: &mut ScheduleValidator,
        schedule: &Schedule,
        candidate: &StartAssignment,
    ) {
        let program = schedule.program();
        let block = candidate.slot().block;
        let lunches: Vec<PeriodSlot> = program.lunch_periods(block).map(|p| p.slot()).collect();
        if !lunches.iter().any(|&l| candidate.covers(l)) {
            return;
        }
        let free: Vec<PeriodSlot> = lunches
            .into_iter()
            .filter(|&l| !candidate.covers(l))
            .collect();

        for &teacher in program.teachers_for(candidate.section()) {
            if free.is_empty() {
                validator.validate_local(false, *candidate, || {
                    format!("{} covers every lunch period of its block", candidate.section())
                });
                return;
            }
            let others: Vec<StartAssignment> = program
                .sections_for_teacher(teacher)
                .iter()
                .filter(|&&s| s != candidate.section())
                .filter_map(|&s| schedule.assignment_for(s))
                .filter(|a| a.slot().block == block)
                .collect();
            if !free.iter().all(|&l| others.iter().any(|a| a.covers(l))) {
                continue;
            }
            let eating = others
                .into_iter()
                .filter(|a| free.iter().any(|&l| a.covers(l)));
            validator.validate_global(*candidate, eating, || {
                format!("{} would have no lunch", program[teacher].name)
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::ScheduleLogic;
    use crate::models::fixtures::*;
    use crate::models::{
        ClassPeriodId, Course, CourseId, PeriodSpec, ProgramSpec, Room, RoomId, ScheduleFactory,
        Section, SectionId, Teacher, TeacherId, TimeBlockSpec,
    };
    use std::sync::Arc;

    fn factory(spec: ProgramSpec, rule: impl ScheduleRule + 'static) -> ScheduleFactory {
        let logic = ScheduleLogic::new().with_rule(rule);
        ScheduleFactory::new(shared_graph(spec), Arc::new(logic))
    }

    fn at(s: &Schedule, period: u32, room: u32, section: u32) -> StartAssignment {
        let (period, room, section) = (ClassPeriodId(period), RoomId(room), SectionId(section));
        StartAssignment::new(s.program(), period, room, section).unwrap()
    }

    /// Four periods, the middle two lunch, one teacher teaching three courses.
    fn lunch_day() -> ProgramSpec {
        let block = TimeBlockSpec::new(1, "Day")
            .with_period(PeriodSpec::new(1, "11AM"))
            .with_period(PeriodSpec::new(2, "12PM").lunch())
            .with_period(PeriodSpec::new(3, "1PM").lunch())
            .with_period(PeriodSpec::new(4, "2PM"));
        let periods = (1..=4).map(ClassPeriodId);
        let mut spec = ProgramSpec::new("lunch")
            .with_time_block(block)
            .with_teacher(Teacher::new(1, "Tess").with_periods(periods.clone()));
        for r in 1..=3 {
            spec = spec.with_room(Room::new(r, format!("R{r}"), 30).with_periods(periods.clone()));
        }
        for c in 1..=3 {
            spec = spec
                .with_course(
                    Course::new(c, format!("C{c}"))
                        .with_size(10, 20)
                        .with_teacher(TeacherId(1)),
                )
                .with_section(Section::new(c, c, 1));
        }
        spec.with_course(Course::new(4, "Long").with_size(10, 20).with_teacher(TeacherId(1)))
            .with_section(Section::new(4, 4, 2))
    }

    #[test]
    fn test_lunch_keeps_one_free() {
        let f = factory(lunch_day(), Lunch);
        let s = f.empty();
        let (v, s) = s.assign_start(at(&s, 2, 1, 1));
        assert!(v.is_valid());
        // outside lunch: no constraint
        assert!(s.validate(&at(&s, 1, 2, 3)).is_valid());
        // taking the second lunch too leaves Tess none
        let v = s.validate(&at(&s, 3, 2, 2));
        assert_eq!(
            v.conflicting_starts().into_iter().map(|a| a.section()).collect::<Vec<_>>(),
            vec![SectionId(1)]
        );
    }

    #[test]
    fn test_lunch_run_over_every_lunch() {
        let f = factory(lunch_day(), Lunch);
        let s = f.empty();
        assert!(!s.validate(&at(&s, 2, 1, 4)).is_locally_valid());
        assert!(s.validate(&at(&s, 3, 1, 4)).is_valid());
    }

    #[test]
    fn test_lunch_needs_only_one_free_period() {
        let mut spec = lunch_day();
        spec.time_blocks[0].periods[3] = PeriodSpec::new(4, "2PM").lunch();
        let f = factory(spec, Lunch);
        let s = f.empty();
        let (_, s) = s.assign_start(at(&s, 3, 1, 1));
        // 12PM and 1PM taken, 2PM still free: nothing is evicted
        let v = s.validate(&at(&s, 2, 2, 2));
        assert!(v.is_valid(), "{v}");
        let (_, s) = s.assign_start(at(&s, 2, 2, 2));
        // the last free lunch pushes out one of the others covering a lunch
        let v = s.validate(&at(&s, 4, 3, 3));
        assert!(v.is_locally_valid());
        assert_eq!(
            v.conflicting_starts().into_iter().map(|a| a.section()).collect::<Vec<_>>(),
            vec![SectionId(2), SectionId(1)]
        );
        // a run over every lunch of the block is rejected outright
        let long = factory(lunch_day(), Lunch);
        let s = long.empty();
        let v = s.validate(&at(&s, 2, 1, 4));
        assert!(!v.is_locally_valid());
        assert!(v.conflicting_starts().is_empty());
    }

    #[test]
    fn test_prerequisites_order() {
        let mut spec = lunch_day();
        spec.courses[1].prerequisites.push(CourseId(1));
        let f = factory(spec, Prerequisites);
        let s = f.empty();
        // C2 before C1 exists
        assert!(!s.validate(&at(&s, 4, 1, 2)).is_locally_valid());

        let (_, s) = s.assign_start(at(&s, 2, 1, 1));
        assert!(!s.validate(&at(&s, 2, 2, 2)).is_locally_valid());
        assert!(!s.validate(&at(&s, 1, 2, 2)).is_locally_valid());
        assert!(s.validate(&at(&s, 3, 2, 2)).is_valid());
    }

    #[test]
    fn test_grade_range() {
        let mut spec = saturday_morning();
        spec.time_blocks[0].periods[0] = PeriodSpec::new(P10AM, "10AM").with_grades(7, 8);
        spec.courses[2] = spec.courses[2].clone().with_grades(9, 12);
        spec.courses[3] = spec.courses[3].clone().with_grades(7, 8);
        let f = factory(spec, GradeRange);
        let s = f.empty();
        // Math (9-12) can't run in the middle-school period
        assert!(!s.validate(&at(&s, 10, 141, 103)).is_locally_valid());
        assert!(s.validate(&at(&s, 11, 142, 103)).is_valid());
        // Origami (7-8) fits; Zombies has no range
        assert!(s.validate(&at(&s, 10, 142, 104)).is_valid());
        assert!(s.validate(&at(&s, 10, 135, 105)).is_valid());
    }
}
