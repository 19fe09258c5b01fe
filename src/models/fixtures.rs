//! Shared test program: three periods on a Saturday morning.
//!
//! | Teacher | Available |      | Room      | Cap | Available     |
//! |---------|-----------|------|-----------|-----|---------------|
//! | Alice   | 10        |      | Harper130 | 75  | 11, 12        |
//! | Bob     | 11        |      | Harper135 | 20  | 10, 11, 12    |
//! | Carol   | 10, 11    |      | Harper141 | 20  | 10, 12        |
//! | Dave    | 10, 11    |      | Harper142 | 20  | 10, 11        |
//! | Ellie   | 10, 11, 12|      |           |     |               |
//!
//! Courses (one section each): Science (1 period, 15, Alice + Carol),
//! Pirates (1, 40, Bob), Math (1, 10, Carol), Origami (2, 10, Dave),
//! Zombies (3, 15, Ellie).

use std::sync::Arc;

use super::*;

pub const MORNING: TimeBlockId = TimeBlockId(1);
pub const P10AM: ClassPeriodId = ClassPeriodId(10);
pub const P11AM: ClassPeriodId = ClassPeriodId(11);
pub const P12PM: ClassPeriodId = ClassPeriodId(12);

pub const ALICE: TeacherId = TeacherId(1);
pub const BOB: TeacherId = TeacherId(2);
pub const CAROL: TeacherId = TeacherId(3);
pub const DAVE: TeacherId = TeacherId(4);
pub const ELLIE: TeacherId = TeacherId(5);

pub const HARPER130: RoomId = RoomId(130);
pub const HARPER135: RoomId = RoomId(135);
pub const HARPER141: RoomId = RoomId(141);
pub const HARPER142: RoomId = RoomId(142);

pub const SCIENCE: CourseId = CourseId(1);
pub const PIRATES: CourseId = CourseId(2);
pub const MATH: CourseId = CourseId(3);
pub const ORIGAMI: CourseId = CourseId(4);
pub const ZOMBIES: CourseId = CourseId(5);

pub const SCIENCE_1: SectionId = SectionId(101);
pub const PIRATES_1: SectionId = SectionId(102);
pub const MATH_1: SectionId = SectionId(103);
pub const ORIGAMI_1: SectionId = SectionId(104);
pub const ZOMBIES_1: SectionId = SectionId(105);

fn course(id: CourseId, title: &str, size: u32, teachers: &[TeacherId]) -> Course {
    teachers
        .iter()
        .fold(Course::new(id, title).with_size(size, size), |c, &t| {
            c.with_teacher(t)
        })
}

pub fn saturday_morning() -> ProgramSpec {
    ProgramSpec::new("Saturday Morning")
        .with_time_block(
            TimeBlockSpec::new(MORNING, "Saturday Morning")
                .with_period(PeriodSpec::new(P10AM, "10AM"))
                .with_period(PeriodSpec::new(P11AM, "11AM"))
                .with_period(PeriodSpec::new(P12PM, "12PM")),
        )
        .with_teacher(Teacher::new(ALICE, "Alice").with_periods([P10AM]))
        .with_teacher(Teacher::new(BOB, "Bob").with_periods([P11AM]))
        .with_teacher(Teacher::new(CAROL, "Carol").with_periods([P10AM, P11AM]))
        .with_teacher(Teacher::new(DAVE, "Dave").with_periods([P10AM, P11AM]))
        .with_teacher(Teacher::new(ELLIE, "Ellie").with_periods([P10AM, P11AM, P12PM]))
        .with_room(Room::new(HARPER130, "Harper130", 75).with_periods([P11AM, P12PM]))
        .with_room(Room::new(HARPER135, "Harper135", 20).with_periods([P10AM, P11AM, P12PM]))
        .with_room(Room::new(HARPER141, "Harper141", 20).with_periods([P10AM, P12PM]))
        .with_room(Room::new(HARPER142, "Harper142", 20).with_periods([P10AM, P11AM]))
        .with_course(course(SCIENCE, "Science", 15, &[ALICE, CAROL]))
        .with_course(course(PIRATES, "Pirates", 40, &[BOB]))
        .with_course(course(MATH, "Math", 10, &[CAROL]))
        .with_course(course(ORIGAMI, "Origami", 10, &[DAVE]))
        .with_course(course(ZOMBIES, "Zombies", 15, &[ELLIE]))
        .with_section(Section::new(SCIENCE_1, SCIENCE, 1))
        .with_section(Section::new(PIRATES_1, PIRATES, 1))
        .with_section(Section::new(MATH_1, MATH, 1))
        .with_section(Section::new(ORIGAMI_1, ORIGAMI, 2))
        .with_section(Section::new(ZOMBIES_1, ZOMBIES, 3))
}

pub fn saturday_morning_graph() -> ProgramGraph {
    ProgramGraph::new(saturday_morning()).unwrap()
}

pub fn shared_graph(spec: ProgramSpec) -> Arc<ProgramGraph> {
    Arc::new(ProgramGraph::new(spec).unwrap())
}
