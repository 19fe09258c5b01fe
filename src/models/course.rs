//! Teachers, courses and sections.
//!
//! A [`Course`] is a logical offering taught by one or more teachers. Each
//! course may run as several [`Section`]s; the section is the unit actually
//! placed on the timetable.

use serde::{Deserialize, Serialize};

use super::{ClassPeriodId, CourseId, GradeRange, PropertyId, ResourceId, RoomId, SectionId};
use super::{TeacherGroupId, TeacherId};

/// A teacher and the periods in which they can teach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub available_periods: Vec<ClassPeriodId>,
}

impl Teacher {
    pub fn new(id: impl Into<TeacherId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            available_periods: Vec::new(),
        }
    }

    /// Sets the periods in which the teacher is available.
    pub fn with_periods(mut self, periods: impl IntoIterator<Item = ClassPeriodId>) -> Self {
        self.available_periods = periods.into_iter().collect();
        self
    }
}

/// A group of teachers with a cap on how many may teach at once.
///
/// Each member teaching in a period counts once toward the cap, so a
/// co-taught section with two members counts twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherGroup {
    pub id: TeacherGroupId,
    #[serde(default)]
    pub name: String,
    pub teachers: Vec<TeacherId>,
    pub cap: u32,
}

impl TeacherGroup {
    pub fn new(id: impl Into<TeacherGroupId>, name: impl Into<String>, cap: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            teachers: Vec::new(),
            cap,
        }
    }

    pub fn with_teacher(mut self, teacher: TeacherId) -> Self {
        self.teachers.push(teacher);
        self
    }
}

/// A course offering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    /// Unique course identifier.
    pub id: CourseId,
    /// Course title.
    #[serde(default)]
    pub title: String,
    /// Expected number of students per section.
    pub estimated_size: u32,
    /// Maximum number of students per section.
    pub max_size: u32,
    /// Teachers who teach every section of this course.
    pub teachers: Vec<TeacherId>,
    /// Room properties every section needs.
    #[serde(default)]
    pub required_properties: Vec<PropertyId>,
    /// Equipment every section needs.
    #[serde(default)]
    pub required_resources: Vec<ResourceId>,
    /// Courses whose sections should run earlier in the same block.
    #[serde(default)]
    pub prerequisites: Vec<CourseId>,
    /// Grades the course is open to. `None` = any.
    #[serde(default)]
    pub grades: Option<GradeRange>,
    /// Rooms the teachers would prefer.
    #[serde(default)]
    pub preferred_rooms: Vec<RoomId>,
}

impl Course {
    pub fn new(id: impl Into<CourseId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            estimated_size: 0,
            max_size: 0,
            teachers: Vec::new(),
            required_properties: Vec::new(),
            required_resources: Vec::new(),
            prerequisites: Vec::new(),
            grades: None,
            preferred_rooms: Vec::new(),
        }
    }

    /// Sets the estimated and maximum class size.
    pub fn with_size(mut self, estimated: u32, max: u32) -> Self {
        self.estimated_size = estimated;
        self.max_size = max;
        self
    }

    pub fn with_teacher(mut self, teacher: TeacherId) -> Self {
        self.teachers.push(teacher);
        self
    }

    pub fn with_required_property(mut self, property: PropertyId) -> Self {
        self.required_properties.push(property);
        self
    }

    pub fn with_required_resource(mut self, resource: ResourceId) -> Self {
        self.required_resources.push(resource);
        self
    }

    pub fn with_prerequisite(mut self, course: CourseId) -> Self {
        self.prerequisites.push(course);
        self
    }

    pub fn with_grades(mut self, min: u32, max: u32) -> Self {
        self.grades = Some(GradeRange::new(min, max));
        self
    }

    pub fn with_preferred_room(mut self, room: RoomId) -> Self {
        self.preferred_rooms.push(room);
        self
    }
}

/// One schedulable instance of a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub course: CourseId,
    /// Number of consecutive periods the section runs for.
    pub period_length: u32,
}

impl Section {
    pub fn new(id: impl Into<SectionId>, course: impl Into<CourseId>, period_length: u32) -> Self {
        Self {
            id: id.into(),
            course: course.into(),
            period_length,
        }
    }
}
