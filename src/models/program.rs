//! The immutable program graph.
//!
//! A [`ProgramGraph`] owns every entity of one program in per-kind arenas
//! and answers availability and compatibility queries over them. It is
//! built once from a [`ProgramSpec`], validated eagerly, and then shared
//! read-only (behind an `Arc`) by every schedule and optimizer thread.
//!
//! # Caching
//! Derived sets (availability, compatible periods and rooms) are computed
//! on first use and memoized in `OnceLock` cells. The graph never changes,
//! so the caches are never invalidated.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;
use std::ops::Index;
use std::sync::OnceLock;

use super::{
    Building, BuildingId, ClassPeriod, ClassPeriodId, Course, CourseId, EntityKind, PeriodSlot,
    PropertyId, Resource, ResourceId, Room, RoomId, RoomProperty, Section, SectionId, Teacher,
    TeacherGroup, TeacherGroupId, TeacherId, TimeBlock, TimeBlockId, TimeBlockSpec,
};
use crate::error::{ConfigError, GraphIntegrityError};
use crate::validation::check_integrity;

/// Flat construction record for a [`ProgramGraph`].
///
/// Every entity carries its own id; relationships are expressed as ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub buildings: Vec<Building>,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub time_blocks: Vec<TimeBlockSpec>,
    #[serde(default)]
    pub properties: Vec<RoomProperty>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub teacher_groups: Vec<TeacherGroup>,
}

impl ProgramSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parses a construction record from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_teacher(mut self, teacher: Teacher) -> Self {
        self.teachers.push(teacher);
        self
    }

    pub fn with_room(mut self, room: Room) -> Self {
        self.rooms.push(room);
        self
    }

    pub fn with_building(mut self, building: Building) -> Self {
        self.buildings.push(building);
        self
    }

    pub fn with_course(mut self, course: Course) -> Self {
        self.courses.push(course);
        self
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    pub fn with_time_block(mut self, block: TimeBlockSpec) -> Self {
        self.time_blocks.push(block);
        self
    }

    pub fn with_property(mut self, property: RoomProperty) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn with_teacher_group(mut self, group: TeacherGroup) -> Self {
        self.teacher_groups.push(group);
        self
    }
}

/// Entities stored densely with an id → position index.
#[derive(Debug, Clone)]
struct Arena<I, T> {
    items: Vec<T>,
    index: HashMap<I, usize>,
}

impl<I: Copy + Eq + Hash, T> Arena<I, T> {
    fn new(items: Vec<T>, id: impl Fn(&T) -> I) -> Self {
        let index = items.iter().enumerate().map(|(i, t)| (id(t), i)).collect();
        Self { items, index }
    }

    #[inline]
    fn position(&self, id: I) -> Option<usize> {
        self.index.get(&id).copied()
    }

    #[inline]
    fn get(&self, id: I) -> Option<&T> {
        self.position(id).map(|i| &self.items[i])
    }
}

/// Either side of an availability query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodOwner {
    Teacher(TeacherId),
    Room(RoomId),
}

/// A borrowed entity of any kind, as returned by [`ProgramGraph::entity`].
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    Teacher(&'a Teacher),
    Room(&'a Room),
    Building(&'a Building),
    Course(&'a Course),
    Section(&'a Section),
    TimeBlock(&'a TimeBlock),
    ClassPeriod(&'a ClassPeriod),
    Property(&'a RoomProperty),
    Resource(&'a Resource),
    TeacherGroup(&'a TeacherGroup),
}

/// Immutable, validated program graph.
#[derive(Debug)]
pub struct ProgramGraph {
    name: String,
    teachers: Arena<TeacherId, Teacher>,
    rooms: Arena<RoomId, Room>,
    buildings: Arena<BuildingId, Building>,
    courses: Arena<CourseId, Course>,
    sections: Arena<SectionId, Section>,
    blocks: Arena<TimeBlockId, TimeBlock>,
    periods: Arena<ClassPeriodId, ClassPeriod>,
    properties: Arena<PropertyId, RoomProperty>,
    resources: Arena<ResourceId, Resource>,
    groups: Arena<TeacherGroupId, TeacherGroup>,

    sections_by_course: HashMap<CourseId, Vec<SectionId>>,
    sections_by_teacher: HashMap<TeacherId, Vec<SectionId>>,
    groups_by_teacher: HashMap<TeacherId, Vec<TeacherGroupId>>,

    teacher_periods: Vec<OnceLock<BTreeSet<ClassPeriodId>>>,
    room_periods: Vec<OnceLock<BTreeSet<ClassPeriodId>>>,
    compatible_periods: Vec<OnceLock<BTreeSet<ClassPeriodId>>>,
    compatible_rooms: Vec<OnceLock<Vec<RoomId>>>,
}

impl ProgramGraph {
    /// Validates a construction record and builds the graph.
    ///
    /// # Errors
    /// The first [`GraphIntegrityError`] found; see [`check_integrity`].
    pub fn new(spec: ProgramSpec) -> Result<Self, GraphIntegrityError> {
        check_integrity(&spec)?;

        let mut blocks = Vec::with_capacity(spec.time_blocks.len());
        let mut periods = Vec::new();
        for block in &spec.time_blocks {
            let ids = block.periods.iter().map(|p| p.id).collect();
            for (index, period) in block.periods.iter().enumerate() {
                periods.push(ClassPeriod::from_spec(period, block.id, index as u32));
            }
            blocks.push(TimeBlock {
                id: block.id,
                description: block.description.clone(),
                periods: ids,
            });
        }

        let mut sections_by_course: HashMap<CourseId, Vec<SectionId>> = HashMap::new();
        let mut sections_by_teacher: HashMap<TeacherId, Vec<SectionId>> = HashMap::new();
        let course_teachers: HashMap<CourseId, &[TeacherId]> = spec
            .courses
            .iter()
            .map(|c| (c.id, c.teachers.as_slice()))
            .collect();
        for section in &spec.sections {
            sections_by_course
                .entry(section.course)
                .or_default()
                .push(section.id);
            for &teacher in course_teachers.get(&section.course).copied().unwrap_or(&[]) {
                sections_by_teacher.entry(teacher).or_default().push(section.id);
            }
        }

        let mut groups_by_teacher: HashMap<TeacherId, Vec<TeacherGroupId>> = HashMap::new();
        for group in &spec.teacher_groups {
            for &teacher in &group.teachers {
                groups_by_teacher.entry(teacher).or_default().push(group.id);
            }
        }

        let teacher_periods = lazy_cells(spec.teachers.len());
        let room_periods = lazy_cells(spec.rooms.len());
        let compatible_periods = lazy_cells(spec.sections.len());
        let compatible_rooms = lazy_cells(spec.sections.len());

        Ok(Self {
            name: spec.name,
            teachers: Arena::new(spec.teachers, |t| t.id),
            rooms: Arena::new(spec.rooms, |r| r.id),
            buildings: Arena::new(spec.buildings, |b| b.id),
            courses: Arena::new(spec.courses, |c| c.id),
            sections: Arena::new(spec.sections, |s| s.id),
            blocks: Arena::new(blocks, |b| b.id),
            periods: Arena::new(periods, |p| p.id),
            properties: Arena::new(spec.properties, |p| p.id),
            resources: Arena::new(spec.resources, |r| r.id),
            groups: Arena::new(spec.teacher_groups, |g| g.id),
            sections_by_course,
            sections_by_teacher,
            groups_by_teacher,
            teacher_periods,
            room_periods,
            compatible_periods,
            compatible_rooms,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ======================== Lookup ========================

    /// Looks up an entity of any kind by raw id.
    pub fn entity(&self, kind: EntityKind, id: u32) -> Option<EntityRef<'_>> {
        match kind {
            EntityKind::Teacher => self.teachers.get(TeacherId(id)).map(EntityRef::Teacher),
            EntityKind::Room => self.rooms.get(RoomId(id)).map(EntityRef::Room),
            EntityKind::Building => self.buildings.get(BuildingId(id)).map(EntityRef::Building),
            EntityKind::Course => self.courses.get(CourseId(id)).map(EntityRef::Course),
            EntityKind::Section => self.sections.get(SectionId(id)).map(EntityRef::Section),
            EntityKind::TimeBlock => self.blocks.get(TimeBlockId(id)).map(EntityRef::TimeBlock),
            EntityKind::ClassPeriod => self
                .periods
                .get(ClassPeriodId(id))
                .map(EntityRef::ClassPeriod),
            EntityKind::Property => self.properties.get(PropertyId(id)).map(EntityRef::Property),
            EntityKind::Resource => self.resources.get(ResourceId(id)).map(EntityRef::Resource),
            EntityKind::TeacherGroup => self
                .groups
                .get(TeacherGroupId(id))
                .map(EntityRef::TeacherGroup),
        }
    }

    pub fn get_teacher(&self, id: TeacherId) -> Option<&Teacher> {
        self.teachers.get(id)
    }

    pub fn get_room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn get_course(&self, id: CourseId) -> Option<&Course> {
        self.courses.get(id)
    }

    pub fn get_section(&self, id: SectionId) -> Option<&Section> {
        self.sections.get(id)
    }

    pub fn get_time_block(&self, id: TimeBlockId) -> Option<&TimeBlock> {
        self.blocks.get(id)
    }

    pub fn get_period(&self, id: ClassPeriodId) -> Option<&ClassPeriod> {
        self.periods.get(id)
    }

    pub fn get_building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(id)
    }

    pub fn get_resource(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn get_property(&self, id: PropertyId) -> Option<&RoomProperty> {
        self.properties.get(id)
    }

    pub fn get_teacher_group(&self, id: TeacherGroupId) -> Option<&TeacherGroup> {
        self.groups.get(id)
    }

    // ======================== Iteration ========================

    pub fn teachers(&self) -> &[Teacher] {
        &self.teachers.items
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms.items
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses.items
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections.items
    }

    pub fn time_blocks(&self) -> &[TimeBlock] {
        &self.blocks.items
    }

    /// All periods, grouped by block in construction order.
    pub fn periods(&self) -> &[ClassPeriod] {
        &self.periods.items
    }

    pub fn teacher_groups(&self) -> &[TeacherGroup] {
        &self.groups.items
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources.items
    }

    // ======================== Relations ========================

    /// The course a section belongs to.
    #[inline]
    pub fn course_of(&self, section: SectionId) -> &Course {
        &self[self[section].course]
    }

    /// Teachers of a section (the teachers of its course).
    #[inline]
    pub fn teachers_for(&self, section: SectionId) -> &[TeacherId] {
        &self.course_of(section).teachers
    }

    pub fn sections_of_course(&self, course: CourseId) -> &[SectionId] {
        self.sections_by_course
            .get(&course)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn sections_for_teacher(&self, teacher: TeacherId) -> &[SectionId] {
        self.sections_by_teacher
            .get(&teacher)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Teacher groups a teacher belongs to.
    pub fn groups_of(&self, teacher: TeacherId) -> &[TeacherGroupId] {
        self.groups_by_teacher
            .get(&teacher)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn prerequisites(&self, section: SectionId) -> &[CourseId] {
        &self.course_of(section).prerequisites
    }

    pub fn required_properties(&self, section: SectionId) -> &[PropertyId] {
        &self.course_of(section).required_properties
    }

    pub fn room_properties(&self, room: RoomId) -> &[PropertyId] {
        &self[room].properties
    }

    /// Properties of a room that reserve it for courses requiring them.
    pub fn binding_properties(&self, room: RoomId) -> impl Iterator<Item = PropertyId> + '_ {
        self[room]
            .properties
            .iter()
            .copied()
            .filter(move |&p| self.properties.get(p).is_some_and(|prop| prop.binding))
    }

    pub fn resource_requirements(&self, section: SectionId) -> &[ResourceId] {
        &self.course_of(section).required_resources
    }

    pub fn room_resources(&self, room: RoomId) -> &[ResourceId] {
        &self[room].resources
    }

    /// Resources of a room that reserve it for courses requiring them.
    pub fn binding_resources(&self, room: RoomId) -> impl Iterator<Item = ResourceId> + '_ {
        self[room]
            .resources
            .iter()
            .copied()
            .filter(move |&r| self.resources.get(r).is_some_and(|res| res.binding))
    }

    // ======================== Timeline ========================

    /// The period at a slot, if the slot lies inside its block.
    pub fn period_at(&self, slot: PeriodSlot) -> Option<ClassPeriodId> {
        self.blocks
            .get(slot.block)
            .and_then(|b| b.periods.get(slot.index as usize))
            .copied()
    }

    /// The timeline slot of a period.
    #[inline]
    pub fn slot_of(&self, period: ClassPeriodId) -> PeriodSlot {
        self[period].slot()
    }

    /// `count` consecutive periods starting at `period`, or `None` if they
    /// would run past the end of the block.
    pub fn tail_periods(&self, period: ClassPeriodId, count: u32) -> Option<&[ClassPeriodId]> {
        let slot = self.slot_of(period);
        let start = slot.index as usize;
        self[slot.block].periods.get(start..start + count as usize)
    }

    /// Lunch periods of a block, in order.
    pub fn lunch_periods(&self, block: TimeBlockId) -> impl Iterator<Item = &ClassPeriod> + '_ {
        self[block]
            .periods
            .iter()
            .map(move |&p| &self[p])
            .filter(|p| p.is_lunch)
    }

    // ======================== Availability ========================

    /// Periods in which a teacher or room is available.
    pub fn available_periods(&self, owner: PeriodOwner) -> &BTreeSet<ClassPeriodId> {
        match owner {
            PeriodOwner::Teacher(id) => {
                let pos =
                    self.position_or_panic(self.teachers.position(id), EntityKind::Teacher, id.0);
                self.teacher_periods[pos].get_or_init(|| {
                    self.teachers.items[pos]
                        .available_periods
                        .iter()
                        .copied()
                        .collect()
                })
            }
            PeriodOwner::Room(id) => {
                let pos = self.position_or_panic(self.rooms.position(id), EntityKind::Room, id.0);
                self.room_periods[pos].get_or_init(|| {
                    self.rooms.items[pos]
                        .available_periods
                        .iter()
                        .copied()
                        .collect()
                })
            }
        }
    }

    /// Periods in which every teacher of the section is available.
    ///
    /// A section without teachers is compatible with every period.
    pub fn compatible_periods(&self, section: SectionId) -> &BTreeSet<ClassPeriodId> {
        let pos = self.section_position(section);
        self.compatible_periods[pos].get_or_init(|| {
            let mut periods: BTreeSet<ClassPeriodId> =
                self.periods.items.iter().map(|p| p.id).collect();
            for &teacher in self.teachers_for(section) {
                let available = self.available_periods(PeriodOwner::Teacher(teacher));
                periods.retain(|p| available.contains(p));
            }
            periods
        })
    }

    /// Whether a room can host a section at all.
    ///
    /// The room must seat the course's estimated size, offer every required
    /// property, and carry no binding property the course doesn't require.
    pub fn is_compatible(&self, section: SectionId, room: RoomId) -> bool {
        let course = self.course_of(section);
        let r = &self[room];
        r.capacity >= course.estimated_size
            && course
                .required_properties
                .iter()
                .all(|p| r.properties.contains(p))
            && self
                .binding_properties(room)
                .all(|p| course.required_properties.contains(&p))
    }

    /// Rooms compatible with a section, in room order.
    pub fn compatible_rooms(&self, section: SectionId) -> &[RoomId] {
        let pos = self.section_position(section);
        self.compatible_rooms[pos].get_or_init(|| {
            self.rooms
                .items
                .iter()
                .map(|r| r.id)
                .filter(|&r| self.is_compatible(section, r))
                .collect()
        })
    }

    fn section_position(&self, section: SectionId) -> usize {
        self.position_or_panic(self.sections.position(section), EntityKind::Section, section.0)
    }

    fn position_or_panic(&self, pos: Option<usize>, kind: EntityKind, id: u32) -> usize {
        match pos {
            Some(pos) => pos,
            None => panic!("{kind} {id} is not part of program '{}'", self.name),
        }
    }
}

fn lazy_cells<T>(n: usize) -> Vec<OnceLock<T>> {
    (0..n).map(|_| OnceLock::new()).collect()
}

macro_rules! index_by_id {
    ($id:ty, $entity:ty, $field:ident, $kind:expr) => {
        impl Index<$id> for ProgramGraph {
            type Output = $entity;

            /// # Panics
            /// If the id is not part of this graph.
            fn index(&self, id: $id) -> &$entity {
                match self.$field.get(id) {
                    Some(entity) => entity,
                    None => panic!("{} {} is not part of program '{}'", $kind, id.0, self.name),
                }
            }
        }
    };
}

index_by_id!(TeacherId, Teacher, teachers, EntityKind::Teacher);
index_by_id!(RoomId, Room, rooms, EntityKind::Room);
index_by_id!(BuildingId, Building, buildings, EntityKind::Building);
index_by_id!(CourseId, Course, courses, EntityKind::Course);
index_by_id!(SectionId, Section, sections, EntityKind::Section);
index_by_id!(TimeBlockId, TimeBlock, blocks, EntityKind::TimeBlock);
index_by_id!(ClassPeriodId, ClassPeriod, periods, EntityKind::ClassPeriod);
index_by_id!(PropertyId, RoomProperty, properties, EntityKind::Property);
index_by_id!(ResourceId, Resource, resources, EntityKind::Resource);
index_by_id!(TeacherGroupId, TeacherGroup, groups, EntityKind::TeacherGroup);
