//! Room-side resources: rooms, buildings, room properties, equipment.
//!
//! Rooms are where sections run. A room offers a seating capacity, a set
//! of periods in which it may be used, descriptive properties (e.g. "has
//! sinks") and equipment resources (e.g. "projector").
//!
//! # Binding
//! A *binding* property or resource reserves its room: only sections whose
//! course explicitly requires it may use the room. A *floating* resource is
//! one a room does not supply itself; sections needing it draw from a
//! program-wide pool of `floating_count` units per period.

use serde::{Deserialize, Serialize};

use super::{BuildingId, ClassPeriodId, PropertyId, ResourceId, RoomId};

/// A room in which sections can be scheduled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Unique room identifier.
    pub id: RoomId,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Seating capacity.
    pub capacity: u32,
    /// Periods in which the room may be used.
    #[serde(default)]
    pub available_periods: Vec<ClassPeriodId>,
    /// Descriptive properties of the room.
    #[serde(default)]
    pub properties: Vec<PropertyId>,
    /// Equipment permanently present in the room.
    #[serde(default)]
    pub resources: Vec<ResourceId>,
    /// Building the room belongs to.
    #[serde(default)]
    pub building: Option<BuildingId>,
}

impl Room {
    /// Creates a room with the given capacity and no availability.
    pub fn new(id: impl Into<RoomId>, name: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            capacity,
            available_periods: Vec::new(),
            properties: Vec::new(),
            resources: Vec::new(),
            building: None,
        }
    }

    /// Sets the periods in which the room is available.
    pub fn with_periods(mut self, periods: impl IntoIterator<Item = ClassPeriodId>) -> Self {
        self.available_periods = periods.into_iter().collect();
        self
    }

    /// Adds a room property.
    pub fn with_property(mut self, property: PropertyId) -> Self {
        self.properties.push(property);
        self
    }

    /// Adds a resource the room supplies.
    pub fn with_resource(mut self, resource: ResourceId) -> Self {
        self.resources.push(resource);
        self
    }

    /// Places the room in a building.
    pub fn in_building(mut self, building: BuildingId) -> Self {
        self.building = Some(building);
        self
    }
}

/// A building grouping rooms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    #[serde(default)]
    pub name: String,
}

impl Building {
    pub fn new(id: impl Into<BuildingId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A descriptive room property that courses may require.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomProperty {
    pub id: PropertyId,
    #[serde(default)]
    pub description: String,
    /// Rooms with a binding property host only courses requiring it.
    #[serde(default)]
    pub binding: bool,
}

impl RoomProperty {
    pub fn new(id: impl Into<PropertyId>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            binding: false,
        }
    }

    /// Makes the property binding.
    pub fn binding(mut self) -> Self {
        self.binding = true;
        self
    }
}

/// A piece of equipment that courses may require.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    #[serde(default)]
    pub description: String,
    /// Rooms supplying a binding resource host only courses requiring it.
    #[serde(default)]
    pub binding: bool,
    /// Units available per period to sections whose room lacks the resource.
    #[serde(default)]
    pub floating_count: u32,
}

impl Resource {
    pub fn new(id: impl Into<ResourceId>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            binding: false,
            floating_count: 0,
        }
    }

    /// Makes the resource binding.
    pub fn binding(mut self) -> Self {
        self.binding = true;
        self
    }

    /// Sets the size of the floating pool.
    pub fn with_floating(mut self, count: u32) -> Self {
        self.floating_count = count;
        self
    }
}
