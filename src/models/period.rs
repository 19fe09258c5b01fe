//! Time blocks and class periods.
//!
//! A program's timeline is a set of disjoint time blocks (e.g. "Saturday
//! Morning"), each an ordered run of class periods. A section occupies a
//! contiguous run of periods inside one block; it never spans blocks.
//!
//! # Ordering
//! Periods order by `(block, index)`; see [`PeriodSlot`].

use serde::{Deserialize, Serialize};

use super::{ClassPeriodId, PeriodSlot, TimeBlockId};

/// A closed range of grade levels `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeRange {
    pub min: u32,
    pub max: u32,
}

impl GradeRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Whether `other` lies entirely within this range.
    #[inline]
    pub fn encloses(&self, other: &GradeRange) -> bool {
        self.min <= other.min && other.max <= self.max
    }
}

fn default_attendance() -> f64 {
    1.0
}

/// One period as it appears in the construction record.
///
/// The owning block and the index within it are implied by position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodSpec {
    /// Unique period identifier.
    pub id: ClassPeriodId,
    /// Human-readable label, e.g. "10AM".
    #[serde(default)]
    pub description: String,
    /// Whether this is a lunch period.
    #[serde(default)]
    pub is_lunch: bool,
    /// Grades allowed to attend during this period. `None` = unrestricted.
    #[serde(default)]
    pub grades: Option<GradeRange>,
    /// Expected fraction of students in attendance.
    #[serde(default = "default_attendance")]
    pub attendance_ratio: f64,
}

impl PeriodSpec {
    pub fn new(id: impl Into<ClassPeriodId>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            is_lunch: false,
            grades: None,
            attendance_ratio: 1.0,
        }
    }

    /// Marks this period as lunch.
    pub fn lunch(mut self) -> Self {
        self.is_lunch = true;
        self
    }

    /// Restricts attendance to a grade range.
    pub fn with_grades(mut self, min: u32, max: u32) -> Self {
        self.grades = Some(GradeRange::new(min, max));
        self
    }

    /// Sets the expected attendance ratio.
    pub fn with_attendance(mut self, ratio: f64) -> Self {
        self.attendance_ratio = ratio;
        self
    }
}

/// A time block as it appears in the construction record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeBlockSpec {
    pub id: TimeBlockId,
    #[serde(default)]
    pub description: String,
    /// Periods in chronological order.
    pub periods: Vec<PeriodSpec>,
}

impl TimeBlockSpec {
    pub fn new(id: impl Into<TimeBlockId>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            periods: Vec::new(),
        }
    }

    /// Appends a period to the end of the block.
    pub fn with_period(mut self, period: PeriodSpec) -> Self {
        self.periods.push(period);
        self
    }
}

/// A contiguous block of class periods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeBlock {
    pub id: TimeBlockId,
    pub description: String,
    /// Period ids in chronological order.
    pub periods: Vec<ClassPeriodId>,
}

impl TimeBlock {
    /// Number of periods in this block.
    #[inline]
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

/// A single class period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassPeriod {
    pub id: ClassPeriodId,
    /// Owning time block.
    pub block: TimeBlockId,
    /// Zero-based position within the block.
    pub index: u32,
    pub description: String,
    pub is_lunch: bool,
    pub grades: Option<GradeRange>,
    pub attendance_ratio: f64,
}

impl ClassPeriod {
    pub(crate) fn from_spec(spec: &PeriodSpec, block: TimeBlockId, index: u32) -> Self {
        Self {
            id: spec.id,
            block,
            index,
            description: spec.description.clone(),
            is_lunch: spec.is_lunch,
            grades: spec.grades,
            attendance_ratio: spec.attendance_ratio,
        }
    }

    /// Position of this period in the program timeline.
    #[inline]
    pub fn slot(&self) -> PeriodSlot {
        PeriodSlot::new(self.block, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_range_encloses() {
        let wide = GradeRange::new(7, 12);
        assert!(wide.encloses(&GradeRange::new(9, 10)));
        assert!(wide.encloses(&wide));
        assert!(!wide.encloses(&GradeRange::new(6, 8)));
        assert!(!GradeRange::new(9, 10).encloses(&wide));
    }

    #[test]
    fn test_block_builder() {
        let block = TimeBlockSpec::new(1, "Morning")
            .with_period(PeriodSpec::new(10, "10AM"))
            .with_period(PeriodSpec::new(11, "11AM").lunch().with_grades(9, 12));
        assert_eq!(block.periods.len(), 2);
        assert!(block.periods[1].is_lunch);
        assert_eq!(block.periods[1].grades, Some(GradeRange::new(9, 12)));
        assert!((block.periods[0].attendance_ratio - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_period_spec_serde_defaults() {
        let spec: PeriodSpec = serde_json::from_str(r#"{"id": 5}"#).unwrap();
        assert_eq!(spec.id, ClassPeriodId(5));
        assert!(!spec.is_lunch);
        assert!((spec.attendance_ratio - 1.0).abs() < 1e-10);
    }
}
