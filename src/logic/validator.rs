//! Validation outcome accumulated by a rule chain.

use log::{debug, trace};
use std::collections::BTreeSet;
use std::fmt;

use crate::models::{PresentAssignment, StartAssignment};

/// What a rule is looking at: the whole run, or one period of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    Start(StartAssignment),
    Present(PresentAssignment),
}

impl From<StartAssignment> for Candidate {
    fn from(start: StartAssignment) -> Self {
        Candidate::Start(start)
    }
}

impl From<PresentAssignment> for Candidate {
    fn from(present: PresentAssignment) -> Self {
        Candidate::Present(present)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Candidate::Start(s) => fmt::Display::fmt(s, f),
            Candidate::Present(p) => fmt::Display::fmt(p, f),
        }
    }
}

/// A defect of the candidate itself. Removing other assignments cannot fix it.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalConflict {
    pub rule: &'static str,
    pub candidate: Candidate,
    pub explanation: String,
}

/// A clash between the candidate and specific scheduled assignments.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalConflict {
    pub rule: &'static str,
    pub candidate: Candidate,
    pub conflicts: BTreeSet<StartAssignment>,
    pub explanation: String,
}

/// Collects local and global conflicts for one candidate start.
///
/// Rules never fail; they report into a validator through
/// [`validate_local`](Self::validate_local) and
/// [`validate_global`](Self::validate_global).
#[derive(Debug, Clone)]
pub struct ScheduleValidator {
    candidate: StartAssignment,
    rule: &'static str,
    exempt_local: bool,
    local: Vec<LocalConflict>,
    global: Vec<GlobalConflict>,
}

impl ScheduleValidator {
    pub fn new(candidate: StartAssignment) -> Self {
        Self {
            candidate,
            rule: "",
            exempt_local: false,
            local: Vec::new(),
            global: Vec::new(),
        }
    }

    /// A validator that ignores local conflicts, for locked placements.
    pub(crate) fn exempt_from_local(candidate: StartAssignment) -> Self {
        Self {
            exempt_local: true,
            ..Self::new(candidate)
        }
    }

    /// Names the rule whose findings follow.
    pub(crate) fn enter_rule(&mut self, rule: &'static str) {
        self.rule = rule;
    }

    /// The start assignment under validation.
    pub fn candidate(&self) -> StartAssignment {
        self.candidate
    }

    /// Records a local conflict unless `condition` holds.
    pub fn validate_local(
        &mut self,
        condition: bool,
        candidate: impl Into<Candidate>,
        explanation: impl FnOnce() -> String,
    ) {
        let candidate = candidate.into();
        trace!("[{}] local check on {candidate}: {condition}", self.rule);
        if condition || self.exempt_local {
            return;
        }
        let conflict = LocalConflict {
            rule: self.rule,
            candidate,
            explanation: explanation(),
        };
        debug!("[{}] {}: {}", conflict.rule, conflict.candidate, conflict.explanation);
        self.local.push(conflict);
    }

    /// Records a global conflict if `conflicts` is non-empty.
    pub fn validate_global(
        &mut self,
        candidate: impl Into<Candidate>,
        conflicts: impl IntoIterator<Item = StartAssignment>,
        explanation: impl FnOnce() -> String,
    ) {
        let candidate = candidate.into();
        let conflicts: BTreeSet<_> = conflicts.into_iter().collect();
        trace!("[{}] global check on {candidate}: {} clash(es)", self.rule, conflicts.len());
        if conflicts.is_empty() {
            return;
        }
        let conflict = GlobalConflict {
            rule: self.rule,
            candidate,
            conflicts,
            explanation: explanation(),
        };
        debug!("[{}] {}: {}", conflict.rule, conflict.candidate, conflict.explanation);
        self.global.push(conflict);
    }

    /// No local and no global conflicts.
    pub fn is_valid(&self) -> bool {
        self.local.is_empty() && self.global.is_empty()
    }

    /// No local conflicts; global conflicts may remain.
    pub fn is_locally_valid(&self) -> bool {
        self.local.is_empty()
    }

    pub fn local_conflicts(&self) -> &[LocalConflict] {
        &self.local
    }

    pub fn global_conflicts(&self) -> &[GlobalConflict] {
        &self.global
    }

    /// Union of every assignment named by a global conflict.
    pub fn conflicting_starts(&self) -> BTreeSet<StartAssignment> {
        self.global
            .iter()
            .flat_map(|g| g.conflicts.iter().copied())
            .collect()
    }
}

impl fmt::Display for ScheduleValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return write!(f, "{} is valid", self.candidate);
        }
        let mut first = true;
        for c in &self.local {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{}: {}", c.rule, c.explanation)?;
        }
        for c in &self.global {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{}: {} (", c.rule, c.explanation)?;
            for (i, s) in c.conflicts.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{s}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::*;

    #[test]
    fn test_local_and_global() {
        let g = saturday_morning_graph();
        let math = StartAssignment::new(&g, P10AM, HARPER141, MATH_1).unwrap();
        let origami = StartAssignment::new(&g, P10AM, HARPER142, ORIGAMI_1).unwrap();
        let science = StartAssignment::new(&g, P10AM, HARPER142, SCIENCE_1).unwrap();

        let mut v = ScheduleValidator::new(science);
        v.enter_rule("TEST");
        v.validate_local(true, science, || unreachable!());
        v.validate_global(science, [], || unreachable!());
        assert!(v.is_valid());

        v.validate_global(science, [math], || "teacher".into());
        v.validate_global(science, [math, origami], || "room".into());
        assert!(!v.is_valid());
        assert!(v.is_locally_valid());
        assert_eq!(v.conflicting_starts().len(), 2);

        v.validate_local(false, science, || "bad".into());
        assert!(!v.is_locally_valid());
        assert_eq!(v.local_conflicts()[0].rule, "TEST");
        assert!(v.to_string().contains("bad"));
    }

    #[test]
    fn test_exempt_ignores_local() {
        let g = saturday_morning_graph();
        let math = StartAssignment::new(&g, P10AM, HARPER141, MATH_1).unwrap();
        let mut v = ScheduleValidator::exempt_from_local(math);
        v.validate_local(false, math, || "ignored".into());
        assert!(v.is_valid());
    }
}
