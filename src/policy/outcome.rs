//! Resolved policy outcomes.

use serde::Serialize;
use std::fmt;

/// Result of resolving one or more policy triggers against a supported SDK range.
///
/// A `Split` means that both behaviours really happen: the application exhibits `below` on
/// devices running an API level lower than `trigger`, and `above` on devices running `trigger`
/// or higher. Splits nest when a rule resolves a second, higher trigger inside one branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyOutcome<T> {
    /// The behaviour is uniform across the supported range.
    Single(T),
    /// The supported range straddles `trigger`.
    Split {
        /// API level where the behaviour changes.
        trigger: u32,
        /// Behaviour below `trigger`.
        below: Box<PolicyOutcome<T>>,
        /// Behaviour at or above `trigger`.
        above: Box<PolicyOutcome<T>>,
    },
}

impl<T> PolicyOutcome<T> {
    /// Creates a split outcome at the given trigger.
    pub fn split(trigger: u32, below: Self, above: Self) -> Self {
        Self::Split {
            trigger,
            below: Box::new(below),
            above: Box::new(above),
        }
    }

    /// Checks if the outcome depends on the device API level.
    pub fn is_split(&self) -> bool {
        matches!(self, Self::Split { .. })
    }

    /// Gets the value of a uniform outcome.
    pub fn as_single(&self) -> Option<&T> {
        match self {
            Self::Single(value) => Some(value),
            Self::Split { .. } => None,
        }
    }

    /// Lists every reachable value, from the lowest API level to the highest.
    pub fn values(&self) -> Vec<&T> {
        let mut values = Vec::new();
        self.collect_values(&mut values);
        values
    }

    fn collect_values<'a>(&'a self, values: &mut Vec<&'a T>) {
        match self {
            Self::Single(value) => values.push(value),
            Self::Split { below, above, .. } => {
                below.collect_values(values);
                above.collect_values(values);
            }
        }
    }

    /// Checks if the predicate holds on at least one reachable API level.
    pub fn any<F>(&self, mut predicate: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        self.values().into_iter().any(|v| predicate(v))
    }

    /// Checks if the predicate holds on every reachable API level.
    pub fn all<F>(&self, mut predicate: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        self.values().into_iter().all(|v| predicate(v))
    }

    /// Transforms every value of the outcome, keeping its shape.
    pub fn map<U, F>(self, mut f: F) -> PolicyOutcome<U>
    where
        F: FnMut(T) -> U,
    {
        self.map_inner(&mut f)
    }

    fn map_inner<U, F>(self, f: &mut F) -> PolicyOutcome<U>
    where
        F: FnMut(T) -> U,
    {
        match self {
            Self::Single(value) => PolicyOutcome::Single(f(value)),
            Self::Split {
                trigger,
                below,
                above,
            } => PolicyOutcome::split(trigger, below.map_inner(f), above.map_inner(f)),
        }
    }

    /// Lists the `(from, to, value)` API level intervals of the outcome, within `[min, max]`.
    ///
    /// `to` is inclusive. Branches that fall completely outside of the interval are skipped.
    pub fn intervals(&self, min: u32, max: u32) -> Vec<(u32, u32, &T)> {
        let mut intervals = Vec::new();
        self.collect_intervals(min, max, &mut intervals);
        intervals
    }

    fn collect_intervals<'a>(&'a self, min: u32, max: u32, intervals: &mut Vec<(u32, u32, &'a T)>) {
        if min > max {
            return;
        }
        match self {
            Self::Single(value) => intervals.push((min, max, value)),
            Self::Split {
                trigger,
                below,
                above,
            } => {
                if *trigger > min {
                    below.collect_intervals(min, max.min(trigger - 1), intervals);
                }
                above.collect_intervals(min.max(*trigger), max, intervals);
            }
        }
    }
}

impl<T: fmt::Display> fmt::Display for PolicyOutcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(value) => write!(f, "{}", value),
            Self::Split { below, above, .. } => write!(f, "({}, {})", below, above),
        }
    }
}
