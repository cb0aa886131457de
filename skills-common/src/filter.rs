//! Faceted filter engine
//!
//! Filtering is a pure function of the full record set and the current
//! [`FilterState`]. Facet availability uses a leave-one-dimension-out rule:
//! the options offered for a dimension are computed from records matching
//! every *other* dimension's selection, so choosing a Band never hides the
//! remaining Bands from their own selector.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::model::SkillRecord;

// ========================================
// Dimensions
// ========================================

/// A filterable record dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dimension {
    Function,
    Band,
    #[serde(rename = "SBU")]
    Sbu,
    Role,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Function,
        Dimension::Band,
        Dimension::Sbu,
        Dimension::Role,
    ];

    /// Name used in filter payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Function => "Function",
            Dimension::Band => "Band",
            Dimension::Sbu => "SBU",
            Dimension::Role => "Role",
        }
    }

    /// The record field this dimension filters on
    pub fn value_of<'a>(&self, record: &'a SkillRecord) -> &'a str {
        match self {
            Dimension::Function => &record.function,
            Dimension::Band => &record.band,
            Dimension::Sbu => &record.sbu,
            Dimension::Role => &record.role,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "function" => Ok(Dimension::Function),
            "band" => Ok(Dimension::Band),
            "sbu" => Ok(Dimension::Sbu),
            "role" => Ok(Dimension::Role),
            _ => Err(Error::InvalidInput(format!("Unknown filter dimension: {}", s))),
        }
    }
}

// ========================================
// Filter State
// ========================================

/// Selected values per dimension; an empty set places no restriction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(rename = "Function", default)]
    function: BTreeSet<String>,
    #[serde(rename = "Band", default)]
    band: BTreeSet<String>,
    #[serde(rename = "SBU", default)]
    sbu: BTreeSet<String>,
    #[serde(rename = "Role", default)]
    role: BTreeSet<String>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self, dimension: Dimension) -> &BTreeSet<String> {
        match dimension {
            Dimension::Function => &self.function,
            Dimension::Band => &self.band,
            Dimension::Sbu => &self.sbu,
            Dimension::Role => &self.role,
        }
    }

    fn selection_mut(&mut self, dimension: Dimension) -> &mut BTreeSet<String> {
        match dimension {
            Dimension::Function => &mut self.function,
            Dimension::Band => &mut self.band,
            Dimension::Sbu => &mut self.sbu,
            Dimension::Role => &mut self.role,
        }
    }

    /// Replace one dimension's selection
    pub fn set<I, S>(&mut self, dimension: Dimension, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.selection_mut(dimension) = values.into_iter().map(Into::into).collect();
    }

    /// Builder form of [`FilterState::set`]
    pub fn with<I, S>(mut self, dimension: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(dimension, values);
        self
    }

    /// Flip one value in or out of a selection; returns true if now selected
    pub fn toggle(&mut self, dimension: Dimension, value: &str) -> bool {
        let selection = self.selection_mut(dimension);
        if selection.remove(value) {
            false
        } else {
            selection.insert(value.to_string());
            true
        }
    }

    pub fn clear(&mut self, dimension: Dimension) {
        self.selection_mut(dimension).clear();
    }

    /// "Clear all"
    pub fn clear_all(&mut self) {
        for dimension in Dimension::ALL {
            self.clear(dimension);
        }
    }

    pub fn has_active_filters(&self) -> bool {
        Dimension::ALL.iter().any(|d| !self.selection(*d).is_empty())
    }

    /// True if the record satisfies every dimension's selection
    pub fn matches(&self, record: &SkillRecord) -> bool {
        Dimension::ALL.iter().all(|d| self.matches_dimension(record, *d))
    }

    /// True if the record satisfies every selection except `skip`'s
    pub fn matches_except(&self, record: &SkillRecord, skip: Dimension) -> bool {
        Dimension::ALL
            .iter()
            .filter(|d| **d != skip)
            .all(|d| self.matches_dimension(record, *d))
    }

    fn matches_dimension(&self, record: &SkillRecord, dimension: Dimension) -> bool {
        let selection = self.selection(dimension);
        selection.is_empty() || selection.contains(dimension.value_of(record))
    }
}

// ========================================
// Filtering
// ========================================

/// Records satisfying all active selections, in their original order
///
/// ```
/// use skills_common::{filtered_records, FilterState, SkillRecord};
///
/// let records = vec![SkillRecord::blank(1), SkillRecord::blank(2)];
/// assert_eq!(filtered_records(&records, &FilterState::new()), records);
/// ```
pub fn filtered_records(all: &[SkillRecord], filters: &FilterState) -> Vec<SkillRecord> {
    all.iter().filter(|r| filters.matches(r)).cloned().collect()
}

/// Borrowing form of [`filtered_records`]
pub fn filter_refs<'a>(all: &'a [SkillRecord], filters: &FilterState) -> Vec<&'a SkillRecord> {
    all.iter().filter(|r| filters.matches(r)).collect()
}

// ========================================
// Facets
// ========================================

/// Option lists per dimension
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetOptions {
    #[serde(rename = "Function")]
    pub function: Vec<String>,
    #[serde(rename = "Band")]
    pub band: Vec<String>,
    #[serde(rename = "SBU")]
    pub sbu: Vec<String>,
    #[serde(rename = "Role")]
    pub role: Vec<String>,
}

impl FacetOptions {
    pub fn get(&self, dimension: Dimension) -> &[String] {
        match dimension {
            Dimension::Function => &self.function,
            Dimension::Band => &self.band,
            Dimension::Sbu => &self.sbu,
            Dimension::Role => &self.role,
        }
    }

    fn get_mut(&mut self, dimension: Dimension) -> &mut Vec<String> {
        match dimension {
            Dimension::Function => &mut self.function,
            Dimension::Band => &mut self.band,
            Dimension::Sbu => &mut self.sbu,
            Dimension::Role => &mut self.role,
        }
    }
}

/// Values still selectable per dimension given the *other* selections
///
/// Values appear in first-appearance order. A blank value is a value like
/// any other, so records without a band stay selectable.
pub fn facet_options(all: &[SkillRecord], filters: &FilterState) -> FacetOptions {
    let mut options = FacetOptions::default();

    for dimension in Dimension::ALL {
        let mut seen = HashSet::new();
        let values = options.get_mut(dimension);
        for record in all.iter().filter(|r| filters.matches_except(r, dimension)) {
            let value = dimension.value_of(record);
            if seen.insert(value) {
                values.push(value.to_string());
            }
        }
    }

    options
}

/// Unrestricted distinct values per dimension, sorted lexicographically
pub fn all_options(all: &[SkillRecord]) -> FacetOptions {
    let mut options = FacetOptions::default();

    for dimension in Dimension::ALL {
        let values: BTreeSet<&str> = all.iter().map(|r| dimension.value_of(r)).collect();
        *options.get_mut(dimension) = values.into_iter().map(str::to_string).collect();
    }

    options
}
