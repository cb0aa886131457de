//! Competency matrix aggregation
//!
//! Groups a filtered record set into band buckets, each split into
//! functional and leadership skill cards. Buckets are always rebuilt from
//! scratch: both bucket membership and bucket existence depend on the whole
//! partition.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::{CompetencyClass, RecordId, SkillRecord};

/// Bands in display order
pub const CANONICAL_BANDS: [&str; 7] = [
    "Band 1A", "Band 1B", "Band 2A", "Band 2B", "Band 3", "Band 4", "Band 5",
];

/// Bucket name for records without a band
pub const UNASSIGNED_BAND: &str = "Unassigned";

/// Display projection of a skill record inside a band bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillCard {
    pub id: RecordId,
    pub name: String,
    pub definition: String,
    pub proficiency: Option<i64>,
    pub role: String,
}

impl From<&SkillRecord> for SkillCard {
    fn from(record: &SkillRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.skill_name.clone(),
            definition: record.skill_definition.clone(),
            proficiency: record.proficiency_level(),
            role: record.role.clone(),
        }
    }
}

/// One row of the matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandBucket {
    pub band_name: String,
    pub functional: Vec<SkillCard>,
    pub leadership: Vec<SkillCard>,
}

impl BandBucket {
    fn new(band_name: String) -> Self {
        Self {
            band_name,
            functional: Vec::new(),
            leadership: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.functional.len() + self.leadership.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keep only the cards shown for `mode`
    ///
    /// `All` keeps both lists; the focused modes empty the other one.
    pub fn projected(mut self, mode: MatrixMode) -> Self {
        match mode {
            MatrixMode::All => {}
            MatrixMode::Functional => self.leadership.clear(),
            MatrixMode::Leadership => self.functional.clear(),
        }
        self
    }
}

/// Matrix view modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatrixMode {
    #[default]
    All,
    Functional,
    Leadership,
}

/// Matrix buckets rendered for one mode
///
/// Bands with nothing to show in the mode are left out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixView {
    pub mode: MatrixMode,
    pub buckets: Vec<BandBucket>,
}

impl MatrixView {
    pub fn new(mode: MatrixMode, filtered: &[SkillRecord]) -> Self {
        let buckets = build_matrix(filtered)
            .into_iter()
            .map(|bucket| bucket.projected(mode))
            .filter(|bucket| !bucket.is_empty())
            .collect();
        Self { mode, buckets }
    }
}

/// Position of a band in the canonical order, if it has one
pub fn canonical_index(band: &str) -> Option<usize> {
    CANONICAL_BANDS.iter().position(|b| *b == band)
}

/// Total order on band names
///
/// Canonical bands compare by canonical position and sort before every
/// non-canonical name; non-canonical names compare lexicographically.
///
/// ```
/// use std::cmp::Ordering;
/// use skills_common::matrix::compare_bands;
///
/// assert_eq!(compare_bands("Band 1B", "Band 2A"), Ordering::Less);
/// assert_eq!(compare_bands("Band 5", "Apprentice"), Ordering::Less);
/// assert_eq!(compare_bands("Unassigned", "Contract"), Ordering::Greater);
/// ```
pub fn compare_bands(a: &str, b: &str) -> Ordering {
    match (canonical_index(a), canonical_index(b)) {
        (Some(ia), Some(ib)) => ia.cmp(&ib),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Group filtered records into ordered band buckets
pub fn build_matrix(filtered: &[SkillRecord]) -> Vec<BandBucket> {
    let mut buckets: Vec<BandBucket> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in filtered {
        let band = if record.band.is_empty() {
            UNASSIGNED_BAND
        } else {
            record.band.as_str()
        };

        let slot = *index.entry(band).or_insert_with(|| {
            buckets.push(BandBucket::new(band.to_string()));
            buckets.len() - 1
        });

        let card = SkillCard::from(record);
        match record.competency_class() {
            CompetencyClass::Leadership => buckets[slot].leadership.push(card),
            CompetencyClass::Functional => buckets[slot].functional.push(card),
        }
    }

    buckets.sort_by(|a, b| compare_bands(&a.band_name, &b.band_name));
    buckets
}
