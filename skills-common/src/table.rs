//! Sortable table projection of the filtered record set

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::Error;
use crate::matrix::compare_bands;
use crate::model::SkillRecord;

/// Columns the record table can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortColumn {
    Function,
    #[serde(rename = "Skill_Name")]
    SkillName,
    #[serde(rename = "Proficiency_Level")]
    Proficiency,
    Band,
    #[serde(rename = "Job_Role_Name_without_concat")]
    Role,
    #[serde(rename = "SBU")]
    Sbu,
    Group,
}

impl FromStr for SortColumn {
    type Err = Error;

    /// Accepts wire column names and short aliases, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "function" => Ok(SortColumn::Function),
            "skill" | "skill_name" => Ok(SortColumn::SkillName),
            "proficiency" | "proficiency_level" => Ok(SortColumn::Proficiency),
            "band" => Ok(SortColumn::Band),
            "role" | "job_role_name_without_concat" => Ok(SortColumn::Role),
            "sbu" => Ok(SortColumn::Sbu),
            "group" => Ok(SortColumn::Group),
            _ => Err(Error::InvalidInput(format!("Invalid sort column: {}", s))),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(Error::InvalidInput(format!("Invalid sort order: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: SortColumn,
    #[serde(default)]
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(column: SortColumn, order: SortOrder) -> Self {
        Self { column, order }
    }
}

/// Ascending comparison of two records on one column
///
/// Proficiency compares numerically with absent values last; bands follow the
/// matrix band order; everything else is lexicographic.
pub fn compare_by(column: SortColumn, a: &SkillRecord, b: &SkillRecord) -> Ordering {
    match column {
        SortColumn::Function => a.function.cmp(&b.function),
        SortColumn::SkillName => a.skill_name.cmp(&b.skill_name),
        SortColumn::Proficiency => match (a.proficiency_level(), b.proficiency_level()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortColumn::Band => compare_bands(&a.band, &b.band),
        SortColumn::Role => a.role.cmp(&b.role),
        SortColumn::Sbu => a.sbu.cmp(&b.sbu),
        SortColumn::Group => a.group.cmp(&b.group),
    }
}

/// Stable sort; ties keep their filtered order in both directions
pub fn sort_records(records: &mut [SkillRecord], spec: SortSpec) {
    records.sort_by(|a, b| {
        let ord = compare_by(spec.column, a, b);
        match spec.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

/// Badge tier for a proficiency value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProficiencyTier {
    High,
    Medium,
    Low,
}

impl ProficiencyTier {
    pub fn of(level: Option<i64>) -> Self {
        match level {
            Some(l) if l >= 4 => ProficiencyTier::High,
            Some(3) => ProficiencyTier::Medium,
            _ => ProficiencyTier::Low,
        }
    }
}

/// One table row: the record plus its badge tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    #[serde(flatten)]
    pub record: SkillRecord,
    pub tier: ProficiencyTier,
}

/// Filtered records as table rows, optionally sorted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub total_rows: usize,
    pub sort: Option<SortSpec>,
    pub rows: Vec<TableRow>,
}

impl TableView {
    pub fn new(mut filtered: Vec<SkillRecord>, sort: Option<SortSpec>) -> Self {
        if let Some(spec) = sort {
            sort_records(&mut filtered, spec);
        }
        let rows: Vec<TableRow> = filtered
            .into_iter()
            .map(|record| TableRow {
                tier: ProficiencyTier::of(record.proficiency_level()),
                record,
            })
            .collect();

        Self {
            total_rows: rows.len(),
            sort,
            rows,
        }
    }
}
