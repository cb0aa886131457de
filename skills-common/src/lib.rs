//! # Skills Matrix Common Library
//!
//! Shared code for the Manpower & Skills Matrix dashboard:
//! - Skill record model and competency classification
//! - Faceted filter engine
//! - Band-grouped competency matrix aggregation
//! - Sortable table projection
//! - API request/response types
//! - Configuration loading

pub mod api;
pub mod config;
pub mod error;
pub mod filter;
pub mod matrix;
pub mod model;
pub mod table;

pub use error::{Error, Result};
pub use filter::{
    all_options, facet_options, filter_refs, filtered_records, Dimension, FacetOptions,
    FilterState,
};
pub use matrix::{build_matrix, compare_bands, BandBucket, MatrixMode, MatrixView, SkillCard};
pub use model::{CompetencyClass, Proficiency, RecordId, SkillRecord};
pub use table::{sort_records, ProficiencyTier, SortColumn, SortOrder, SortSpec, TableView};
