//! View Controller
//!
//! Owns the user's filter selections and which aggregation is displayed, and
//! renders both against a record set in one pass.

use serde::{Deserialize, Serialize};
use skills_common::filter::filter_refs;
use skills_common::table::TableView;
use skills_common::{
    all_options, facet_options, Dimension, FacetOptions, FilterState, MatrixMode, MatrixView,
    SkillRecord, SortSpec,
};

/// Which aggregation the dashboard shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    #[default]
    Matrix,
    Table,
}

/// The rendered aggregation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum ViewContent {
    Matrix(MatrixView),
    Table(TableView),
}

/// Everything the dashboard displays for one state and record set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSnapshot {
    pub view: ViewKind,
    pub matrix_mode: MatrixMode,
    pub sort: Option<SortSpec>,
    pub filters: FilterState,
    pub has_active_filters: bool,
    pub total_records: usize,
    pub filtered_count: usize,
    /// Unrestricted values per dimension, sorted
    pub options: FacetOptions,
    /// Values still selectable given the other dimensions' selections
    pub available: FacetOptions,
    pub content: ViewContent,
}

/// Partial update of the view settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewUpdate {
    #[serde(default)]
    pub view: Option<ViewKind>,
    #[serde(default)]
    pub matrix_mode: Option<MatrixMode>,
    #[serde(default)]
    pub sort: Option<SortSpec>,
    /// Drop the table sort (ignored when `sort` is also given)
    #[serde(default)]
    pub clear_sort: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ViewController {
    filters: FilterState,
    view: ViewKind,
    matrix_mode: MatrixMode,
    sort: Option<SortSpec>,
}

impl ViewController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn view(&self) -> ViewKind {
        self.view
    }

    pub fn matrix_mode(&self) -> MatrixMode {
        self.matrix_mode
    }

    pub fn sort(&self) -> Option<SortSpec> {
        self.sort
    }

    pub fn set_selection<I, S>(&mut self, dimension: Dimension, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.set(dimension, values);
    }

    /// Flip one value in a dimension; returns whether it is now selected
    pub fn toggle(&mut self, dimension: Dimension, value: &str) -> bool {
        self.filters.toggle(dimension, value)
    }

    pub fn clear_all(&mut self) {
        self.filters.clear_all();
    }

    pub fn set_view(&mut self, kind: ViewKind) {
        self.view = kind;
    }

    pub fn set_matrix_mode(&mut self, mode: MatrixMode) {
        self.matrix_mode = mode;
    }

    pub fn set_sort(&mut self, sort: Option<SortSpec>) {
        self.sort = sort;
    }

    pub fn apply(&mut self, update: ViewUpdate) {
        if let Some(kind) = update.view {
            self.set_view(kind);
        }
        if let Some(mode) = update.matrix_mode {
            self.set_matrix_mode(mode);
        }
        if update.sort.is_some() {
            self.set_sort(update.sort);
        } else if update.clear_sort {
            self.set_sort(None);
        }
    }

    /// Filtered records in their original order
    pub fn filtered(&self, records: &[SkillRecord]) -> Vec<SkillRecord> {
        filter_refs(records, &self.filters)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn render(&self, records: &[SkillRecord]) -> ViewSnapshot {
        let filtered = self.filtered(records);
        let filtered_count = filtered.len();

        let content = match self.view {
            ViewKind::Matrix => ViewContent::Matrix(MatrixView::new(self.matrix_mode, &filtered)),
            ViewKind::Table => ViewContent::Table(TableView::new(filtered, self.sort)),
        };

        ViewSnapshot {
            view: self.view,
            matrix_mode: self.matrix_mode,
            sort: self.sort,
            filters: self.filters.clone(),
            has_active_filters: self.filters.has_active_filters(),
            total_records: records.len(),
            filtered_count,
            options: all_options(records),
            available: facet_options(records, &self.filters),
            content,
        }
    }
}
