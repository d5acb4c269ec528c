//! Declarative plot description types
//!
//! [`PlotConfig`] is everything a tile needs to re-render itself from a data
//! frame. [`PlotSpec`] adds the data source reference and grid placement, and
//! is exactly what a project file stores per plot.

use serde::{Deserialize, Serialize};

use super::facet::FilterQuery;
use super::marker::ErrorMarker;

/// Hue (color grouping) specification
///
/// Serializes as `null`, a single column name, or a list of column names. A list
/// always round-trips as a list, even with one element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Option<HueRepr>", into = "Option<HueRepr>")]
pub enum Hue {
    /// No grouping
    #[default]
    None,
    /// Group by one column, labels are the raw values
    Single(String),
    /// Group by a synthesized `"col=value, col=value"` key over several columns
    Composite(Vec<String>),
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum HueRepr {
    Single(String),
    Composite(Vec<String>),
}

impl From<Option<HueRepr>> for Hue {
    fn from(repr: Option<HueRepr>) -> Self {
        match repr {
            None => Hue::None,
            Some(HueRepr::Single(column)) => Hue::Single(column),
            Some(HueRepr::Composite(columns)) => Hue::Composite(columns),
        }
    }
}

impl From<Hue> for Option<HueRepr> {
    fn from(hue: Hue) -> Self {
        match hue {
            Hue::None => None,
            Hue::Single(column) => Some(HueRepr::Single(column)),
            Hue::Composite(columns) => Some(HueRepr::Composite(columns)),
        }
    }
}

impl Hue {
    /// Whether rendering will split rows into groups
    pub fn is_active(&self) -> bool {
        match self {
            Hue::None => false,
            Hue::Single(_) => true,
            Hue::Composite(columns) => !columns.is_empty(),
        }
    }

    /// All data columns the hue reads
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Hue::None => Vec::new(),
            Hue::Single(column) => vec![column.as_str()],
            Hue::Composite(columns) => columns.iter().map(|c| c.as_str()).collect(),
        }
    }
}

impl From<&str> for Hue {
    fn from(column: &str) -> Self {
        Hue::Single(column.to_string())
    }
}

impl From<Vec<&str>> for Hue {
    fn from(columns: Vec<&str>) -> Self {
        Hue::Composite(columns.into_iter().map(String::from).collect())
    }
}

/// Position of a plot in the grid; spans are at least 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPosition {
    pub row: usize,
    pub col: usize,
    #[serde(default = "one")]
    pub rowspan: usize,
    #[serde(default = "one")]
    pub colspan: usize,
}

fn one() -> usize {
    1
}

impl GridPosition {
    pub fn new(row: usize, col: usize) -> Self {
        Self::spanning(row, col, 1, 1)
    }

    /// Spans below 1 are raised to 1
    pub fn spanning(row: usize, col: usize, rowspan: usize, colspan: usize) -> Self {
        Self {
            row,
            col,
            rowspan: rowspan.max(1),
            colspan: colspan.max(1),
        }
    }

    /// One past the last covered row
    pub fn row_end(&self) -> usize {
        self.row + self.rowspan
    }

    /// One past the last covered column
    pub fn col_end(&self) -> usize {
        self.col + self.colspan
    }

    pub fn covers(&self, row: usize, col: usize) -> bool {
        (self.row..self.row_end()).contains(&row) && (self.col..self.col_end()).contains(&col)
    }

    pub fn overlaps(&self, other: &GridPosition) -> bool {
        self.row < other.row_end()
            && other.row < self.row_end()
            && self.col < other.col_end()
            && other.col < self.col_end()
    }

    /// Every physical cell covered, row-major
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.row..self.row_end()).flat_map(move |r| (self.col..self.col_end()).map(move |c| (r, c)))
    }

    /// `RxC` span label used in layout messages
    pub fn span_label(&self) -> String {
        format!("{}x{}", self.rowspan, self.colspan)
    }
}

impl Default for GridPosition {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

/// Retained rendering state of one plot, independent of placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotConfig {
    pub x: String,
    pub y: String,
    #[serde(default)]
    pub hue: Hue,
    /// Subject column (computed mode) or per-row SEM values (pre-computed mode)
    #[serde(default)]
    pub sem_column: Option<String>,
    #[serde(default)]
    pub sem_precomputed: bool,
    #[serde(default)]
    pub filter_query: Option<FilterQuery>,
    #[serde(default)]
    pub hlines: Vec<f64>,
    #[serde(default)]
    pub vlines: Vec<f64>,
    #[serde(default = "default_true")]
    pub style_line: bool,
    #[serde(default)]
    pub style_marker: bool,
    #[serde(default)]
    pub ylim: Option<(f64, f64)>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub error_markers: Vec<ErrorMarker>,
}

fn default_true() -> bool {
    true
}

/// Blank state of a cleared tile: no columns, line style on
impl Default for PlotConfig {
    fn default() -> Self {
        Self::new(String::new(), String::new())
    }
}

impl PlotConfig {
    /// A line-only plot of `y` against `x` with every option at its default
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            hue: Hue::None,
            sem_column: None,
            sem_precomputed: false,
            filter_query: None,
            hlines: Vec::new(),
            vlines: Vec::new(),
            style_line: true,
            style_marker: false,
            ylim: None,
            title: None,
            error_markers: Vec::new(),
        }
    }

    pub fn with_hue(mut self, hue: impl Into<Hue>) -> Self {
        self.hue = hue.into();
        self
    }

    pub fn with_sem(mut self, column: impl Into<String>, precomputed: bool) -> Self {
        self.sem_column = Some(column.into());
        self.sem_precomputed = precomputed;
        self
    }

    pub fn with_filter(mut self, filter: FilterQuery) -> Self {
        self.filter_query = Some(filter);
        self
    }

    pub fn with_reference_lines(mut self, hlines: Vec<f64>, vlines: Vec<f64>) -> Self {
        self.hlines = hlines;
        self.vlines = vlines;
        self
    }

    pub fn with_style(mut self, line: bool, marker: bool) -> Self {
        self.style_line = line;
        self.style_marker = marker;
        self
    }

    pub fn with_ylim(mut self, ylim: (f64, f64)) -> Self {
        self.ylim = Some(ylim);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_error_markers(mut self, markers: Vec<ErrorMarker>) -> Self {
        self.error_markers = markers;
        self
    }
}

/// One plot entry of a project: data source, rendering state and placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSpec {
    /// Plot instance id; generated when absent
    #[serde(default = "new_plot_id")]
    pub id: String,
    pub datasource_id: String,
    #[serde(flatten)]
    pub config: PlotConfig,
    #[serde(default)]
    pub grid_position: GridPosition,
}

pub(crate) fn new_plot_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl PlotSpec {
    pub fn new(datasource_id: impl Into<String>, config: PlotConfig, position: GridPosition) -> Self {
        Self {
            id: new_plot_id(),
            datasource_id: datasource_id.into(),
            config,
            grid_position: position,
        }
    }

    pub fn at(mut self, position: GridPosition) -> Self {
        self.grid_position = position;
        self
    }

    /// Apply [`PlotConfig`] builders in place
    pub fn configure(mut self, edit: impl FnOnce(PlotConfig) -> PlotConfig) -> Self {
        self.config = edit(self.config);
        self
    }
}
