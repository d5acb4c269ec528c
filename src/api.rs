//! Programmatic project building
//!
//! Helpers to assemble projects in code instead of through an interactive
//! session: data source descriptors, plot specs with defaults, grouped small
//! multiples with shared y-limits, and turning a project back into a rendered
//! [`GridBoard`].
//!
//! # Example
//!
//! ```rust,ignore
//! use plotgrid::api::{quick_grouped_project, GroupedPlotOptions};
//! use plotgrid::reader::load_csv;
//!
//! let source = load_csv("data/results.csv", Some("Experiment"))?;
//! let options = GroupedPlotOptions {
//!     hue: vec!["model"].into(),
//!     ..GroupedPlotOptions::default()
//! };
//! let project = quick_grouped_project(&source, "time", "accuracy", &["species".into()], &options)?;
//! ```

use std::path::PathBuf;

use polars::prelude::DataFrame;

use crate::layout::GridBoard;
use crate::plot::facet::{apply_filter, expand_groups, filter_title};
use crate::plot::scale::{shared_limits, shared_limits_with_sem};
use crate::plot::{ErrorMarker, GridPosition, Hue, PlotConfig, PlotSpec};
use crate::project::ProjectFile;
use crate::reader::{load_csv, DataSource, DataSourceDescriptor};
use crate::{PlotgridError, Result};

/// Grid size used when a generated project has no plots
pub const DEFAULT_GRID: (usize, usize) = (2, 3);

/// Direction in which grouped plots are laid out from the start cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupLayout {
    /// Left to right along one row
    #[default]
    Row,
    /// Top to bottom along one column
    Column,
}

/// Everything [`create_grouped_plots`] applies to each generated plot
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedPlotOptions {
    pub start_row: usize,
    pub start_col: usize,
    pub layout: GroupLayout,
    pub hue: Hue,
    pub sem_column: Option<String>,
    pub sem_precomputed: bool,
    pub hlines: Vec<f64>,
    pub vlines: Vec<f64>,
    pub style_line: bool,
    pub style_marker: bool,
    /// Manual y-limits; computed and shared across the group when `None`
    pub ylim: Option<(f64, f64)>,
    pub error_markers: Vec<ErrorMarker>,
}

impl Default for GroupedPlotOptions {
    fn default() -> Self {
        Self {
            start_row: 0,
            start_col: 0,
            layout: GroupLayout::Row,
            hue: Hue::None,
            sem_column: None,
            sem_precomputed: false,
            hlines: Vec::new(),
            vlines: Vec::new(),
            style_line: true,
            style_marker: false,
            ylim: None,
            error_markers: Vec::new(),
        }
    }
}

/// Descriptor for a data source that has not been loaded yet
pub fn create_datasource(name: impl Into<String>, path: impl Into<PathBuf>) -> DataSourceDescriptor {
    DataSourceDescriptor {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.into(),
        path: path.into(),
        schema: Vec::new(),
    }
}

/// A line plot of `y` against `x` at cell (0, 0) with every option at its default
pub fn create_plot(datasource_id: impl Into<String>, x: &str, y: &str) -> PlotSpec {
    PlotSpec::new(datasource_id, PlotConfig::new(x, y), GridPosition::default())
}

pub fn create_project(
    grid_size: (usize, usize),
    data_sources: Vec<DataSourceDescriptor>,
    plots: Vec<PlotSpec>,
) -> ProjectFile {
    ProjectFile::new(grid_size.0, grid_size.1, data_sources, plots)
}

/// Reject limits that cannot describe a visible axis
pub fn validate_ylim(ylim: (f64, f64)) -> Result<()> {
    let (lo, hi) = ylim;
    if !lo.is_finite() || !hi.is_finite() || lo >= hi {
        return Err(PlotgridError::ValidationError(format!(
            "Y limits must be finite with min < max, got ({}, {})",
            lo, hi
        )));
    }
    Ok(())
}

/// One plot per combination of the distinct values of `groups`.
///
/// Plots are placed from `(start_row, start_col)` along the chosen layout and
/// titled `"col=value, col=value"`. Without a manual `ylim`, a batch of more
/// than one plot shares a y-range: SEM-aware when a SEM column is set, raw
/// values otherwise.
///
/// # Errors
///
/// Fails on invalid error markers or ylim, a missing group column, or more than
/// [`crate::plot::facet::MAX_GROUP_COMBINATIONS`] combinations.
pub fn create_grouped_plots(
    datasource_id: &str,
    df: &DataFrame,
    x: &str,
    y: &str,
    groups: &[String],
    options: &GroupedPlotOptions,
) -> Result<Vec<PlotSpec>> {
    for marker in &options.error_markers {
        marker.validate()?;
    }
    if let Some(ylim) = options.ylim {
        validate_ylim(ylim)?;
    }

    let filters = expand_groups(df, groups)?;

    let ylim = match options.ylim {
        Some(ylim) => Some(ylim),
        None if filters.len() > 1 => {
            let limits = match &options.sem_column {
                Some(sem) => shared_limits_with_sem(
                    df,
                    &filters,
                    x,
                    y,
                    Some(sem.as_str()),
                    &options.hue,
                    options.sem_precomputed,
                )?,
                None => {
                    let subsets: Vec<DataFrame> =
                        filters.iter().map(|filter| apply_filter(df, filter)).collect();
                    shared_limits(&subsets, x, y)
                }
            };
            tracing::debug!(
                "Shared y-limits for {} plots: {:?}",
                filters.len(),
                limits.y
            );
            Some(limits.y)
        }
        None => None,
    };

    let plots = filters
        .into_iter()
        .enumerate()
        .map(|(i, filter)| {
            let position = match options.layout {
                GroupLayout::Row => GridPosition::new(options.start_row, options.start_col + i),
                GroupLayout::Column => GridPosition::new(options.start_row + i, options.start_col),
            };

            let mut config = PlotConfig::new(x, y)
                .with_hue(options.hue.clone())
                .with_reference_lines(options.hlines.clone(), options.vlines.clone())
                .with_style(options.style_line, options.style_marker)
                .with_error_markers(options.error_markers.clone());
            config.sem_column = options.sem_column.clone();
            config.sem_precomputed = options.sem_precomputed;
            config.ylim = ylim;
            config.title = filter_title(&filter);
            if !filter.is_empty() {
                config.filter_query = Some(filter);
            }

            PlotSpec::new(datasource_id, config, position)
        })
        .collect();

    Ok(plots)
}

/// Smallest grid holding every plot, or [`DEFAULT_GRID`] when there are none
pub fn bounding_grid(plots: &[PlotSpec]) -> (usize, usize) {
    if plots.is_empty() {
        return DEFAULT_GRID;
    }
    let rows = plots.iter().map(|p| p.grid_position.row_end()).max().unwrap_or(1);
    let cols = plots.iter().map(|p| p.grid_position.col_end()).max().unwrap_or(1);
    (rows, cols)
}

/// A project of grouped plots over one loaded data source
pub fn quick_grouped_project(
    source: &DataSource,
    x: &str,
    y: &str,
    groups: &[String],
    options: &GroupedPlotOptions,
) -> Result<ProjectFile> {
    let plots = create_grouped_plots(&source.id, &source.dataframe, x, y, groups, options)?;
    let grid = bounding_grid(&plots);
    Ok(create_project(grid, vec![source.descriptor()], plots))
}

/// A project over one data source; plots without a data source id are
/// assigned to it, and the grid defaults to the plots' bounding box.
pub fn quick_project(
    source: &DataSource,
    mut plots: Vec<PlotSpec>,
    grid_size: Option<(usize, usize)>,
) -> ProjectFile {
    for plot in &mut plots {
        if plot.datasource_id.is_empty() {
            plot.datasource_id = source.id.clone();
        }
    }
    let grid = grid_size.unwrap_or_else(|| bounding_grid(&plots));
    create_project(grid, vec![source.descriptor()], plots)
}

/// Load every data source a project lists, keeping the project's ids
pub fn load_sources(project: &ProjectFile) -> Result<Vec<DataSource>> {
    project
        .data_sources
        .iter()
        .map(|descriptor| {
            let mut source = load_csv(&descriptor.path, Some(&descriptor.name))?;
            source.id = descriptor.id.clone();
            Ok(source)
        })
        .collect()
}

/// Render a project's plots into a board sized from the project grid.
///
/// Plots whose data source is not among `sources`, or that cannot be placed or
/// rendered, are skipped with a warning.
pub fn build_board(project: &ProjectFile, sources: &[DataSource]) -> Result<GridBoard> {
    let mut board = GridBoard::new(project.grid.rows, project.grid.cols);

    for plot in &project.plots {
        let Some(source) = sources.iter().find(|s| s.id == plot.datasource_id) else {
            tracing::warn!(
                "Skipping plot {}: unknown data source '{}'",
                plot.id,
                plot.datasource_id
            );
            continue;
        };
        if let Err(e) = board.place_plot(source.dataframe.clone(), plot) {
            tracing::warn!(
                "Skipping plot {} at ({}, {}): {}",
                plot.id,
                plot.grid_position.row,
                plot.grid_position.col,
                e
            );
        }
    }

    tracing::info!(
        "Built {}x{} board with {} of {} plots",
        board.rows(),
        board.cols(),
        board.len(),
        project.plots.len()
    );
    Ok(board)
}
