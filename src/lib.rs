/*!
# plotgrid - grids of aggregated line plots backed by CSV data

plotgrid arranges line plots in a grid of tiles. Each tile pairs a tabular data
source with a declarative [`PlotSpec`]. The crate turns raw rows into aggregated
series (group means with optional standard-error bands), decorates them with
reference lines and error-bar markers, and exports the whole grid as one figure.

## Example

```rust,ignore
use plotgrid::api::{build_board, create_plot, create_project};
use plotgrid::reader::load_csv;
use plotgrid::writer::{export_grid, ExportOptions};

let source = load_csv("data/results.csv", Some("results"))?;
let plot = create_plot(&source.id, "time", "accuracy")
    .configure(|c| c.with_hue(vec!["model", "dataset"]));
let project = create_project((2, 2), vec![source.descriptor()], vec![plot]);

let board = build_board(&project, &[source])?;
export_grid(&board, "grid.svg", &ExportOptions::default())?;
```

## Architecture

Data flows through the crate as:

```text
reader (CSV -> DataFrame) -> tile (PlotSpec + DataFrame)
    -> render (filter, hue, stat, decorations, render::overlay) -> figure::Axes
    -> writer (plotters: live SVG preview or grid export)
```

[`plot::facet::expand_groups`] and the [`plot::scale`] limit calculators are called
by the orchestration layer ([`api`]) before per-group tiles are built.
*/

pub mod api;
pub mod figure;
pub mod layout;
pub mod naming;
pub mod plot;
pub mod project;
pub mod reader;
pub mod render;
pub mod stat;
pub mod tile;
pub mod writer;

// Re-export commonly used types
pub use plot::{
    ErrorMarker, FilterQuery, FilterValue, GridPosition, Hue, MarkerShape, PlotConfig, PlotSpec,
};

// Re-export polars' DataFrame so callers don't need a direct dependency
pub use polars::prelude::DataFrame;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Main library error type
#[derive(thiserror::Error, Debug)]
pub enum PlotgridError {
    #[error("Data error: {0}")]
    DataError(#[from] polars::prelude::PolarsError),

    #[error("{0}")]
    GroupLimitError(String),

    #[error("Layout error: {0}")]
    LayoutError(String),

    #[error("Project error: {0}")]
    ProjectError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Writer error: {0}")]
    WriterError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PlotgridError>;
