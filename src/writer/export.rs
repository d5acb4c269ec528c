//! Static grid export
//!
//! Walks a [`GridBoard`] row-major and redraws every placed tile into its own
//! panel of one offscreen figure, honoring spans. Each panel goes through the
//! same [`render_plot`] and [`draw_axes`] calls as the live tile.

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::figure::Figure;
use crate::layout::GridBoard;
use crate::render::render_plot;
use crate::writer::plotters::draw_axes;
use crate::{PlotgridError, Result};

/// SVG user units per inch
const SVG_UNITS_PER_INCH: f64 = 72.0;

/// Gap around each panel, in pixels
const PANEL_MARGIN: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Vector output
    Svg,
    /// Raster output
    Png,
}

impl ExportFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl FromStr for ExportFormat {
    type Err = PlotgridError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "svg" => Ok(ExportFormat::Svg),
            "png" => Ok(ExportFormat::Png),
            other => Err(PlotgridError::WriterError(format!(
                "Unsupported export format '{}' (expected svg or png)",
                other
            ))),
        }
    }
}

/// Physical size and format of an exported figure
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub width_in: f64,
    pub height_in: f64,
    /// Raster resolution; ignored for SVG
    pub dpi: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Svg,
            width_in: 11.0,
            height_in: 8.5,
            dpi: 150,
        }
    }
}

impl ExportOptions {
    /// Output size in backend pixels
    pub fn pixel_size(&self) -> (u32, u32) {
        let scale = match self.format {
            ExportFormat::Svg => SVG_UNITS_PER_INCH,
            ExportFormat::Png => self.dpi as f64,
        };
        (
            ((self.width_in * scale).round() as u32).max(1),
            ((self.height_in * scale).round() as u32).max(1),
        )
    }
}

/// Export every placed tile of `board` to `path`.
///
/// Returns the number of panels drawn. Tiles without data, or whose render
/// fails, are skipped with a warning; only backend I/O failures abort.
pub fn export_grid(board: &GridBoard, path: impl AsRef<Path>, options: &ExportOptions) -> Result<usize> {
    let path = path.as_ref();
    let size = options.pixel_size();
    tracing::info!(
        "Exporting {}x{} grid to {} ({:?}, {}x{})",
        board.rows(),
        board.cols(),
        path.display(),
        options.format,
        size.0,
        size.1
    );

    let drawn = match options.format {
        ExportFormat::Svg => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            let drawn = draw_grid(&root, board)?;
            root.present().map_err(|e| PlotgridError::WriterError(e.to_string()))?;
            drawn
        }
        ExportFormat::Png => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            let drawn = draw_grid(&root, board)?;
            root.present().map_err(|e| PlotgridError::WriterError(e.to_string()))?;
            drawn
        }
    };
    Ok(drawn)
}

/// Draw every placed tile of `board` onto `root`, one panel per span
pub fn draw_grid<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, board: &GridBoard) -> Result<usize> {
    root.fill(&WHITE)
        .map_err(|e| PlotgridError::WriterError(e.to_string()))?;

    let (width, height) = root.dim_in_pixel();
    let cell_w = width as f64 / board.cols() as f64;
    let cell_h = height as f64 / board.rows() as f64;

    let mut covered: HashSet<(usize, usize)> = HashSet::new();
    let mut drawn = 0;

    for row in 0..board.rows() {
        for col in 0..board.cols() {
            if covered.contains(&(row, col)) {
                continue;
            }
            let Some(placement) = board.placement_at_origin(row, col) else {
                continue;
            };
            covered.extend(placement.position.cells());

            let Some((data, config)) = placement.tile.get_plot_data() else {
                tracing::warn!("Skipping tile at ({}, {}): no data", row, col);
                continue;
            };

            let mut figure = Figure::new();
            if let Err(e) = render_plot(&mut figure, data, config) {
                tracing::warn!("Skipping tile at ({}, {}): {}", row, col, e);
                continue;
            }
            let Some(axes) = figure.current() else {
                continue;
            };

            let position = placement.position;
            let left = (position.col as f64 * cell_w).round() as u32;
            let top = (position.row as f64 * cell_h).round() as u32;
            let panel_w = (position.colspan as f64 * cell_w).round() as u32;
            let panel_h = (position.rowspan as f64 * cell_h).round() as u32;
            let panel = root
                .clone()
                .shrink((left, top), (panel_w, panel_h))
                .margin(PANEL_MARGIN, PANEL_MARGIN, PANEL_MARGIN, PANEL_MARGIN);

            if let Err(e) = draw_axes(&panel, axes) {
                tracing::warn!("Skipping tile at ({}, {}): {}", row, col, e);
                continue;
            }
            tracing::debug!(
                "Drew tile at ({}, {}) spanning {}",
                row,
                col,
                position.span_label()
            );
            drawn += 1;
        }
    }

    Ok(drawn)
}
