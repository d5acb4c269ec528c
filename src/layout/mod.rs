//! Grid layout of plot tiles
//!
//! A [`GridBoard`] is `rows x cols` cells plus a sparse map from top-left
//! origin to the tile placed there. A tile with a span covers
//! `rowspan x colspan` cells but is stored once, at its origin. Iteration is
//! row-major by origin.

use std::collections::BTreeMap;
use std::sync::Arc;

use polars::prelude::DataFrame;

use crate::plot::{GridPosition, PlotSpec};
use crate::tile::PlotTile;
use crate::{PlotgridError, Result};

/// A tile together with where it sits
#[derive(Debug, Clone)]
pub struct Placement {
    pub position: GridPosition,
    pub tile: PlotTile,
}

#[derive(Debug, Clone)]
pub struct GridBoard {
    rows: usize,
    cols: usize,
    placements: BTreeMap<(usize, usize), Placement>,
}

impl Default for GridBoard {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl GridBoard {
    /// Empty grid; dimensions are at least 1x1
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows: rows.max(1),
            cols: cols.max(1),
            placements: BTreeMap::new(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn add_row(&mut self) {
        self.rows += 1;
    }

    pub fn add_col(&mut self) {
        self.cols += 1;
    }

    /// Drop every tile and resize
    pub fn reset(&mut self, rows: usize, cols: usize) {
        *self = Self::new(rows, cols);
    }

    /// Remove row `row`; tiles below move up one row.
    ///
    /// Refused when it is the last row or a placed tile covers it.
    pub fn remove_row(&mut self, row: usize) -> Result<()> {
        if row >= self.rows {
            return Err(layout_error(format!("Row {} is outside the grid", row)));
        }
        if self.rows == 1 {
            return Err(layout_error("Cannot remove the last row".to_string()));
        }
        if let Some(p) = self
            .placements
            .values()
            .find(|p| (p.position.row..p.position.row_end()).contains(&row))
        {
            return Err(layout_error(format!(
                "Row {} is occupied by the plot at ({}, {})",
                row, p.position.row, p.position.col
            )));
        }

        self.placements = std::mem::take(&mut self.placements)
            .into_values()
            .map(|mut p| {
                if p.position.row > row {
                    p.position.row -= 1;
                }
                ((p.position.row, p.position.col), p)
            })
            .collect();
        self.rows -= 1;
        Ok(())
    }

    /// Remove column `col`; tiles to the right move left one column.
    ///
    /// Refused when it is the last column or a placed tile covers it.
    pub fn remove_col(&mut self, col: usize) -> Result<()> {
        if col >= self.cols {
            return Err(layout_error(format!("Column {} is outside the grid", col)));
        }
        if self.cols == 1 {
            return Err(layout_error("Cannot remove the last column".to_string()));
        }
        if let Some(p) = self
            .placements
            .values()
            .find(|p| (p.position.col..p.position.col_end()).contains(&col))
        {
            return Err(layout_error(format!(
                "Column {} is occupied by the plot at ({}, {})",
                col, p.position.row, p.position.col
            )));
        }

        self.placements = std::mem::take(&mut self.placements)
            .into_values()
            .map(|mut p| {
                if p.position.col > col {
                    p.position.col -= 1;
                }
                ((p.position.row, p.position.col), p)
            })
            .collect();
        self.cols -= 1;
        Ok(())
    }

    fn grow_to_fit(&mut self, position: &GridPosition) {
        if position.row_end() > self.rows {
            tracing::debug!("Growing grid to {} rows", position.row_end());
            self.rows = position.row_end();
        }
        if position.col_end() > self.cols {
            tracing::debug!("Growing grid to {} columns", position.col_end());
            self.cols = position.col_end();
        }
    }

    /// First placed tile overlapping `position`, ignoring the one at `except`
    fn overlapping(
        &self,
        position: &GridPosition,
        except: Option<(usize, usize)>,
    ) -> Option<&Placement> {
        self.placements
            .iter()
            .filter(|(origin, _)| Some(**origin) != except)
            .map(|(_, p)| p)
            .find(|p| p.position.overlaps(position))
    }

    /// Put a tile at `position`, growing the grid so the span fits.
    ///
    /// Fails when the span overlaps a placed tile.
    pub fn place_tile(&mut self, tile: PlotTile, position: GridPosition) -> Result<&mut PlotTile> {
        let position = GridPosition::spanning(
            position.row,
            position.col,
            position.rowspan,
            position.colspan,
        );
        if let Some(other) = self.overlapping(&position, None) {
            return Err(layout_error(format!(
                "Cells at ({}, {}) spanning {} overlap the plot at ({}, {})",
                position.row,
                position.col,
                position.span_label(),
                other.position.row,
                other.position.col
            )));
        }
        self.grow_to_fit(&position);
        let placement = self
            .placements
            .entry((position.row, position.col))
            .or_insert(Placement {
                position,
                tile,
            });
        Ok(&mut placement.tile)
    }

    /// Render `spec` over `data` into a new tile at the spec's position
    pub fn place_plot(&mut self, data: Arc<DataFrame>, spec: &PlotSpec) -> Result<&mut PlotTile> {
        if let Some(other) = self.overlapping(&spec.grid_position, None) {
            return Err(layout_error(format!(
                "Cells at ({}, {}) overlap the plot at ({}, {})",
                spec.grid_position.row,
                spec.grid_position.col,
                other.position.row,
                other.position.col
            )));
        }
        let mut tile = PlotTile::new();
        tile.set_plot_from_data(data, spec)?;
        self.place_tile(tile, spec.grid_position)
    }

    /// Origin of the tile covering `(row, col)`
    pub fn origin_at(&self, row: usize, col: usize) -> Option<(usize, usize)> {
        self.placements
            .iter()
            .find(|(_, p)| p.position.covers(row, col))
            .map(|(origin, _)| *origin)
    }

    /// Tile covering `(row, col)`, whether or not it is the origin
    pub fn tile_at(&self, row: usize, col: usize) -> Option<&PlotTile> {
        let origin = self.origin_at(row, col)?;
        self.placements.get(&origin).map(|p| &p.tile)
    }

    pub fn tile_at_mut(&mut self, row: usize, col: usize) -> Option<&mut PlotTile> {
        let origin = self.origin_at(row, col)?;
        self.placements.get_mut(&origin).map(|p| &mut p.tile)
    }

    /// Placement whose origin is exactly `(row, col)`
    pub fn placement_at_origin(&self, row: usize, col: usize) -> Option<&Placement> {
        self.placements.get(&(row, col))
    }

    /// Position of the tile holding plot `plot_id`
    pub fn find_tile_position(&self, plot_id: &str) -> Option<GridPosition> {
        self.placements
            .values()
            .find(|p| p.tile.plot_id() == Some(plot_id))
            .map(|p| p.position)
    }

    /// First cell in row-major order that no tile covers
    pub fn first_empty_coord(&self) -> Option<(usize, usize)> {
        (0..self.rows)
            .flat_map(|r| (0..self.cols).map(move |c| (r, c)))
            .find(|(r, c)| self.origin_at(*r, *c).is_none())
    }

    /// Clear and remove the tile covering `(row, col)`; returns whether one existed
    pub fn clear_tile(&mut self, row: usize, col: usize) -> bool {
        match self.origin_at(row, col) {
            Some(origin) => {
                if let Some(mut placement) = self.placements.remove(&origin) {
                    placement.tile.clear_plot();
                }
                true
            }
            None => false,
        }
    }

    /// Move the tile covering `from` so its origin is `to` with a new span.
    ///
    /// The grid grows to fit. Fails when there is no tile at `from` or the new
    /// span overlaps another tile.
    pub fn move_plot(
        &mut self,
        from: (usize, usize),
        to: (usize, usize),
        rowspan: usize,
        colspan: usize,
    ) -> Result<()> {
        let origin = self
            .origin_at(from.0, from.1)
            .ok_or_else(|| layout_error(format!("No plot at ({}, {})", from.0, from.1)))?;
        let target = GridPosition::spanning(to.0, to.1, rowspan, colspan);
        if let Some(other) = self.overlapping(&target, Some(origin)) {
            return Err(layout_error(format!(
                "Cannot move to ({}, {}) spanning {}: overlaps the plot at ({}, {})",
                to.0,
                to.1,
                target.span_label(),
                other.position.row,
                other.position.col
            )));
        }

        let Some(mut placement) = self.placements.remove(&origin) else {
            return Err(layout_error(format!("No plot at ({}, {})", from.0, from.1)));
        };
        placement.position = target;
        self.grow_to_fit(&target);
        self.placements.insert((target.row, target.col), placement);
        Ok(())
    }

    /// Exchange two tiles. Only tiles with identical spans can be swapped; on
    /// failure the grid is unchanged.
    pub fn swap_plots(&mut self, a: (usize, usize), b: (usize, usize)) -> Result<()> {
        let origin_a = self
            .origin_at(a.0, a.1)
            .ok_or_else(|| layout_error(format!("No plot at ({}, {})", a.0, a.1)))?;
        let origin_b = self
            .origin_at(b.0, b.1)
            .ok_or_else(|| layout_error(format!("No plot at ({}, {})", b.0, b.1)))?;
        if origin_a == origin_b {
            return Ok(());
        }

        let (pos_a, pos_b) = match (self.placements.get(&origin_a), self.placements.get(&origin_b)) {
            (Some(pa), Some(pb)) => (pa.position, pb.position),
            _ => return Err(layout_error("Swap source disappeared".to_string())),
        };
        if (pos_a.rowspan, pos_a.colspan) != (pos_b.rowspan, pos_b.colspan) {
            return Err(layout_error(format!(
                "Span mismatch: {} vs {}",
                pos_a.span_label(),
                pos_b.span_label()
            )));
        }

        if let (Some(mut pa), Some(mut pb)) = (
            self.placements.remove(&origin_a),
            self.placements.remove(&origin_b),
        ) {
            pa.position = pos_b;
            pb.position = pos_a;
            self.placements.insert(origin_b, pa);
            self.placements.insert(origin_a, pb);
        }
        Ok(())
    }

    /// Placed tiles in row-major origin order
    pub fn placements(&self) -> impl Iterator<Item = &Placement> {
        self.placements.values()
    }

    /// Specs of every non-empty tile, row-major
    pub fn serialize_layout(&self) -> Vec<PlotSpec> {
        self.placements
            .values()
            .filter_map(|p| p.tile.get_plot_spec(p.position))
            .collect()
    }
}

fn layout_error(message: String) -> PlotgridError {
    PlotgridError::LayoutError(message)
}
