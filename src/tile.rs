//! Plot tile: one grid cell's retained rendering state
//!
//! A [`PlotTile`] keeps everything needed to redraw its plot later: the shared
//! data frame, the data source and plot ids, and the [`PlotConfig`]. Every
//! mutation re-runs [`render_plot`] on the tile's own [`Figure`].

use std::sync::Arc;

use polars::prelude::DataFrame;

use crate::figure::Figure;
use crate::plot::{ErrorMarker, GridPosition, PlotConfig, PlotSpec};
use crate::render::render_plot;
use crate::writer::plotters::SvgWriter;
use crate::writer::Writer;
use crate::{PlotgridError, Result};

/// Pixel size of the live preview, matching a 4x3 inch tile at 100 dpi
pub const PREVIEW_SIZE: (u32, u32) = (400, 300);

#[derive(Debug, Clone, Default)]
pub struct PlotTile {
    data: Option<Arc<DataFrame>>,
    datasource_id: Option<String>,
    plot_id: Option<String>,
    config: PlotConfig,
    figure: Figure,
}

impl PlotTile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_none()
    }

    /// Render new state and keep it; the data frame is shared, never copied.
    ///
    /// On failure the tile keeps its previous data, config and drawing.
    pub fn set_plot(
        &mut self,
        data: Arc<DataFrame>,
        datasource_id: impl Into<String>,
        config: PlotConfig,
    ) -> Result<()> {
        render_plot(&mut self.figure, &data, &config)?;
        self.data = Some(data);
        self.datasource_id = Some(datasource_id.into());
        if self.plot_id.is_none() {
            self.plot_id = Some(crate::plot::types::new_plot_id());
        }
        self.config = config;
        Ok(())
    }

    /// Rebuild the tile from a stored spec, keeping its plot id
    pub fn set_plot_from_data(&mut self, data: Arc<DataFrame>, spec: &PlotSpec) -> Result<()> {
        self.set_plot(data, spec.datasource_id.clone(), spec.config.clone())?;
        self.plot_id = Some(spec.id.clone());
        Ok(())
    }

    /// Data frame and config, or `None` for an empty tile
    pub fn get_plot_data(&self) -> Option<(&Arc<DataFrame>, &PlotConfig)> {
        self.data.as_ref().map(|data| (data, &self.config))
    }

    /// Full spec of this tile at `position`, or `None` for an empty tile
    pub fn get_plot_spec(&self, position: GridPosition) -> Option<PlotSpec> {
        let datasource_id = self.datasource_id.clone()?;
        self.data.as_ref()?;
        Some(PlotSpec {
            id: self.plot_id.clone().unwrap_or_else(crate::plot::types::new_plot_id),
            datasource_id,
            config: self.config.clone(),
            grid_position: position,
        })
    }

    pub fn config(&self) -> &PlotConfig {
        &self.config
    }

    pub fn plot_id(&self) -> Option<&str> {
        self.plot_id.as_deref()
    }

    pub fn datasource_id(&self) -> Option<&str> {
        self.datasource_id.as_deref()
    }

    /// Edit a copy of the retained config and redraw with it.
    ///
    /// The edit is kept only when the redraw succeeds.
    pub fn update_config(&mut self, edit: impl FnOnce(&mut PlotConfig)) -> Result<()> {
        let data = self.data.as_ref().ok_or_else(no_data)?;
        let mut config = self.config.clone();
        edit(&mut config);
        render_plot(&mut self.figure, data, &config)?;
        self.config = config;
        Ok(())
    }

    /// Replace the error markers and redraw
    pub fn set_error_markers(&mut self, markers: Vec<ErrorMarker>) -> Result<()> {
        self.update_config(|config| config.error_markers = markers)
    }

    /// Redraw from the retained state onto the existing figure
    pub fn rerender(&mut self) -> Result<()> {
        let data = self.data.as_ref().ok_or_else(no_data)?;
        render_plot(&mut self.figure, data, &self.config)
    }

    /// Reset every retained field to its default and release the drawing
    pub fn clear_plot(&mut self) {
        self.data = None;
        self.datasource_id = None;
        self.plot_id = None;
        self.config = PlotConfig::default();
        self.figure.clear();
    }

    pub fn figure(&self) -> &Figure {
        &self.figure
    }

    /// Live SVG preview of the current figure
    pub fn to_svg(&self) -> Result<String> {
        SvgWriter::new(PREVIEW_SIZE).write(&self.figure)
    }
}

fn no_data() -> PlotgridError {
    PlotgridError::ValidationError("Tile has no data to render".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn data() -> Arc<DataFrame> {
        Arc::new(
            df! {
                "x" => &[1, 2, 3],
                "y" => &[1.0, 4.0, 9.0],
            }
            .unwrap(),
        )
    }

    #[test]
    fn test_new_tile_is_empty() {
        let tile = PlotTile::new();
        assert!(tile.is_empty());
        assert!(tile.get_plot_data().is_none());
        assert!(tile.get_plot_spec(GridPosition::default()).is_none());
    }

    #[test]
    fn test_spec_round_trip_reproduces_render() {
        let mut tile = PlotTile::new();
        let config = PlotConfig::new("x", "y")
            .with_reference_lines(vec![2.0], vec![1.5])
            .with_style(true, true)
            .with_ylim((0.0, 10.0))
            .with_error_markers(vec![ErrorMarker::x_error(Some(2.0), 0.5)]);
        tile.set_plot(data(), "ds1", config).unwrap();

        let spec = tile.get_plot_spec(GridPosition::spanning(0, 1, 1, 2)).unwrap();
        let json = serde_json::to_string(&spec).unwrap();
        let restored: PlotSpec = serde_json::from_str(&json).unwrap();

        let mut other = PlotTile::new();
        other.set_plot_from_data(data(), &restored).unwrap();
        assert_eq!(other.figure(), tile.figure());
        assert_eq!(other.plot_id(), tile.plot_id());
        assert_eq!(other.config(), tile.config());
    }

    #[test]
    fn test_marker_edit_rerenders_in_place() {
        let mut tile = PlotTile::new();
        tile.set_plot(data(), "ds1", PlotConfig::new("x", "y")).unwrap();
        assert_eq!(tile.figure().axes()[0].error_markers().count(), 0);

        tile.set_error_markers(vec![
            ErrorMarker::x_error(Some(1.0), 0.1),
            ErrorMarker::y_error(Some(5.0), 1.0),
        ])
        .unwrap();
        assert_eq!(tile.figure().axes().len(), 1);
        assert_eq!(tile.figure().axes()[0].error_markers().count(), 2);
        assert_eq!(tile.config().error_markers.len(), 2);
    }

    #[test]
    fn test_clear_resets_defaults() {
        let mut tile = PlotTile::new();
        tile.set_plot(
            data(),
            "ds1",
            PlotConfig::new("x", "y").with_style(false, true).with_title("T"),
        )
        .unwrap();
        tile.clear_plot();

        assert!(tile.is_empty());
        assert!(tile.figure().axes().is_empty());
        assert_eq!(tile.config(), &PlotConfig::default());
        assert!(tile.config().style_line);
        assert!(!tile.config().style_marker);
        assert_eq!(tile.datasource_id(), None);
    }

    #[test]
    fn test_rerender_empty_tile_errors() {
        assert!(PlotTile::new().rerender().is_err());
        assert!(PlotTile::new().update_config(|c| c.title = None).is_err());
    }

    #[test]
    fn test_failed_edit_keeps_previous_state() {
        let mut tile = PlotTile::new();
        tile.set_plot(data(), "ds1", PlotConfig::new("x", "y").with_title("Good"))
            .unwrap();
        let figure = tile.figure().clone();

        assert!(tile.update_config(|c| c.y = "nope".to_string()).is_err());
        assert_eq!(tile.config().y, "y");
        assert_eq!(tile.figure(), &figure);
        assert_eq!(tile.figure().axes()[0].title.as_deref(), Some("Good"));
        assert_eq!(tile.figure().axes()[0].lines().count(), 1);
    }

    #[test]
    fn test_failed_set_plot_keeps_previous_state() {
        let mut tile = PlotTile::new();
        tile.set_plot(data(), "ds1", PlotConfig::new("x", "y")).unwrap();
        let plot_id = tile.plot_id().map(String::from);

        let other = Arc::new(df! { "a" => &[1, 2] }.unwrap());
        let spec = PlotSpec::new("ds2", PlotConfig::new("a", "b"), GridPosition::default());
        assert!(tile.set_plot_from_data(other, &spec).is_err());

        assert_eq!(tile.datasource_id(), Some("ds1"));
        assert_eq!(tile.plot_id().map(String::from), plot_id);
        assert_eq!(tile.get_plot_data().unwrap().0.width(), 2);
        assert_eq!(tile.figure().axes()[0].lines().count(), 1);
    }

    #[test]
    fn test_preview_is_svg() {
        let mut tile = PlotTile::new();
        tile.set_plot(data(), "ds1", PlotConfig::new("x", "y")).unwrap();
        let svg = tile.to_svg().unwrap();
        assert!(svg.contains("<svg"));
    }
}
