//! Plot tile renderer
//!
//! [`render_plot`] is the single procedure that turns a data frame and a
//! [`PlotConfig`] into a decorated [`Axes`]. The live tile and the static
//! export both call it, against the tile's own [`Figure`].

pub mod overlay;

use polars::prelude::*;

use crate::figure::{Artist, Axes, Figure, Orientation, MINOR_SUBDIVISIONS, NO_DATA_TEXT};
use crate::plot::facet::{apply_filter, resolve_hue, split_groups};
use crate::plot::scale::palettes::series_color;
use crate::plot::PlotConfig;
use crate::stat::{aggregate, AggregatedSeries, SemMode};
use crate::Result;

/// Render `config` over `df` onto `figure`, replacing whatever it showed.
///
/// `df` is never modified; filtering and hue synthesis work on copies. Calling
/// this repeatedly with the same inputs leaves the figure in the same state.
/// The new axes replace the old ones only once rendering has succeeded.
///
/// # Errors
///
/// Fails when the x, y, SEM or hue columns do not exist in the data. The
/// figure keeps its previous drawing.
pub fn render_plot(figure: &mut Figure, df: &DataFrame, config: &PlotConfig) -> Result<()> {
    let working = match &config.filter_query {
        Some(filter) => apply_filter(df, filter),
        None => df.clone(),
    };
    let (working, group_column) = resolve_hue(working, &config.hue)?;

    let mut axes = Axes::new();

    if working.height() == 0 {
        tracing::debug!("No rows left after filtering; drawing placeholder");
        axes.placeholder = Some(NO_DATA_TEXT.to_string());
        *figure.reset_axes() = axes;
        return Ok(());
    }

    let mode = SemMode::from_config(config.sem_column.as_deref(), config.sem_precomputed);

    match group_column {
        Some(column) => {
            for (index, (label, group)) in split_groups(&working, &column)?.into_iter().enumerate() {
                let series = aggregate(&group, &config.x, &config.y, mode)?;
                add_series(&mut axes, &series, index, Some(label), config);
            }
            axes.legend = true;
        }
        None => {
            let series = aggregate(&working, &config.x, &config.y, mode)?;
            add_series(&mut axes, &series, 0, None, config);
        }
    }

    axes.title = config.title.clone();
    axes.xlabel = Some(config.x.clone());
    axes.ylabel = Some(config.y.clone());
    axes.ylim = config.ylim;
    axes.minor_x_subdivisions = MINOR_SUBDIVISIONS;

    for value in &config.hlines {
        axes.add(Artist::ReferenceLine {
            orientation: Orientation::Horizontal,
            value: *value,
        });
    }
    for value in &config.vlines {
        axes.add(Artist::ReferenceLine {
            orientation: Orientation::Vertical,
            value: *value,
        });
    }

    overlay::draw_markers(&mut axes, &config.error_markers);
    *figure.reset_axes() = axes;
    Ok(())
}

/// Mean line plus, when SEM is available, its band in the same color
fn add_series(
    axes: &mut Axes,
    series: &AggregatedSeries,
    index: usize,
    label: Option<String>,
    config: &PlotConfig,
) {
    let color = series_color(index);
    axes.add(Artist::Line {
        points: series.points.iter().map(|p| (p.x, p.mean)).collect(),
        color,
        label,
        show_line: config.style_line,
        show_marker: config.style_marker,
    });
    if series.has_band() {
        axes.add(Artist::Band {
            points: series.band(),
            color,
        });
    }
}
