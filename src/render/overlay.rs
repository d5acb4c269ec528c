//! Error marker overlay
//!
//! Places [`ErrorMarker`] annotations on an axes. Markers are split into two
//! buckets by which error they carry: a marker with `xerr` is always an x-error
//! marker, even when `yerr` is also set; a marker without `xerr` but with `yerr`
//! is a y-error marker; a marker with neither is skipped.
//!
//! Within a bucket, list order is stacking order. An x-error marker without an
//! explicit `y` is stacked down from the top of the view; a y-error marker
//! without an explicit `x` is stacked left from the right edge.

use crate::figure::{Artist, Axes, Orientation};
use crate::plot::scale::palettes::color_or_fallback;
use crate::plot::scale::Range;
use crate::plot::ErrorMarker;

/// Distance of the first stacked marker from the view edge, as a fraction of the range
pub const STACK_OFFSET: f64 = 0.05;

/// Spacing between consecutive stacked markers, as a fraction of the range
pub const STACK_STEP: f64 = 0.08;

/// Coordinate of the `index`-th stacked marker, counted inward from `range.1`
pub fn stack_position(range: Range, index: usize) -> f64 {
    let (min, max) = range;
    max - (STACK_OFFSET + index as f64 * STACK_STEP) * (max - min)
}

fn center(range: Range) -> f64 {
    (range.0 + range.1) / 2.0
}

/// Resolve every marker to a drawable artist against the given view range.
pub fn place_markers(markers: &[ErrorMarker], xlim: Range, ylim: Range) -> Vec<Artist> {
    let mut x_index = 0;
    let mut y_index = 0;
    let mut placed = Vec::with_capacity(markers.len());

    for marker in markers {
        let (x, y, err, orientation) = match (marker.xerr, marker.yerr) {
            (Some(xerr), _) => {
                let y = marker.y.unwrap_or_else(|| stack_position(ylim, x_index));
                x_index += 1;
                let x = marker.x.unwrap_or_else(|| center(xlim));
                (x, y, xerr, Orientation::Horizontal)
            }
            (None, Some(yerr)) => {
                let x = marker.x.unwrap_or_else(|| stack_position(xlim, y_index));
                y_index += 1;
                let y = marker.y.unwrap_or_else(|| center(ylim));
                (x, y, yerr, Orientation::Vertical)
            }
            (None, None) => {
                tracing::debug!("Skipping error marker without an error value: {:?}", marker);
                continue;
            }
        };

        placed.push(Artist::ErrorMarker {
            x,
            y,
            err: err.abs(),
            orientation,
            shape: marker.marker,
            color: color_or_fallback(&marker.color),
            label: marker.label.clone(),
        });
    }

    placed
}

/// Add markers to `axes`, positioned against its current view limits
pub fn draw_markers(axes: &mut Axes, markers: &[ErrorMarker]) {
    if markers.is_empty() {
        return;
    }
    let (xlim, ylim) = axes.view_limits();
    for artist in place_markers(markers, xlim, ylim) {
        if artist.label().is_some() {
            axes.legend = true;
        }
        axes.add(artist);
    }
}
