//! Retained drawable surface
//!
//! A [`Figure`] owns the [`Axes`] a plot tile draws on. Rendering fills an
//! `Axes` with [`Artist`]s and decorations; a writer backend later rasterises
//! it. Because the display list is plain data, the live preview and the static
//! export draw from exactly the same state.

use crate::plot::scale::palettes::Rgba;
use crate::plot::scale::Range;
use crate::plot::MarkerShape;

/// Minor tick subdivisions between major x ticks
pub const MINOR_SUBDIVISIONS: usize = 5;

/// Opacity of SEM bands
pub const BAND_ALPHA: f64 = 0.3;

/// Padding added on each side of autoscaled view limits, as a fraction of the span
pub const VIEW_MARGIN: f64 = 0.05;

/// Text shown on axes whose filtered data is empty
pub const NO_DATA_TEXT: &str = "No data";

/// Axis a reference line or error bar runs along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Parallel to the x axis (constant y, or an x error)
    Horizontal,
    /// Parallel to the y axis (constant x, or a y error)
    Vertical,
}

/// One drawable element of an axes
#[derive(Debug, Clone, PartialEq)]
pub enum Artist {
    /// Aggregated mean series
    Line {
        points: Vec<(f64, f64)>,
        color: Rgba,
        label: Option<String>,
        show_line: bool,
        show_marker: bool,
    },
    /// Shaded `(x, lower, upper)` SEM band
    Band {
        points: Vec<(f64, f64, f64)>,
        color: Rgba,
    },
    /// Dashed reference line spanning the whole view
    ReferenceLine {
        orientation: Orientation,
        value: f64,
    },
    /// Annotation point with a symmetric error bar
    ErrorMarker {
        x: f64,
        y: f64,
        err: f64,
        orientation: Orientation,
        shape: MarkerShape,
        color: Rgba,
        label: Option<String>,
    },
}

impl Artist {
    /// Paint order; higher draws on top
    pub fn zorder(&self) -> f64 {
        match self {
            Artist::Band { .. } => 1.0,
            Artist::Line { .. } => 2.0,
            Artist::ReferenceLine { .. } => 2.5,
            Artist::ErrorMarker { .. } => 5.0,
        }
    }

    /// Legend entry, if the artist carries a label
    pub fn label(&self) -> Option<&str> {
        match self {
            Artist::Line { label, .. } | Artist::ErrorMarker { label, .. } => label.as_deref(),
            _ => None,
        }
    }

    fn extend_limits(&self, xs: &mut Vec<f64>, ys: &mut Vec<f64>) {
        match self {
            Artist::Line { points, .. } => {
                for (x, y) in points {
                    xs.push(*x);
                    ys.push(*y);
                }
            }
            Artist::Band { points, .. } => {
                for (x, lo, hi) in points {
                    xs.push(*x);
                    ys.push(*lo);
                    ys.push(*hi);
                }
            }
            Artist::ReferenceLine { orientation, value } => match orientation {
                Orientation::Horizontal => ys.push(*value),
                Orientation::Vertical => xs.push(*value),
            },
            Artist::ErrorMarker {
                x,
                y,
                err,
                orientation,
                ..
            } => match orientation {
                Orientation::Horizontal => {
                    xs.extend([x - err, x + err]);
                    ys.push(*y);
                }
                Orientation::Vertical => {
                    xs.push(*x);
                    ys.extend([y - err, y + err]);
                }
            },
        }
    }
}

/// One set of axes: decorations plus a display list
#[derive(Debug, Clone, PartialEq)]
pub struct Axes {
    pub title: Option<String>,
    pub xlabel: Option<String>,
    pub ylabel: Option<String>,
    /// Explicit y view range; overrides autoscaling
    pub ylim: Option<Range>,
    /// Unlabelled minor ticks between major x ticks; 0 disables them
    pub minor_x_subdivisions: usize,
    pub legend: bool,
    /// Centered text replacing all content (empty data)
    pub placeholder: Option<String>,
    artists: Vec<Artist>,
}

impl Default for Axes {
    fn default() -> Self {
        Self::new()
    }
}

impl Axes {
    pub fn new() -> Self {
        Self {
            title: None,
            xlabel: None,
            ylabel: None,
            ylim: None,
            minor_x_subdivisions: 0,
            legend: false,
            placeholder: None,
            artists: Vec::new(),
        }
    }

    /// Drop all artists and decorations
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn add(&mut self, artist: Artist) {
        self.artists.push(artist);
    }

    /// Artists in insertion order
    pub fn artists(&self) -> &[Artist] {
        &self.artists
    }

    /// Artists in paint order; ties keep insertion order
    pub fn artists_by_zorder(&self) -> Vec<&Artist> {
        let mut sorted: Vec<&Artist> = self.artists.iter().collect();
        sorted.sort_by(|a, b| a.zorder().total_cmp(&b.zorder()));
        sorted
    }

    pub fn lines(&self) -> impl Iterator<Item = &Artist> {
        self.artists
            .iter()
            .filter(|a| matches!(a, Artist::Line { .. }))
    }

    pub fn bands(&self) -> impl Iterator<Item = &Artist> {
        self.artists
            .iter()
            .filter(|a| matches!(a, Artist::Band { .. }))
    }

    pub fn error_markers(&self) -> impl Iterator<Item = &Artist> {
        self.artists
            .iter()
            .filter(|a| matches!(a, Artist::ErrorMarker { .. }))
    }

    /// Labels shown in the legend, in insertion order
    pub fn legend_entries(&self) -> Vec<&str> {
        self.artists.iter().filter_map(Artist::label).collect()
    }

    /// Current view range: the padded extent of every artist, with an explicit
    /// `ylim` taking precedence on y.
    pub fn view_limits(&self) -> (Range, Range) {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for artist in &self.artists {
            artist.extend_limits(&mut xs, &mut ys);
        }
        let x = autoscale(&xs);
        let y = self.ylim.unwrap_or_else(|| autoscale(&ys));
        (x, y)
    }
}

/// Padded extent of finite values; a single value gets a unit-wide window and
/// no values give `(0, 1)`.
fn autoscale(values: &[f64]) -> Range {
    let (min, max) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    if min > max {
        return (0.0, 1.0);
    }
    if min == max {
        return (min - 0.5, max + 0.5);
    }
    let pad = (max - min) * VIEW_MARGIN;
    (min - pad, max + pad)
}

/// Drawable surface exclusively owned by one tile
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Figure {
    axes: Vec<Axes>,
}

impl Figure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear and return the single axes, creating it on first use.
    ///
    /// Every render goes through here, so repeated renders never stack axes.
    pub fn reset_axes(&mut self) -> &mut Axes {
        self.axes.truncate(1);
        if self.axes.is_empty() {
            self.axes.push(Axes::new());
        }
        let axes = &mut self.axes[0];
        axes.clear();
        axes
    }

    pub fn axes(&self) -> &[Axes] {
        &self.axes
    }

    /// The axes last rendered, if any
    pub fn current(&self) -> Option<&Axes> {
        self.axes.first()
    }

    /// Release all drawable content
    pub fn clear(&mut self) {
        self.axes.clear();
    }
}
