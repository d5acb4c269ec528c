//! plotters backend
//!
//! Rasterises an [`Axes`] display list onto any plotters `DrawingArea`.
//!
//! Text (titles, tick labels, legend, placeholder) needs a system font. When
//! text cannot be drawn it is logged and skipped so the geometry still lands.

use std::fmt::Display;
use std::iter::once;

use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::figure::{Artist, Axes, Figure, Orientation, BAND_ALPHA};
use crate::plot::scale::palettes::Rgba;
use crate::plot::MarkerShape;
use crate::writer::Writer;
use crate::{PlotgridError, Result};

const FONT: &str = "sans-serif";
const LINE_WIDTH: u32 = 2;
/// Half-size of marker glyphs, in pixels
const MARKER_SIZE: i32 = 5;
/// Error bar cap width, in pixels
const CAP_WIDTH: u32 = 8;
const DASH_SIZE: i32 = 6;
const DASH_SPACING: i32 = 4;

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn writer_error(e: impl Display) -> PlotgridError {
    PlotgridError::WriterError(e.to_string())
}

/// Log and drop a failure of a text-only drawing step
fn soft<T, E: Display>(result: std::result::Result<T, E>, what: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("Skipping {}: {}", what, e);
            None
        }
    }
}

fn rgba(color: Rgba) -> RGBAColor {
    RGBAColor(color.0, color.1, color.2, color.3 as f64 / 255.0)
}

/// Draw one axes onto `area`
pub fn draw_axes<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, axes: &Axes) -> Result<()> {
    area.fill(&WHITE).map_err(writer_error)?;

    if let Some(text) = &axes.placeholder {
        draw_placeholder(area, text);
        return Ok(());
    }

    let plot_area = match &axes.title {
        Some(title) => soft(area.titled(title, (FONT, 14)), "title").unwrap_or_else(|| area.clone()),
        None => area.clone(),
    };

    let ((x0, x1), (y0, y1)) = axes.view_limits();
    let mut chart = ChartBuilder::on(&plot_area)
        .margin(8)
        .x_label_area_size(36)
        .y_label_area_size(48)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(writer_error)?;

    let mut mesh = chart.configure_mesh();
    mesh.x_max_light_lines(axes.minor_x_subdivisions.saturating_sub(1))
        .y_max_light_lines(0)
        .label_style((FONT, 11));
    if let Some(label) = &axes.xlabel {
        mesh.x_desc(label.as_str());
    }
    if let Some(label) = &axes.ylabel {
        mesh.y_desc(label.as_str());
    }
    soft(mesh.draw(), "axis mesh");

    for artist in axes.artists_by_zorder() {
        match artist {
            Artist::Band { points, color } => draw_band(&mut chart, points, *color)?,
            Artist::Line {
                points,
                color,
                label,
                show_line,
                show_marker,
            } => draw_line(
                &mut chart,
                points,
                *color,
                label.as_deref(),
                *show_line,
                *show_marker,
            )?,
            Artist::ReferenceLine { orientation, value } => {
                draw_reference_line(&mut chart, *orientation, *value, (x0, x1), (y0, y1))?
            }
            Artist::ErrorMarker {
                x,
                y,
                err,
                orientation,
                shape,
                color,
                label,
            } => draw_error_marker(
                &mut chart,
                (*x, *y),
                *err,
                *orientation,
                *shape,
                *color,
                label.as_deref(),
            )?,
        }
    }

    if axes.legend && !axes.legend_entries().is_empty() {
        soft(
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .label_font((FONT, 10))
                .draw(),
            "legend",
        );
    }

    Ok(())
}

fn draw_placeholder<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, text: &str) {
    let (width, height) = area.dim_in_pixel();
    let style = (FONT, 16)
        .into_font()
        .color(&BLACK.mix(0.3))
        .pos(Pos::new(HPos::Center, VPos::Center));
    soft(
        area.draw(&Text::new(
            text.to_string(),
            (width as i32 / 2, height as i32 / 2),
            style,
        )),
        "placeholder text",
    );
}

fn draw_band<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    points: &[(f64, f64, f64)],
    color: Rgba,
) -> Result<()> {
    if points.len() < 2 {
        return Ok(());
    }
    let outline: Vec<(f64, f64)> = points
        .iter()
        .map(|(x, _, hi)| (*x, *hi))
        .chain(points.iter().rev().map(|(x, lo, _)| (*x, *lo)))
        .collect();
    chart
        .draw_series(once(Polygon::new(
            outline,
            rgba(color).mix(BAND_ALPHA).filled(),
        )))
        .map_err(writer_error)?;
    Ok(())
}

/// Consecutive runs of points with a finite y
fn finite_runs(points: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for point in points {
        if point.0.is_finite() && point.1.is_finite() {
            current.push(*point);
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn draw_line<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    points: &[(f64, f64)],
    color: Rgba,
    label: Option<&str>,
    show_line: bool,
    show_marker: bool,
) -> Result<()> {
    let stroke = rgba(color).stroke_width(LINE_WIDTH);
    let fill = rgba(color).filled();
    let mut label = label;

    if show_line {
        for run in finite_runs(points) {
            let anno = chart
                .draw_series(LineSeries::new(run, stroke))
                .map_err(writer_error)?;
            if let Some(text) = label.take() {
                anno.label(text)
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], stroke));
            }
        }
    }

    if show_marker {
        let anno = chart
            .draw_series(
                points
                    .iter()
                    .filter(|(x, y)| x.is_finite() && y.is_finite())
                    .map(|&(x, y)| Circle::new((x, y), 3, fill)),
            )
            .map_err(writer_error)?;
        if let Some(text) = label.take() {
            anno.label(text)
                .legend(move |(x, y)| Circle::new((x + 10, y), 3, fill));
        }
    }

    Ok(())
}

fn draw_reference_line<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    orientation: Orientation,
    value: f64,
    xlim: (f64, f64),
    ylim: (f64, f64),
) -> Result<()> {
    let (range, path) = match orientation {
        Orientation::Horizontal => (ylim, vec![(xlim.0, value), (xlim.1, value)]),
        Orientation::Vertical => (xlim, vec![(value, ylim.0), (value, ylim.1)]),
    };
    if !value.is_finite() || value < range.0 || value > range.1 {
        return Ok(());
    }
    let style = BLACK.mix(0.5).stroke_width(1);
    chart
        .draw_series(DashedLineSeries::new(path, DASH_SIZE, DASH_SPACING, style))
        .map_err(writer_error)?;
    Ok(())
}

/// Glyph outline in pixels relative to the marker center (y grows downward)
fn glyph_outline(shape: MarkerShape, r: i32) -> Option<Vec<(i32, i32)>> {
    match shape {
        MarkerShape::TriangleDown => Some(vec![(-r, -r), (r, -r), (0, r)]),
        MarkerShape::TriangleUp => Some(vec![(-r, r), (r, r), (0, -r)]),
        MarkerShape::TriangleLeft => Some(vec![(r, -r), (r, r), (-r, 0)]),
        MarkerShape::TriangleRight => Some(vec![(-r, -r), (-r, r), (r, 0)]),
        MarkerShape::Square => Some(vec![(-r, -r), (r, -r), (r, r), (-r, r)]),
        MarkerShape::Diamond => Some(vec![(0, -r), (r, 0), (0, r), (-r, 0)]),
        MarkerShape::Star => Some(
            (0..10)
                .map(|i| {
                    let radius = if i % 2 == 0 { r as f64 } else { r as f64 * 0.45 };
                    let angle = std::f64::consts::PI * (i as f64 / 5.0 - 0.5);
                    (
                        (radius * angle.cos()).round() as i32,
                        (radius * angle.sin()).round() as i32,
                    )
                })
                .collect(),
        ),
        MarkerShape::Circle | MarkerShape::Cross | MarkerShape::Plus => None,
    }
}

fn draw_error_marker<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    (x, y): (f64, f64),
    err: f64,
    orientation: Orientation,
    shape: MarkerShape,
    color: Rgba,
    label: Option<&str>,
) -> Result<()> {
    let stroke = rgba(color).stroke_width(1);
    let fill = rgba(color).filled();

    match orientation {
        Orientation::Horizontal => chart.draw_series(once(ErrorBar::new_horizontal(
            y,
            x - err,
            x,
            x + err,
            stroke,
            CAP_WIDTH,
        ))),
        Orientation::Vertical => chart.draw_series(once(ErrorBar::new_vertical(
            x,
            y - err,
            y,
            y + err,
            stroke,
            CAP_WIDTH,
        ))),
    }
    .map_err(writer_error)?;

    let r = MARKER_SIZE;
    let anno = match (glyph_outline(shape, r), shape) {
        (Some(outline), _) => chart.draw_series(once(EmptyElement::at((x, y)) + Polygon::new(outline, fill))),
        (None, MarkerShape::Cross) => chart.draw_series(once(
            EmptyElement::at((x, y))
                + PathElement::new(vec![(-r, -r), (r, r)], stroke.stroke_width(2))
                + PathElement::new(vec![(-r, r), (r, -r)], stroke.stroke_width(2)),
        )),
        (None, MarkerShape::Plus) => chart.draw_series(once(
            EmptyElement::at((x, y))
                + PathElement::new(vec![(-r, 0), (r, 0)], stroke.stroke_width(2))
                + PathElement::new(vec![(0, -r), (0, r)], stroke.stroke_width(2)),
        )),
        (None, _) => chart.draw_series(once(Circle::new((x, y), r, fill))),
    }
    .map_err(writer_error)?;

    if let Some(text) = label {
        anno.label(text)
            .legend(move |(lx, ly)| Circle::new((lx + 10, ly), 4, fill));
    }
    Ok(())
}

/// Single-figure SVG writer used for live tile previews
pub struct SvgWriter {
    size: (u32, u32),
}

impl SvgWriter {
    pub fn new(size: (u32, u32)) -> Self {
        Self { size }
    }
}

impl Writer for SvgWriter {
    type Output = String;

    fn write(&self, figure: &Figure) -> Result<String> {
        let mut buffer = String::new();
        {
            let root = SVGBackend::with_string(&mut buffer, self.size).into_drawing_area();
            match figure.current() {
                Some(axes) => draw_axes(&root, axes)?,
                None => root.fill(&WHITE).map_err(writer_error)?,
            }
            root.present().map_err(writer_error)?;
        }
        Ok(buffer)
    }
}
