//! Error-bar marker annotations
//!
//! An [`ErrorMarker`] is a manually placed point with a one-axis error bar,
//! independent of the plotted data. Its coordinates are optional: a missing
//! coordinate on the stacking axis is filled in by the overlay engine at render
//! time (see `render::overlay`).

use serde::{Deserialize, Serialize};

use crate::{PlotgridError, Result};

/// Marker glyph, stored in project files as a single-character token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MarkerShape {
    #[default]
    #[serde(rename = "v")]
    TriangleDown,
    #[serde(rename = "^")]
    TriangleUp,
    #[serde(rename = "<")]
    TriangleLeft,
    #[serde(rename = ">")]
    TriangleRight,
    #[serde(rename = "o")]
    Circle,
    #[serde(rename = "s")]
    Square,
    #[serde(rename = "D")]
    Diamond,
    #[serde(rename = "*")]
    Star,
    #[serde(rename = "x")]
    Cross,
    #[serde(rename = "+")]
    Plus,
}

impl MarkerShape {
    pub const ALL: [MarkerShape; 10] = [
        MarkerShape::TriangleDown,
        MarkerShape::TriangleUp,
        MarkerShape::TriangleLeft,
        MarkerShape::TriangleRight,
        MarkerShape::Circle,
        MarkerShape::Square,
        MarkerShape::Diamond,
        MarkerShape::Star,
        MarkerShape::Cross,
        MarkerShape::Plus,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            MarkerShape::TriangleDown => "v",
            MarkerShape::TriangleUp => "^",
            MarkerShape::TriangleLeft => "<",
            MarkerShape::TriangleRight => ">",
            MarkerShape::Circle => "o",
            MarkerShape::Square => "s",
            MarkerShape::Diamond => "D",
            MarkerShape::Star => "*",
            MarkerShape::Cross => "x",
            MarkerShape::Plus => "+",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|shape| shape.token() == token)
    }
}

/// One error-bar annotation attached to a plot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMarker {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub xerr: Option<f64>,
    #[serde(default)]
    pub yerr: Option<f64>,
    #[serde(default)]
    pub marker: MarkerShape,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub label: Option<String>,
}

fn default_color() -> String {
    "red".to_string()
}

impl ErrorMarker {
    /// Marker with a horizontal error bar, stacked from the top when `y` is unset
    pub fn x_error(x: Option<f64>, xerr: f64) -> Self {
        Self {
            x,
            y: None,
            xerr: Some(xerr),
            yerr: None,
            marker: MarkerShape::default(),
            color: default_color(),
            label: None,
        }
    }

    /// Marker with a vertical error bar, stacked from the right when `x` is unset
    pub fn y_error(y: Option<f64>, yerr: f64) -> Self {
        Self {
            x: None,
            y,
            xerr: None,
            yerr: Some(yerr),
            marker: MarkerShape::default(),
            color: default_color(),
            label: None,
        }
    }

    pub fn at(mut self, x: Option<f64>, y: Option<f64>) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_shape(mut self, shape: MarkerShape) -> Self {
        self.marker = shape;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Entry-boundary check: at least one error magnitude, all numbers finite,
    /// and a non-empty color.
    ///
    /// Rendering does not call this; the overlay engine tolerates markers that
    /// fail it.
    pub fn validate(&self) -> Result<()> {
        if self.xerr.is_none() && self.yerr.is_none() {
            return Err(PlotgridError::ValidationError(
                "Error marker needs an X or Y error value".to_string(),
            ));
        }
        let numbers = [self.x, self.y, self.xerr, self.yerr];
        if numbers.iter().flatten().any(|v| !v.is_finite()) {
            return Err(PlotgridError::ValidationError(
                "Error marker values must be finite numbers".to_string(),
            ));
        }
        if self.color.trim().is_empty() {
            return Err(PlotgridError::ValidationError(
                "Error marker color is required".to_string(),
            ));
        }
        Ok(())
    }
}
