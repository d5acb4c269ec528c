//! Output writers
//!
//! Writers turn rendered figures into files or strings. Both the live tile
//! preview and the static grid export draw through
//! [`plotters::draw_axes`], so an exported panel is the same drawing the tile
//! shows.
//!
//! # Example
//!
//! ```rust,ignore
//! use plotgrid::writer::{Writer, SvgWriter};
//!
//! let svg = SvgWriter::new((400, 300)).write(tile.figure())?;
//! ```

pub mod export;
pub mod plotters;

pub use self::export::{draw_grid, export_grid, ExportFormat, ExportOptions};
pub use self::plotters::{draw_axes, SvgWriter};

use crate::Result;

/// Trait for output formats
pub trait Writer {
    /// Output type produced by this writer
    type Output;

    /// Write a rendered figure
    fn write(&self, figure: &crate::figure::Figure) -> Result<Self::Output>;
}
