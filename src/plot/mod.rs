//! Plot description types and the data-level helpers built on them
//!
//! # Architecture
//!
//! - `types` - [`PlotConfig`], [`PlotSpec`], [`Hue`], [`GridPosition`]
//! - `marker` - [`ErrorMarker`] annotations
//! - `facet` - group expansion, equality filters, hue splitting
//! - `scale` - shared axis limits across plots, palettes

pub mod facet;
pub mod marker;
pub mod scale;
pub mod types;

// Re-export all types for convenience
pub use facet::{FilterQuery, FilterValue};
pub use marker::*;
pub use types::*;
