//! Hue palette and color-token parsing
//!
//! Hue groups cycle through a categorical palette. Marker colors come from
//! user-typed tokens (`red`, `#FF0000`, `r`) and are parsed here.

// =============================================================================
// Categorical Color Palettes
// =============================================================================

/// D3 Category 10 - default hue cycle
pub const CATEGORY10: &[&str] = &[
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd",
    "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf",
];

/// Fallback for unparseable marker colors
pub const FALLBACK_COLOR: Rgba = Rgba(255, 0, 0, 255);

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

// =============================================================================
// Color Utilities
// =============================================================================

/// Single-letter color shorthands accepted in marker color fields
fn expand_shorthand(value: &str) -> &str {
    match value {
        "b" => "#1f77b4",
        "g" => "#2ca02c",
        "r" => "#d62728",
        "c" => "#17becf",
        "m" => "#e377c2",
        "y" => "#bcbd22",
        "k" => "black",
        "w" => "white",
        other => other,
    }
}

/// Parse a CSS color name/value (`red`, `#FF0000`, `rgb(...)`) or a one-letter
/// shorthand into RGBA.
pub fn parse_color(value: &str) -> Result<Rgba, String> {
    let token = expand_shorthand(value.trim());
    csscolorparser::parse(token)
        .map(|c| {
            let [r, g, b, a] = c.to_rgba8();
            Rgba(r, g, b, a)
        })
        .map_err(|e| format!("Invalid color '{}': {}", value, e))
}

/// Parse a color token, falling back to red
pub fn color_or_fallback(value: &str) -> Rgba {
    parse_color(value).unwrap_or_else(|e| {
        tracing::debug!("{}; using fallback", e);
        FALLBACK_COLOR
    })
}

/// Color of the `index`-th series; cycles through [`CATEGORY10`]
pub fn series_color(index: usize) -> Rgba {
    color_or_fallback(CATEGORY10[index % CATEGORY10.len()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_and_hex() {
        assert_eq!(parse_color("red").unwrap(), Rgba(255, 0, 0, 255));
        assert_eq!(parse_color("#0000FF").unwrap(), Rgba(0, 0, 255, 255));
        assert_eq!(parse_color("#f00").unwrap(), Rgba(255, 0, 0, 255));
        assert_eq!(parse_color("k").unwrap(), Rgba(0, 0, 0, 255));
    }

    #[test]
    fn test_invalid_color_falls_back() {
        assert!(parse_color("notacolor").is_err());
        assert_eq!(color_or_fallback("notacolor"), FALLBACK_COLOR);
    }

    #[test]
    fn test_series_color_cycles() {
        assert_eq!(series_color(0), series_color(10));
        assert_ne!(series_color(0), series_color(1));
        assert_eq!(series_color(0), Rgba(0x1f, 0x77, 0xb4, 255));
    }
}
