//! Reserved column names used on working copies of user data
//!
//! Render and aggregation steps add or rename columns on private copies of a
//! data frame. Those names carry a `__plotgrid_` prefix so they cannot collide
//! with columns found in real CSV files.

/// Synthesized composite hue key (one string per row)
pub const HUE_KEY: &str = "__plotgrid_hue__";

/// Numeric copy of the x column
pub const X: &str = "__plotgrid_x__";

/// Numeric copy of the y column
pub const Y: &str = "__plotgrid_y__";

/// Replicate / subject identifier used by computed SEM
pub const SUBJECT: &str = "__plotgrid_subject__";

/// Numeric copy of a pre-computed SEM column
pub const SEM: &str = "__plotgrid_sem__";

/// Aggregated mean of y
pub const MEAN: &str = "__plotgrid_mean__";

/// Sample standard deviation across replicates
pub const STD: &str = "__plotgrid_std__";

/// Number of non-null replicate values
pub const COUNT: &str = "__plotgrid_count__";

/// Check whether a column name belongs to the reserved namespace
pub fn is_reserved(name: &str) -> bool {
    name.starts_with("__plotgrid_") && name.ends_with("__")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_names() {
        assert!(is_reserved(HUE_KEY));
        assert!(is_reserved(MEAN));
        assert!(!is_reserved("species"));
        assert!(!is_reserved("__plotgrid_partial"));
    }
}
