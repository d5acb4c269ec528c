//! Shared axis limits across a batch of related plots
//!
//! Two calculators produce one `(x-range, y-range)` pair for small multiples:
//!
//! - [`shared_limits`] spans the raw numeric values of every subset.
//! - [`shared_limits_with_sem`] spans the x values of every slice but takes y
//!   from what is actually drawn: the aggregated means, widened by SEM when a
//!   SEM column is given.
//!
//! Non-numeric cells are coerced to missing and excluded. When nothing numeric
//! is found the unit range is returned so downstream plotting never sees an
//! empty range.

pub mod palettes;

use polars::prelude::*;
use serde::Serialize;

use crate::plot::facet::{apply_filter, resolve_hue, split_groups, FilterQuery};
use crate::plot::Hue;
use crate::stat::{aggregate, SemMode};
use crate::Result;

/// Closed numeric interval `(min, max)`
pub type Range = (f64, f64);

/// Fallback range when no numeric data exists
pub const DEFAULT_RANGE: Range = (0.0, 1.0);

/// Common axis limits for a batch of plots
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SharedLimits {
    pub x: Range,
    pub y: Range,
}

impl Default for SharedLimits {
    fn default() -> Self {
        Self {
            x: DEFAULT_RANGE,
            y: DEFAULT_RANGE,
        }
    }
}

/// Running global min/max over any number of value batches
#[derive(Debug, Clone, Copy, Default)]
struct RangeAccumulator {
    range: Option<Range>,
}

impl RangeAccumulator {
    fn push(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.range = Some(match self.range {
            None => (value, value),
            Some((min, max)) => (min.min(value), max.max(value)),
        });
    }

    fn extend(&mut self, values: impl IntoIterator<Item = f64>) {
        for value in values {
            self.push(value);
        }
    }

    fn range(&self) -> Option<Range> {
        self.range
    }
}

/// Finalize both axes; if either has no values both fall back to the unit range
fn finish(x: RangeAccumulator, y: RangeAccumulator) -> SharedLimits {
    match (x.range(), y.range()) {
        (Some(x), Some(y)) => SharedLimits { x, y },
        _ => SharedLimits::default(),
    }
}

/// Numeric values of a column, with unparseable and missing cells dropped.
///
/// A missing column yields no values.
pub fn numeric_values(df: &DataFrame, column: &str) -> Vec<f64> {
    let Ok(column) = df.column(column) else {
        return Vec::new();
    };
    let Ok(series) = column.as_materialized_series().cast(&DataType::Float64) else {
        return Vec::new();
    };
    match series.f64() {
        Ok(values) => values.into_iter().flatten().filter(|v| v.is_finite()).collect(),
        Err(_) => Vec::new(),
    }
}

/// Raw shared limits over pre-filtered subsets.
///
/// Subsets that are empty, or have no numeric values in a column, contribute
/// nothing to that axis.
pub fn shared_limits(subsets: &[DataFrame], x: &str, y: &str) -> SharedLimits {
    let mut x_acc = RangeAccumulator::default();
    let mut y_acc = RangeAccumulator::default();

    for subset in subsets.iter().filter(|s| s.height() > 0) {
        x_acc.extend(numeric_values(subset, x));
        y_acc.extend(numeric_values(subset, y));
    }

    finish(x_acc, y_acc)
}

/// SEM-aware shared limits over the slices `filters` cut from `df`.
///
/// x spans the raw numeric values of each slice. y spans the aggregated series
/// of each slice (per hue group when `hue` is active): the means when
/// `sem_column` is `None`, otherwise `mean ± sem` with missing SEM counted as
/// zero width.
///
/// A slice missing the x, y, SEM or a hue column contributes nothing to y.
///
/// # Errors
///
/// Fails only when polars cannot aggregate a slice whose columns all exist.
pub fn shared_limits_with_sem(
    df: &DataFrame,
    filters: &[FilterQuery],
    x: &str,
    y: &str,
    sem_column: Option<&str>,
    hue: &Hue,
    precomputed: bool,
) -> Result<SharedLimits> {
    let mode = SemMode::from_config(sem_column, precomputed);
    let mut x_acc = RangeAccumulator::default();
    let mut y_acc = RangeAccumulator::default();

    for filter in filters {
        let slice = apply_filter(df, filter);
        if slice.height() == 0 {
            continue;
        }
        x_acc.extend(numeric_values(&slice, x));

        let required = [x, y]
            .into_iter()
            .chain(sem_column)
            .chain(hue.columns());
        if let Some(missing) = required.into_iter().find(|c| slice.column(c).is_err()) {
            tracing::debug!("Column '{}' not found; slice adds nothing to y-limits", missing);
            continue;
        }

        let (working, group_column) = resolve_hue(slice, hue)?;
        let groups = match group_column {
            Some(column) => split_groups(&working, &column)?
                .into_iter()
                .map(|(_, group)| group)
                .collect(),
            None => vec![working],
        };

        for group in groups {
            let series = aggregate(&group, x, y, mode)?;
            if let Some((lo, hi)) = series.y_extent() {
                y_acc.push(lo);
                y_acc.push(hi);
            }
        }
    }

    Ok(finish(x_acc, y_acc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(column: &str, values: &[&str]) -> Vec<FilterQuery> {
        values
            .iter()
            .map(|value| {
                let mut filter = FilterQuery::new();
                filter.insert(column.to_string(), (*value).into());
                filter
            })
            .collect()
    }

    /// Two groups whose third subject is an outlier at every x
    fn outlier_frame() -> DataFrame {
        let x: Vec<i64> = [1, 1, 1, 2, 2, 2].repeat(3);
        let y: Vec<f64> = [5.0, 10.0, 95.0, 15.0, 20.0, 90.0].repeat(3);
        let subject: Vec<&str> = ["s1", "s2", "s3"].repeat(6);
        let group: Vec<&str> = ["A"; 9].iter().chain(["B"; 9].iter()).copied().collect();
        df! {
            "x" => x,
            "y" => y,
            "subject" => subject,
            "group" => group,
        }
        .unwrap()
    }

    #[test]
    fn test_raw_limits_across_subsets() {
        let a = df! { "x" => &[1, 2, 3], "y" => &[10, 20, 30] }.unwrap();
        let b = df! { "x" => &[4, 5, 6], "y" => &[5, 15, 25] }.unwrap();
        let limits = shared_limits(&[a, b], "x", "y");
        assert_eq!(limits.x, (1.0, 6.0));
        assert_eq!(limits.y, (5.0, 30.0));
    }

    #[test]
    fn test_raw_limits_all_empty() {
        let empty = df! {
            "x" => Vec::<f64>::new(),
            "y" => Vec::<f64>::new(),
        }
        .unwrap();
        assert_eq!(shared_limits(&[empty.clone(), empty], "x", "y"), SharedLimits::default());
        assert_eq!(shared_limits(&[], "x", "y"), SharedLimits::default());
    }

    #[test]
    fn test_raw_limits_exclude_unparseable() {
        let a = df! {
            "x" => &["1", "n/a", "3"],
            "y" => &["10", "20", "bad"],
        }
        .unwrap();
        let limits = shared_limits(&[a], "x", "y");
        assert_eq!(limits.x, (1.0, 3.0));
        assert_eq!(limits.y, (10.0, 20.0));
    }

    #[test]
    fn test_raw_limits_missing_column_contributes_nothing() {
        let a = df! { "x" => &[1.0, 2.0], "y" => &[3.0, 4.0] }.unwrap();
        let b = df! { "x" => &[10.0] }.unwrap();
        let limits = shared_limits(&[a, b], "x", "y");
        assert_eq!(limits.x, (1.0, 10.0));
        assert_eq!(limits.y, (3.0, 4.0));
    }

    #[test]
    fn test_sem_limits_missing_columns_fall_back() {
        let df = df! { "x" => &[1.0, 2.0], "y" => &[3.0, 4.0], "g" => &["a", "b"] }.unwrap();
        let all = vec![FilterQuery::new()];

        let missing_y = shared_limits_with_sem(&df, &all, "x", "nope", None, &Hue::None, false).unwrap();
        assert_eq!(missing_y, SharedLimits::default());

        for precomputed in [false, true] {
            let missing_sem =
                shared_limits_with_sem(&df, &all, "x", "y", Some("nosem"), &Hue::None, precomputed)
                    .unwrap();
            assert_eq!(missing_sem, SharedLimits::default());
        }

        let missing_hue =
            shared_limits_with_sem(&df, &all, "x", "y", None, &Hue::from(vec!["g", "h"]), false)
                .unwrap();
        assert_eq!(missing_hue, SharedLimits::default());

        let ok = shared_limits_with_sem(&df, &all, "x", "y", None, &Hue::from("g"), false).unwrap();
        assert_eq!(ok.y, (3.0, 4.0));
    }

    #[test]
    fn test_sem_limits_tighter_than_raw_with_outliers() {
        let df = outlier_frame();
        let queries = filters("group", &["A", "B"]);

        let subsets: Vec<DataFrame> = queries.iter().map(|f| apply_filter(&df, f)).collect();
        let raw = shared_limits(&subsets, "x", "y");
        assert_eq!(raw.y, (5.0, 95.0));

        let sem = shared_limits_with_sem(&df, &queries, "x", "y", Some("subject"), &Hue::None, false)
            .unwrap();
        assert!(sem.y.0 > raw.y.0);
        assert!(sem.y.1 < raw.y.1);
        assert!(0.0 < sem.y.0 && sem.y.0 < 50.0);
        assert!(20.0 < sem.y.1 && sem.y.1 < 100.0);
        assert_eq!(sem.x, (1.0, 2.0));
    }

    #[test]
    fn test_sem_limits_with_hue() {
        let x: Vec<i64> = [1, 1, 1, 2, 2, 2].repeat(4);
        let low = [10.0, 12.0, 14.0, 20.0, 22.0, 24.0].repeat(2);
        let high = [30.0, 32.0, 34.0, 40.0, 42.0, 44.0].repeat(2);
        let y: Vec<f64> = low.into_iter().chain(high).collect();
        let subject: Vec<&str> = ["s1", "s2", "s3"].repeat(8);
        let condition: Vec<&str> = [["A"; 6], ["B"; 6], ["A"; 6], ["B"; 6]].concat();
        let group: Vec<&str> = [["G1"; 12], ["G2"; 12]].concat();
        let df = df! {
            "x" => x,
            "y" => y,
            "subject" => subject,
            "condition" => condition,
            "group" => group,
        }
        .unwrap();

        let limits = shared_limits_with_sem(
            &df,
            &filters("group", &["G1", "G2"]),
            "x",
            "y",
            Some("subject"),
            &Hue::from("condition"),
            false,
        )
        .unwrap();
        assert!(limits.y.0 < 15.0);
        assert!(limits.y.1 > 40.0);
    }

    #[test]
    fn test_sem_limits_without_sem_column_use_means() {
        let df = df! {
            "x" => &[1, 1, 2, 2],
            "y" => &[10.0, 12.0, 20.0, 22.0],
            "group" => &["A", "A", "A", "A"],
        }
        .unwrap();
        let limits =
            shared_limits_with_sem(&df, &filters("group", &["A"]), "x", "y", None, &Hue::None, false)
                .unwrap();
        assert_eq!(limits.y, (11.0, 21.0));
        assert_eq!(limits.x, (1.0, 2.0));
    }

    #[test]
    fn test_sem_limits_missing_sem_is_zero_width() {
        let df = df! {
            "x" => &[1, 2],
            "y" => &[10.0, 20.0],
            "sem" => &[None, Some(2.0)],
        }
        .unwrap();
        let limits = shared_limits_with_sem(
            &df,
            &[FilterQuery::new()],
            "x",
            "y",
            Some("sem"),
            &Hue::None,
            true,
        )
        .unwrap();
        assert_eq!(limits.y, (10.0, 22.0));
    }

    #[test]
    fn test_sem_limits_empty_slices_default() {
        let df = outlier_frame();
        let limits = shared_limits_with_sem(
            &df,
            &filters("group", &["Z"]),
            "x",
            "y",
            Some("subject"),
            &Hue::None,
            false,
        )
        .unwrap();
        assert_eq!(limits, SharedLimits::default());
    }
}
