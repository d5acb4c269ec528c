//! Group expansion and data slicing for small multiples
//!
//! This module turns categorical columns into concrete equality filters (one
//! per plot), applies those filters to private copies of a data frame, and
//! splits a frame into hue groups for rendering.

mod types;

pub use types::{filter_title, FilterQuery, FilterValue};

use polars::prelude::*;

use crate::plot::Hue;
use crate::{naming, PlotgridError, Result};

/// Hard usability ceiling on the number of plots one expansion may produce
pub const MAX_GROUP_COMBINATIONS: usize = 50;

/// Sorted distinct non-missing values of a column
///
/// Fails when the column does not exist.
pub fn distinct_values(df: &DataFrame, column: &str) -> Result<Vec<FilterValue>> {
    let series = df
        .column(column)?
        .as_materialized_series()
        .drop_nulls()
        .unique()?;

    let mut values: Vec<FilterValue> = (0..series.len())
        .filter_map(|idx| series.get(idx).ok())
        .filter_map(|value| FilterValue::from_any_value(&value))
        .collect();
    values.sort_by(FilterValue::natural_cmp);
    values.dedup();
    Ok(values)
}

/// Enumerate the Cartesian product of the distinct values of `groups`.
///
/// Each combination maps every group column to one value. Combinations come
/// out in lexicographic order of the per-column sorted values, with the first
/// column varying slowest. An empty `groups` list yields one empty filter
/// (no filtering, one plot).
///
/// # Errors
///
/// Returns `PlotgridError::GroupLimitError` when the product exceeds
/// [`MAX_GROUP_COMBINATIONS`], and a data error when a group column is missing.
pub fn expand_groups(df: &DataFrame, groups: &[String]) -> Result<Vec<FilterQuery>> {
    if groups.is_empty() {
        return Ok(vec![FilterQuery::new()]);
    }

    let uniques = groups
        .iter()
        .map(|group| distinct_values(df, group))
        .collect::<Result<Vec<_>>>()?;

    let total = uniques
        .iter()
        .try_fold(1usize, |acc, values| acc.checked_mul(values.len()))
        .unwrap_or(usize::MAX);
    if total > MAX_GROUP_COMBINATIONS {
        return Err(PlotgridError::GroupLimitError(format!(
            "Too many combinations ({} > {}). Reduce groups or categories.",
            total, MAX_GROUP_COMBINATIONS
        )));
    }

    let mut combos = vec![FilterQuery::new()];
    for (group, values) in groups.iter().zip(&uniques) {
        combos = combos
            .into_iter()
            .flat_map(|prefix| {
                values.iter().map(move |value| {
                    let mut combo = prefix.clone();
                    combo.insert(group.clone(), value.clone());
                    combo
                })
            })
            .collect();
    }
    Ok(combos)
}

/// Apply an equality filter to a copy of `df`.
///
/// The caller's frame is never modified. A filter naming a column that does
/// not exist, or a value that cannot be compared with the column's type,
/// yields an empty frame with the original schema rather than an error.
pub fn apply_filter(df: &DataFrame, filter: &FilterQuery) -> DataFrame {
    let predicate = filter
        .iter()
        .map(|(column, value)| col(column.as_str()).eq(value.to_lit()))
        .reduce(|acc, expr| acc.and(expr));
    let Some(predicate) = predicate else {
        return df.clone();
    };

    if let Some(missing) = filter.keys().find(|column| df.column(column).is_err()) {
        tracing::debug!("Filter column '{}' not found; plotting no rows", missing);
        return df.clear();
    }

    match df.clone().lazy().filter(predicate).collect() {
        Ok(filtered) => filtered,
        Err(e) => {
            tracing::debug!("Filter could not be applied ({}); plotting no rows", e);
            df.clear()
        }
    }
}

/// Resolve a hue specification to one grouping column on a working copy.
///
/// A composite hue synthesizes a string key `"a=1, b=x"` per row under a
/// reserved column name. Only the returned frame carries that column.
pub fn resolve_hue(df: DataFrame, hue: &Hue) -> Result<(DataFrame, Option<String>)> {
    match hue {
        Hue::None => Ok((df, None)),
        Hue::Single(column) => Ok((df, Some(column.clone()))),
        Hue::Composite(columns) if columns.is_empty() => Ok((df, None)),
        Hue::Composite(columns) => {
            let sources = columns
                .iter()
                .map(|name| df.column(name))
                .collect::<PolarsResult<Vec<_>>>()?;

            let keys: Vec<String> = (0..df.height())
                .map(|row| {
                    columns
                        .iter()
                        .zip(&sources)
                        .map(|(name, column)| format!("{}={}", name, cell_label(column, row)))
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .collect();

            let mut df = df;
            df.with_column(Series::new(naming::HUE_KEY.into(), keys))?;
            Ok((df, Some(naming::HUE_KEY.to_string())))
        }
    }
}

/// Split `df` into one slice per distinct value of `group_column`, in natural
/// key order, labelled by the stringified key.
pub fn split_groups(df: &DataFrame, group_column: &str) -> Result<Vec<(String, DataFrame)>> {
    distinct_values(df, group_column)?
        .into_iter()
        .map(|value| {
            let slice = df
                .clone()
                .lazy()
                .filter(col(group_column).eq(value.to_lit()))
                .collect()?;
            Ok((value.to_string(), slice))
        })
        .collect()
}

fn cell_label(column: &Column, row: usize) -> String {
    column
        .get(row)
        .ok()
        .and_then(|value| FilterValue::from_any_value(&value))
        .map(|value| value.to_string())
        .unwrap_or_else(|| "nan".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn groups(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_expand_groups_no_groups() {
        let df = df! { "x" => &[1, 2] }.unwrap();
        let combos = expand_groups(&df, &[]).unwrap();
        assert_eq!(combos, vec![FilterQuery::new()]);
    }

    #[test]
    fn test_expand_groups_single_column() {
        let df = df! {
            "species" => &["b", "a", "b", "c"],
        }
        .unwrap();
        let combos = expand_groups(&df, &groups(&["species"])).unwrap();
        let values: Vec<String> = combos.iter().map(|c| c["species"].to_string()).collect();
        assert_eq!(values, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_expand_groups_two_columns() {
        let df = df! {
            "species" => &["A", "A", "B", "B"],
            "treatment" => &["Y", "X", "X", "Y"],
        }
        .unwrap();
        let combos = expand_groups(&df, &groups(&["species", "treatment"])).unwrap();
        let titles: Vec<String> = combos.iter().filter_map(filter_title).collect();
        assert_eq!(
            titles,
            vec![
                "species=A, treatment=X",
                "species=A, treatment=Y",
                "species=B, treatment=X",
                "species=B, treatment=Y",
            ]
        );
    }

    #[test]
    fn test_expand_groups_skips_nulls() {
        let df = df! {
            "g" => &[Some("a"), None, Some("b")],
        }
        .unwrap();
        let combos = expand_groups(&df, &groups(&["g"])).unwrap();
        assert_eq!(combos.len(), 2);
    }

    #[test]
    fn test_expand_groups_exceeds_limit() {
        let a: Vec<i64> = (0..8).collect();
        let b: Vec<i64> = (0..7).collect();
        let a_col: Vec<i64> = a.iter().flat_map(|v| std::iter::repeat(*v).take(7)).collect();
        let b_col: Vec<i64> = (0..8).flat_map(|_| b.clone()).collect();
        let df = df! { "a" => a_col, "b" => b_col }.unwrap();

        let err = expand_groups(&df, &groups(&["a", "b"])).unwrap_err();
        assert!(matches!(err, PlotgridError::GroupLimitError(_)));
        assert!(err.to_string().contains("Reduce groups or categories"));
    }

    #[test]
    fn test_expand_groups_at_limit() {
        let values: Vec<i64> = (0..50).collect();
        let df = df! { "a" => values }.unwrap();
        assert_eq!(expand_groups(&df, &groups(&["a"])).unwrap().len(), 50);
    }

    #[test]
    fn test_expand_groups_missing_column() {
        let df = df! { "x" => &[1] }.unwrap();
        assert!(expand_groups(&df, &groups(&["nope"])).is_err());
    }

    #[test]
    fn test_apply_filter_leaves_input_untouched() {
        let df = df! {
            "x" => &[1, 2, 3, 4],
            "g" => &["a", "b", "a", "b"],
        }
        .unwrap();
        let mut filter = FilterQuery::new();
        filter.insert("g".into(), "a".into());

        let filtered = apply_filter(&df, &filter);
        assert_eq!(filtered.height(), 2);
        assert_eq!(df.height(), 4);
    }

    #[test]
    fn test_apply_filter_missing_column_is_empty() {
        let df = df! { "x" => &[1, 2] }.unwrap();
        let mut filter = FilterQuery::new();
        filter.insert("nope".into(), "a".into());

        let filtered = apply_filter(&df, &filter);
        assert_eq!(filtered.height(), 0);
        assert_eq!(filtered.width(), 1);
    }

    #[test]
    fn test_apply_filter_numeric_value() {
        let df = df! {
            "dose" => &[10i64, 20, 10],
            "y" => &[1.0, 2.0, 3.0],
        }
        .unwrap();
        let mut filter = FilterQuery::new();
        filter.insert("dose".into(), FilterValue::Int(10));
        assert_eq!(apply_filter(&df, &filter).height(), 2);
    }

    #[test]
    fn test_resolve_composite_hue() {
        let df = df! {
            "species" => &["A", "B"],
            "gender" => &["male", "female"],
        }
        .unwrap();
        let hue = Hue::Composite(vec!["species".into(), "gender".into()]);
        let (working, key) = resolve_hue(df.clone(), &hue).unwrap();

        assert_eq!(key.as_deref(), Some(naming::HUE_KEY));
        let labels: Vec<String> = split_groups(&working, naming::HUE_KEY)
            .unwrap()
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(
            labels,
            vec!["species=A, gender=male", "species=B, gender=female"]
        );
        // Original frame never sees the synthesized column
        assert!(df.column(naming::HUE_KEY).is_err());
    }

    #[test]
    fn test_resolve_empty_composite_is_no_hue() {
        let df = df! { "x" => &[1] }.unwrap();
        let (_, key) = resolve_hue(df, &Hue::Composite(vec![])).unwrap();
        assert_eq!(key, None);
    }

    #[test]
    fn test_split_groups_numeric_order() {
        let df = df! {
            "g" => &[10i64, 2, 10, 1],
            "y" => &[1.0, 2.0, 3.0, 4.0],
        }
        .unwrap();
        let groups = split_groups(&df, "g").unwrap();
        let labels: Vec<&str> = groups.iter().map(|(label, _)| label.as_str()).collect();
        assert_eq!(labels, vec!["1", "2", "10"]);
        assert_eq!(groups[2].1.height(), 2);
    }

    proptest! {
        #[test]
        fn prop_expansion_is_product_of_distinct_counts(
            rows in proptest::collection::vec((0i64..5, 0i64..4), 1..60)
        ) {
            let a: Vec<i64> = rows.iter().map(|(a, _)| *a).collect();
            let b: Vec<i64> = rows.iter().map(|(_, b)| *b).collect();
            let mut distinct_a = a.clone();
            distinct_a.sort();
            distinct_a.dedup();
            let mut distinct_b = b.clone();
            distinct_b.sort();
            distinct_b.dedup();

            let df = df! { "a" => a, "b" => b }.unwrap();
            let combos = expand_groups(&df, &groups(&["a", "b"])).unwrap();
            prop_assert_eq!(combos.len(), distinct_a.len() * distinct_b.len());
            for combo in &combos {
                let keys: Vec<&str> = combo.keys().map(|k| k.as_str()).collect();
                prop_assert_eq!(keys, vec!["a", "b"]);
            }
        }
    }
}
