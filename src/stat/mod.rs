//! Aggregation & SEM engine
//!
//! Turns one already-filtered, already-hue-sliced data frame into a single
//! [`AggregatedSeries`]: one point per distinct x, carrying the mean of y and,
//! when a SEM column is configured, a standard error of the mean.
//!
//! Three paths exist:
//!
//! - **No SEM**: group by x, mean of y.
//! - **Computed SEM**: group by (subject, x) and average y to one value per
//!   replicate, then per x take the mean and the SEM (`std(ddof=1) / sqrt(n)`)
//!   across replicates.
//! - **Pre-computed SEM**: group by x and average both y and the supplied SEM
//!   column. Duplicate x rows are averaged and reported with a warning.
//!
//! x and y are coerced to floating point; unparseable cells become missing.
//! Rows with a missing x are dropped. Missing y values are ignored by the mean.

use polars::prelude::*;

use crate::{naming, Result};

/// How the SEM band of a series is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemMode<'a> {
    /// Mean line only
    None,
    /// Derive SEM across replicates identified by this column
    Computed(&'a str),
    /// Trust per-row SEM values from this column
    Precomputed(&'a str),
}

impl<'a> SemMode<'a> {
    pub fn from_config(sem_column: Option<&'a str>, precomputed: bool) -> Self {
        match (sem_column, precomputed) {
            (None, _) => SemMode::None,
            (Some(column), false) => SemMode::Computed(column),
            (Some(column), true) => SemMode::Precomputed(column),
        }
    }

    pub fn is_some(&self) -> bool {
        !matches!(self, SemMode::None)
    }
}

/// One aggregated point; `mean` is NaN when every y at this x was missing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub x: f64,
    pub mean: f64,
    pub sem: Option<f64>,
}

/// x-sorted aggregated series for one hue group
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregatedSeries {
    pub points: Vec<SeriesPoint>,
    /// A SEM column was configured for this series
    pub sem_supplied: bool,
    /// Pre-computed mode found several rows for one x and averaged them
    pub duplicates_averaged: bool,
}

impl AggregatedSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn xs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn means(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.mean).collect()
    }

    /// Whether a band should be drawn: a SEM column was given and at least one
    /// point carries a finite SEM.
    pub fn has_band(&self) -> bool {
        self.sem_supplied
            && self
                .points
                .iter()
                .any(|p| p.sem.is_some_and(|s| s.is_finite()))
    }

    /// `(x, mean - sem, mean + sem)` per point with a finite mean. Undefined SEM
    /// counts as zero width.
    pub fn band(&self) -> Vec<(f64, f64, f64)> {
        self.points
            .iter()
            .filter(|p| p.mean.is_finite())
            .map(|p| {
                let sem = p.sem.filter(|s| s.is_finite()).unwrap_or(0.0);
                (p.x, p.mean - sem, p.mean + sem)
            })
            .collect()
    }

    /// Lowest and highest visible y: the band edges when a SEM column was
    /// given, otherwise the means.
    pub fn y_extent(&self) -> Option<(f64, f64)> {
        let values: Vec<(f64, f64)> = if self.sem_supplied {
            self.band().into_iter().map(|(_, lo, hi)| (lo, hi)).collect()
        } else {
            self.points
                .iter()
                .filter(|p| p.mean.is_finite())
                .map(|p| (p.mean, p.mean))
                .collect()
        };
        values.into_iter().fold(None, |acc, (lo, hi)| match acc {
            None => Some((lo, hi)),
            Some((min, max)) => Some((min.min(lo), max.max(hi))),
        })
    }
}

/// Aggregate `df` into one series of y-means over x.
///
/// # Errors
///
/// Fails when `x`, `y` or the SEM column is missing from the frame.
pub fn aggregate(df: &DataFrame, x: &str, y: &str, sem: SemMode) -> Result<AggregatedSeries> {
    let numeric_xy = [
        col(x).cast(DataType::Float64).alias(naming::X),
        col(y).cast(DataType::Float64).alias(naming::Y),
    ];

    match sem {
        SemMode::None => {
            let grouped = df
                .clone()
                .lazy()
                .select(numeric_xy)
                .filter(col(naming::X).is_not_null())
                .group_by([col(naming::X)])
                .agg([col(naming::Y).mean().alias(naming::MEAN)])
                .sort([naming::X], SortMultipleOptions::default())
                .collect()?;

            let points = zip_points(&grouped, |_| None)?;
            Ok(AggregatedSeries {
                points,
                sem_supplied: false,
                duplicates_averaged: false,
            })
        }
        SemMode::Computed(subject) => {
            let [x_expr, y_expr] = numeric_xy;
            let grouped = df
                .clone()
                .lazy()
                .select([x_expr, y_expr, col(subject).alias(naming::SUBJECT)])
                .filter(
                    col(naming::X)
                        .is_not_null()
                        .and(col(naming::SUBJECT).is_not_null()),
                )
                // One representative value per replicate and x
                .group_by([col(naming::SUBJECT), col(naming::X)])
                .agg([col(naming::Y).mean()])
                .group_by([col(naming::X)])
                .agg([
                    col(naming::Y).mean().alias(naming::MEAN),
                    col(naming::Y).std(1).alias(naming::STD),
                    col(naming::Y)
                        .count()
                        .cast(DataType::Float64)
                        .alias(naming::COUNT),
                ])
                .sort([naming::X], SortMultipleOptions::default())
                .collect()?;

            let stds = column_values(&grouped, naming::STD)?;
            let counts = column_values(&grouped, naming::COUNT)?;
            let points = zip_points(&grouped, |idx| match (stds[idx], counts[idx]) {
                (Some(std), Some(n)) if n > 0.0 => Some(std / n.sqrt()),
                _ => None,
            })?;
            Ok(AggregatedSeries {
                points,
                sem_supplied: true,
                duplicates_averaged: false,
            })
        }
        SemMode::Precomputed(sem_column) => {
            let [x_expr, y_expr] = numeric_xy;
            let working = df
                .clone()
                .lazy()
                .select([
                    x_expr,
                    y_expr,
                    col(sem_column).cast(DataType::Float64).alias(naming::SEM),
                ])
                .filter(col(naming::X).is_not_null())
                .collect()?;

            let grouped = working
                .clone()
                .lazy()
                .group_by([col(naming::X)])
                .agg([
                    col(naming::Y).mean().alias(naming::MEAN),
                    col(naming::SEM).mean(),
                ])
                .sort([naming::X], SortMultipleOptions::default())
                .collect()?;

            let duplicates_averaged = grouped.height() < working.height();
            if duplicates_averaged {
                tracing::warn!(
                    "Pre-computed SEM column '{}' has duplicate '{}' values; averaged {} rows into {} points. \
                     The band may misstate the true uncertainty.",
                    sem_column,
                    x,
                    working.height(),
                    grouped.height()
                );
            }

            let sems = column_values(&grouped, naming::SEM)?;
            let points = zip_points(&grouped, |idx| sems[idx])?;
            Ok(AggregatedSeries {
                points,
                sem_supplied: true,
                duplicates_averaged,
            })
        }
    }
}

/// Build points from the x and mean columns of an aggregated frame
fn zip_points(
    grouped: &DataFrame,
    sem_at: impl Fn(usize) -> Option<f64>,
) -> Result<Vec<SeriesPoint>> {
    let xs = column_values(grouped, naming::X)?;
    let means = column_values(grouped, naming::MEAN)?;
    Ok(xs
        .into_iter()
        .zip(means)
        .enumerate()
        .filter_map(|(idx, (x, mean))| {
            x.map(|x| SeriesPoint {
                x,
                mean: mean.unwrap_or(f64::NAN),
                sem: sem_at(idx),
            })
        })
        .collect())
}

/// Values of a column as optional floats
pub(crate) fn column_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}
