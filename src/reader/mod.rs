//! Tabular data sources
//!
//! A [`DataSource`] pairs a loaded data frame with its identity, origin and an
//! inferred column schema. Data frames are shared read-only (`Arc`) between
//! every tile that plots them.
//!
//! # Example
//!
//! ```rust,ignore
//! use plotgrid::reader::{load_csv, Reader, CsvReader};
//!
//! let source = load_csv("data/results.csv", None)?;
//! let same = CsvReader::new().load("data/results.csv".as_ref(), Some("results"))?;
//! ```

mod csv;

pub use self::csv::{load_csv, CsvReader};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::plot::facet::distinct_values;
use crate::Result;

/// Numeric columns with at most this many distinct values may be categorical
pub const MAX_NUMERIC_CATEGORIES: usize = 20;

/// ... and at most this fraction of the row count
pub const NUMERIC_CATEGORY_FRACTION: f64 = 0.05;

/// Kind of variable a column holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarType {
    Categorical,
    Continuous,
    Ordinal,
}

/// Inferred description of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub dtype: String,
    pub var_type: VarType,
    /// Sorted distinct values, for categorical and ordinal columns
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

/// A loaded table and where it came from
#[derive(Debug, Clone)]
pub struct DataSource {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    pub dataframe: Arc<DataFrame>,
    pub schema: Vec<ColumnSchema>,
}

/// Serializable part of a [`DataSource`]: everything except the data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceDescriptor {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub schema: Vec<ColumnSchema>,
}

impl DataSource {
    /// Wrap an in-memory frame, inferring its schema
    pub fn from_dataframe(
        df: DataFrame,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Result<Self> {
        let schema = build_schema(&df)?;
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            path: path.into(),
            dataframe: Arc::new(df),
            schema,
        })
    }

    pub fn descriptor(&self) -> DataSourceDescriptor {
        DataSourceDescriptor {
            id: self.id.clone(),
            name: self.name.clone(),
            path: self.path.clone(),
            schema: self.schema.clone(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.schema.iter().find(|c| c.name == name)
    }

    /// Names of columns inferred as categorical or ordinal
    pub fn categorical_columns(&self) -> Vec<&str> {
        self.schema
            .iter()
            .filter(|c| c.var_type != VarType::Continuous)
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// Trait for data source loaders
pub trait Reader {
    /// Load the file at `path`; `name` defaults to the file stem
    fn load(&self, path: &Path, name: Option<&str>) -> Result<DataSource>;
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Classify a column.
///
/// Numeric columns with few distinct values relative to the row count are
/// categorical (codes, doses, repetition indices); other numeric columns are
/// continuous. Everything non-numeric is categorical.
pub fn infer_var_type(column: &Column) -> Result<VarType> {
    if !is_numeric(column.dtype()) {
        return Ok(VarType::Categorical);
    }
    let distinct = column.as_materialized_series().drop_nulls().n_unique()?;
    let threshold = ((NUMERIC_CATEGORY_FRACTION * column.len() as f64) as usize).max(1);
    if distinct <= MAX_NUMERIC_CATEGORIES && distinct <= threshold {
        Ok(VarType::Categorical)
    } else {
        Ok(VarType::Continuous)
    }
}

/// Infer the schema of every column, in frame order
pub fn build_schema(df: &DataFrame) -> Result<Vec<ColumnSchema>> {
    df.get_columns()
        .iter()
        .map(|column| {
            let name = column.name().to_string();
            let var_type = infer_var_type(column)?;
            let categories = match var_type {
                VarType::Continuous => None,
                VarType::Categorical | VarType::Ordinal => Some(
                    distinct_values(df, &name)?
                        .into_iter()
                        .map(|value| value.to_string())
                        .collect(),
                ),
            };
            Ok(ColumnSchema {
                name,
                dtype: column.dtype().to_string(),
                var_type,
                categories,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_var_types() {
        let doses: Vec<i64> = (0..100).map(|i| (i % 3) * 10).collect();
        let values: Vec<f64> = (0..100).map(|i| i as f64 * 0.5).collect();
        let labels: Vec<&str> = (0..100).map(|i| if i % 2 == 0 { "a" } else { "b" }).collect();
        let df = df! {
            "dose" => doses,
            "value" => values,
            "label" => labels,
        }
        .unwrap();

        let schema = build_schema(&df).unwrap();
        assert_eq!(schema[0].var_type, VarType::Categorical);
        assert_eq!(
            schema[0].categories,
            Some(vec!["0".to_string(), "10".to_string(), "20".to_string()])
        );
        assert_eq!(schema[1].var_type, VarType::Continuous);
        assert_eq!(schema[1].categories, None);
        assert_eq!(schema[2].var_type, VarType::Categorical);
        assert_eq!(schema[2].dtype, "str");
    }

    #[test]
    fn test_small_numeric_column_is_continuous() {
        // 5% of 10 rows rounds down to 0, so at most 1 distinct value counts as categorical
        let df = df! { "x" => &[1, 2, 3, 1, 2, 3, 1, 2, 3, 1] }.unwrap();
        assert_eq!(
            infer_var_type(df.column("x").unwrap()).unwrap(),
            VarType::Continuous
        );
        let constant = df! { "x" => &[7, 7, 7] }.unwrap();
        assert_eq!(
            infer_var_type(constant.column("x").unwrap()).unwrap(),
            VarType::Categorical
        );
    }

    #[test]
    fn test_var_type_serde() {
        assert_eq!(
            serde_json::to_string(&VarType::Continuous).unwrap(),
            "\"continuous\""
        );
    }

    #[test]
    fn test_descriptor_and_categorical_columns() {
        let df = df! {
            "group" => &["a", "b"],
            "y" => &[1.5, 2.5],
        }
        .unwrap();
        let source = DataSource::from_dataframe(df, "mem", "mem.csv").unwrap();
        assert_eq!(source.categorical_columns(), vec!["group"]);
        let descriptor = source.descriptor();
        assert_eq!(descriptor.id, source.id);
        assert_eq!(descriptor.schema.len(), 2);
        assert!(source.column("y").is_some());
    }
}
