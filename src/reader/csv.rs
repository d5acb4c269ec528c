//! CSV loader

use std::path::Path;

use polars::prelude::*;

use super::{DataSource, Reader};
use crate::{naming, Result};

/// Reads comma-separated files with a header row
#[derive(Debug, Clone, Default)]
pub struct CsvReader;

impl CsvReader {
    pub fn new() -> Self {
        Self
    }
}

impl Reader for CsvReader {
    fn load(&self, path: &Path, name: Option<&str>) -> Result<DataSource> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        for column in df.get_column_names() {
            if naming::is_reserved(column.as_str()) {
                tracing::warn!(
                    "Column '{}' in {} uses a reserved internal name; hue grouping on it may misbehave",
                    column,
                    path.display()
                );
            }
        }

        let name = match name {
            Some(name) => name.to_string(),
            None => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        };

        let source = DataSource::from_dataframe(df, name, path)?;
        tracing::info!(
            "Loaded '{}' from {} ({} rows, {} columns)",
            source.name,
            path.display(),
            source.dataframe.height(),
            source.dataframe.width()
        );
        Ok(source)
    }
}

/// Load a CSV file into a [`DataSource`] with a fresh id and inferred schema
pub fn load_csv(path: impl AsRef<Path>, name: Option<&str>) -> Result<DataSource> {
    CsvReader::new().load(path.as_ref(), name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::VarType;
    use std::io::Write;

    #[test]
    fn test_load_csv_infers_schema_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "time,accuracy,model").unwrap();
        for i in 0..40 {
            writeln!(file, "{},{},{}", i, i as f64 * 0.01, if i % 2 == 0 { "a" } else { "b" }).unwrap();
        }
        drop(file);

        let source = load_csv(&path, None).unwrap();
        assert_eq!(source.name, "results");
        assert_eq!(source.dataframe.height(), 40);
        assert_eq!(source.column("time").unwrap().var_type, VarType::Continuous);
        assert_eq!(
            source.column("model").unwrap().categories,
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(source.path, path);
    }

    #[test]
    fn test_load_csv_named_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.csv");
        std::fs::write(&path, "x,y\n1,2\n").unwrap();
        assert_eq!(load_csv(&path, Some("custom")).unwrap().name, "custom");

        assert!(load_csv(dir.path().join("missing.csv"), None).is_err());
    }
}
