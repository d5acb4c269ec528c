//! Project files
//!
//! A project (`.ppo`) is a JSON document holding the grid size, the data
//! sources a layout reads, and one [`PlotSpec`] per placed plot. Data source
//! paths are written relative to the directory containing the project file, so
//! a project and its data can move together.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::plot::PlotSpec;
use crate::reader::DataSourceDescriptor;
use crate::{PlotgridError, Result};

/// Format version written by [`save_project`]
pub const PROJECT_VERSION: &str = "0.9.0";

/// Major version every readable project must share
const SUPPORTED_MAJOR: u64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub rows: usize,
    pub cols: usize,
}

/// On-disk project document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub version: String,
    pub grid: GridSize,
    #[serde(default)]
    pub data_sources: Vec<DataSourceDescriptor>,
    #[serde(default)]
    pub plots: Vec<PlotSpec>,
}

impl ProjectFile {
    pub fn new(
        rows: usize,
        cols: usize,
        data_sources: Vec<DataSourceDescriptor>,
        plots: Vec<PlotSpec>,
    ) -> Self {
        Self {
            version: PROJECT_VERSION.to_string(),
            grid: GridSize { rows, cols },
            data_sources,
            plots,
        }
    }

    pub fn data_source(&self, id: &str) -> Option<&DataSourceDescriptor> {
        self.data_sources.iter().find(|ds| ds.id == id)
    }
}

/// Write `project` to `path` as pretty JSON.
///
/// Data source paths are stored relative to the project's directory; the
/// in-memory project is left untouched.
pub fn save_project(project: &ProjectFile, path: impl AsRef<Path>) -> Result<()> {
    let path = absolute(path.as_ref())?;
    let root = path.parent().unwrap_or(Path::new("/")).to_path_buf();

    let mut stored = project.clone();
    for source in &mut stored.data_sources {
        let target = absolute(&source.path)?;
        source.path = relative_to(&target, &root).unwrap_or(target);
    }

    let json = serde_json::to_string_pretty(&stored)?;
    std::fs::write(&path, json)?;
    tracing::info!(
        "Saved project to {} ({} data sources, {} plots)",
        path.display(),
        stored.data_sources.len(),
        stored.plots.len()
    );
    Ok(())
}

/// Read a project file, checking its version and resolving data source paths
/// to absolute paths.
pub fn load_project(path: impl AsRef<Path>) -> Result<ProjectFile> {
    let path = absolute(path.as_ref())?;
    let text = std::fs::read_to_string(&path)?;
    let mut project: ProjectFile = serde_json::from_str(&text)?;
    check_version(&project.version)?;

    let root = path.parent().unwrap_or(Path::new("/"));
    for source in &mut project.data_sources {
        if source.path.is_relative() {
            source.path = normalize(&root.join(&source.path));
        }
    }

    tracing::info!(
        "Loaded project {} (version {}, {}x{} grid, {} plots)",
        path.display(),
        project.version,
        project.grid.rows,
        project.grid.cols,
        project.plots.len()
    );
    Ok(project)
}

fn check_version(version: &str) -> Result<()> {
    let major = version
        .split('.')
        .next()
        .and_then(|part| part.trim().parse::<u64>().ok());
    match major {
        Some(SUPPORTED_MAJOR) => Ok(()),
        _ => Err(PlotgridError::ProjectError(format!(
            "Incompatible version {} (expected {}.x)",
            version, SUPPORTED_MAJOR
        ))),
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(normalize(path))
    } else {
        Ok(normalize(&std::env::current_dir()?.join(path)))
    }
}

/// Lexically remove `.` and `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// `target` expressed relative to `base`; `None` when they share no root
fn relative_to(target: &Path, base: &Path) -> Option<PathBuf> {
    let target: Vec<Component> = target.components().collect();
    let base: Vec<Component> = base.components().collect();
    if target.first() != base.first() {
        return None;
    }

    let common = target
        .iter()
        .zip(&base)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base.len() {
        relative.push("..");
    }
    for component in &target[common..] {
        relative.push(component);
    }
    Some(relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::{GridPosition, Hue, PlotConfig};
    use crate::reader::{ColumnSchema, VarType};
    use serde_json::json;

    fn descriptor(id: &str, path: PathBuf) -> DataSourceDescriptor {
        DataSourceDescriptor {
            id: id.to_string(),
            name: "test_data".to_string(),
            path,
            schema: vec![ColumnSchema {
                name: "x".to_string(),
                dtype: "i64".to_string(),
                var_type: VarType::Continuous,
                categories: None,
            }],
        }
    }

    #[test]
    fn test_relative_to() {
        assert_eq!(
            relative_to(Path::new("/a/data/test.csv"), Path::new("/a/projects")),
            Some(PathBuf::from("../data/test.csv"))
        );
        assert_eq!(
            relative_to(Path::new("/a/projects/d.csv"), Path::new("/a/projects")),
            Some(PathBuf::from("d.csv"))
        );
    }

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize(Path::new("/a/projects/../data/./test.csv")),
            PathBuf::from("/a/data/test.csv")
        );
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("data.csv");
        let plot = PlotSpec::new(
            "ds1",
            PlotConfig::new("x", "y")
                .with_hue(vec!["model", "dataset"])
                .with_reference_lines(vec![0.5], vec![2.0])
                .with_ylim((0.0, 1.0))
                .with_title("Test"),
            GridPosition::spanning(0, 0, 2, 3),
        );
        let project = ProjectFile::new(2, 3, vec![descriptor("ds1", csv_path.clone())], vec![plot.clone()]);

        let path = dir.path().join("test.ppo");
        save_project(&project, &path).unwrap();
        let loaded = load_project(&path).unwrap();

        assert_eq!(loaded.version, "0.9.0");
        assert_eq!(loaded.grid, GridSize { rows: 2, cols: 3 });
        assert_eq!(loaded.data_sources[0].id, "ds1");
        assert_eq!(loaded.data_sources[0].name, "test_data");
        assert_eq!(loaded.data_sources[0].path, normalize(&csv_path));
        assert_eq!(loaded.plots[0], plot);
        assert_eq!(
            loaded.plots[0].config.hue,
            Hue::Composite(vec!["model".into(), "dataset".into()])
        );
        assert_eq!(loaded.plots[0].grid_position.rowspan, 2);
        assert_eq!(loaded.plots[0].grid_position.colspan, 3);
    }

    #[test]
    fn test_paths_stored_relative() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let project_dir = dir.path().join("projects");
        std::fs::create_dir_all(&data_dir).unwrap();
        std::fs::create_dir_all(&project_dir).unwrap();
        let csv_path = data_dir.join("test.csv");

        let project = ProjectFile::new(1, 1, vec![descriptor("ds1", csv_path.clone())], vec![]);
        let path = project_dir.join("test.ppo");
        save_project(&project, &path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["data_sources"][0]["path"], json!("../data/test.csv"));

        let loaded = load_project(&path).unwrap();
        assert!(loaded.data_sources[0].path.is_absolute());
        assert_eq!(loaded.data_sources[0].path, normalize(&csv_path));
    }

    #[test]
    fn test_incompatible_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad_version.ppo");
        std::fs::write(
            &path,
            json!({"version": "2.0.0", "grid": {"rows": 2, "cols": 2}, "data_sources": [], "plots": []})
                .to_string(),
        )
        .unwrap();

        let err = load_project(&path).unwrap_err();
        assert!(err.to_string().contains("Incompatible version"));
    }

    #[test]
    fn test_empty_project() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.ppo");
        save_project(&ProjectFile::new(2, 3, vec![], vec![]), &path).unwrap();
        let loaded = load_project(&path).unwrap();
        assert!(loaded.data_sources.is_empty());
        assert!(loaded.plots.is_empty());
        assert_eq!(loaded.grid, GridSize { rows: 2, cols: 3 });
    }
}
