/*!
plotgrid Command Line Interface

Headless export of saved projects, plus inspection helpers for CSV data.
*/

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use plotgrid::api::{build_board, load_sources};
use plotgrid::plot::facet::{apply_filter, expand_groups};
use plotgrid::plot::scale::{shared_limits, shared_limits_with_sem};
use plotgrid::project::load_project;
use plotgrid::reader::load_csv;
use plotgrid::writer::{export_grid, ExportFormat, ExportOptions};
use plotgrid::{Hue, VERSION};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "plotgrid")]
#[command(about = "Arrange, aggregate and export grids of CSV-backed line plots")]
#[command(version = VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export a saved project to an image file
    Export {
        /// Project file (.ppo)
        project: PathBuf,

        /// Output file path
        output: PathBuf,

        /// Output format (svg, png); inferred from the output extension if omitted
        #[arg(long)]
        format: Option<ExportFormat>,

        /// Figure width in inches
        #[arg(long, default_value_t = 11.0)]
        width: f64,

        /// Figure height in inches
        #[arg(long, default_value_t = 8.5)]
        height: f64,

        /// Raster resolution
        #[arg(long, default_value_t = 150)]
        dpi: u32,
    },

    /// Print the filter combinations produced by grouping a CSV
    Expand {
        /// CSV file
        csv: PathBuf,

        /// Columns to group by
        #[arg(long = "group", required = true)]
        groups: Vec<String>,
    },

    /// Print the axis limits shared by a batch of grouped plots
    Limits {
        /// CSV file
        csv: PathBuf,

        #[arg(long)]
        x: String,

        #[arg(long)]
        y: String,

        /// Columns to group by
        #[arg(long = "group")]
        groups: Vec<String>,

        /// Subject column, or per-row SEM values with --precomputed
        #[arg(long)]
        sem: Option<String>,

        #[arg(long)]
        precomputed: bool,

        /// Hue columns
        #[arg(long)]
        hue: Vec<String>,
    },

    /// Print the inferred column schema of a CSV
    Inspect {
        /// CSV file
        csv: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            project,
            output,
            format,
            width,
            height,
            dpi,
        } => {
            let format = match format.or_else(|| ExportFormat::from_path(&output)) {
                Some(format) => format,
                None => bail!(
                    "Cannot infer export format from {}; pass --format svg or --format png",
                    output.display()
                ),
            };

            let project = load_project(&project)
                .with_context(|| format!("Failed to load project {}", project.display()))?;
            let sources = load_sources(&project).context("Failed to load project data sources")?;
            let board = build_board(&project, &sources)?;

            let options = ExportOptions {
                format,
                width_in: width,
                height_in: height,
                dpi,
            };
            let drawn = export_grid(&board, &output, &options)
                .with_context(|| format!("Failed to export to {}", output.display()))?;
            println!("Exported {} plots to {}", drawn, output.display());
        }

        Commands::Expand { csv, groups } => {
            let source = load_csv(&csv, None)
                .with_context(|| format!("Failed to read {}", csv.display()))?;
            let filters = expand_groups(&source.dataframe, &groups)?;
            println!("{}", serde_json::to_string_pretty(&filters)?);
        }

        Commands::Limits {
            csv,
            x,
            y,
            groups,
            sem,
            precomputed,
            hue,
        } => {
            let source = load_csv(&csv, None)
                .with_context(|| format!("Failed to read {}", csv.display()))?;
            let df = &source.dataframe;
            let filters = expand_groups(df, &groups)?;

            let hue = match hue.len() {
                0 => Hue::None,
                1 => Hue::Single(hue[0].clone()),
                _ => Hue::Composite(hue),
            };

            let limits = match sem.as_deref() {
                Some(sem) => {
                    shared_limits_with_sem(df, &filters, &x, &y, Some(sem), &hue, precomputed)?
                }
                None => {
                    let subsets: Vec<_> = filters.iter().map(|f| apply_filter(df, f)).collect();
                    shared_limits(&subsets, &x, &y)
                }
            };
            println!("{}", serde_json::to_string_pretty(&limits)?);
        }

        Commands::Inspect { csv } => {
            let source = load_csv(&csv, None)
                .with_context(|| format!("Failed to read {}", csv.display()))?;
            println!("{}", serde_json::to_string_pretty(&source.schema)?);
        }
    }

    Ok(())
}
