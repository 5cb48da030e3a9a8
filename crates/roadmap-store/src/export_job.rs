//! Export job behind the `roadmap-export` binary.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};

use roadmap_timeline::domain::{DomainError, DomainResult, Roadmap, TimelineSnapshot};
use roadmap_timeline::export::{export_csv, export_filename, export_json, ExportFormat};

use crate::db::init_db;
use crate::dependency_repo::DependencyRepository;
use crate::milestone_repo::MilestoneRepository;
use crate::post_repo::PostRepository;
use crate::roadmap_repo::RoadmapRepository;
use crate::traits::{Repository, RoadmapScoped};

/// Output format accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Json,
    Csv,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => ExportFormat::Json,
            FormatArg::Csv => ExportFormat::Csv,
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "roadmap-export")]
#[command(about = "Export one roadmap timeline from a SQLite database")]
pub struct ExportArgs {
    /// Path to the SQLite database
    pub db_path: PathBuf,
    /// Roadmap to export
    pub roadmap_id: u32,
    #[arg(value_enum, ignore_case = true)]
    pub format: FormatArg,
    /// Directory the export file is written to
    #[arg(default_value = ".")]
    pub out_dir: PathBuf,
    /// Directory for the rolling log file
    #[arg(long, env = "ROADMAP_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

impl ExportArgs {
    pub fn export_format(&self) -> ExportFormat {
        self.format.into()
    }

    pub fn log_dir_or_default(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("roadmap-export"))
    }
}

/// Print a failed export to stderr and append it to the rolling log.
/// A logging failure is returned so the caller can still surface it.
pub fn report_failure(err: &DomainError) -> Result<(), rolling_logger::LoggerError> {
    let message = format!("Export failed: {}", err);
    eprintln!("{}", message);
    rolling_logger::error(&message)
}

/// Load one roadmap and write its export file. Returns the written path.
pub async fn run_export(args: &ExportArgs, now: DateTime<Utc>) -> DomainResult<PathBuf> {
    let db = init_db(&args.db_path).await?;

    let roadmap = RoadmapRepository::new(db.connection())
        .find_by_id(args.roadmap_id)
        .await?
        .ok_or_else(|| DomainError::not_found::<Roadmap>(args.roadmap_id))?;

    let snapshot = TimelineSnapshot::new(
        PostRepository::new(db.connection()).list_by_roadmap(roadmap.id).await?,
        MilestoneRepository::new(db.connection()).list_by_roadmap(roadmap.id).await?,
        DependencyRepository::new(db.connection()).list_by_roadmap(roadmap.id).await?,
    );

    let format = args.export_format();
    let content = match format {
        ExportFormat::Json => export_json(&roadmap.title, &now.to_rfc3339(), &snapshot)?,
        ExportFormat::Csv => export_csv(&snapshot),
    };

    tokio::fs::create_dir_all(&args.out_dir)
        .await
        .map_err(|e| DomainError::Internal(format!("Failed to create {}: {}", args.out_dir.display(), e)))?;
    let path = args
        .out_dir
        .join(export_filename(&roadmap.title, format, now.date_naive()));
    tokio::fs::write(&path, content)
        .await
        .map_err(|e| DomainError::Internal(format!("Failed to write {}: {}", path.display(), e)))?;

    log::info!(
        "Exported roadmap {} ({} posts, {} milestones) to {}",
        roadmap.id,
        snapshot.posts.len(),
        snapshot.milestones.len(),
        path.display()
    );
    Ok(path)
}
