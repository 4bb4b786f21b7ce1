//! Download command - Copy an object or a prefix to the local disk

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use bucketsync_core::domain::ObjectAddress;
use bucketsync_core::usecases::DownloadOptions;

use crate::context::AppContext;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct DownloadCommand {
    /// Source, `gs://bucket/path`
    pub source: ObjectAddress,

    /// Local file, or target directory with `--recursive`
    pub destination: PathBuf,

    /// Download everything below the source prefix
    #[arg(short, long)]
    pub recursive: bool,

    /// Create missing parent directories of the destination file
    #[arg(long)]
    pub create_dirs: bool,

    /// Fetch a specific object generation
    #[arg(long, value_name = "N", conflicts_with = "recursive")]
    pub generation: Option<i64>,
}

impl DownloadCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        info!(source = %self.source, destination = %self.destination.display(), "Starting download");

        if self.recursive {
            let summary = ctx
                .engine()
                .download_tree(&self.source, &self.destination)
                .await?;
            if format.is_json() {
                formatter.print_json(&serde_json::to_value(&summary)?);
            } else {
                formatter.success(&format!(
                    "Downloaded {} file{} to {}",
                    summary.files,
                    if summary.files == 1 { "" } else { "s" },
                    self.destination.display()
                ));
                formatter.info(&format!("Directories: {}", summary.directories));
            }
            return Ok(());
        }

        let target = self.target_path();
        let options = DownloadOptions {
            create_dirs: self.create_dirs,
            generation: self.generation,
        };
        ctx.transfer().download(&self.source, &target, options).await?;

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "source": self.source.to_string(),
                "destination": target.display().to_string(),
            }));
        } else {
            formatter.success(&format!("Downloaded {} to {}", self.source, target.display()));
        }
        Ok(())
    }

    /// An existing directory receives the object under its own base name
    fn target_path(&self) -> PathBuf {
        let base_name = self.source.path().rsplit('/').next().unwrap_or_default();
        if self.destination.is_dir() && !base_name.is_empty() {
            self.destination.join(base_name)
        } else {
            self.destination.clone()
        }
    }
}
