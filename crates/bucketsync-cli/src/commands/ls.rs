//! Ls command - List one directory level of a bucket

use anyhow::Result;
use clap::Args;

use bucketsync_core::domain::ObjectAddress;

use crate::context::AppContext;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct LsCommand {
    /// Directory to list, `gs://bucket[/path]`
    pub target: ObjectAddress,
}

impl LsCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let listing = ctx.objects().list_dir(&self.target).await?;

        if format.is_json() {
            formatter.print_json(&serde_json::to_value(&listing)?);
            return Ok(());
        }

        for dir in &listing.dirs {
            println!("{}/", dir);
        }
        for file in &listing.files {
            println!("{}", file);
        }
        if listing.is_empty() {
            formatter.info(&format!("{} is empty", self.target));
        }
        Ok(())
    }
}
