//! Stat command - Show object metadata

use anyhow::Result;
use clap::Args;

use bucketsync_core::domain::ObjectAddress;

use crate::context::AppContext;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct StatCommand {
    /// Object to inspect, `gs://bucket/path`
    pub target: ObjectAddress,
}

impl StatCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let meta = ctx.objects().stat(&self.target).await?;

        if format.is_json() {
            formatter.print_json(&serde_json::to_value(&meta)?);
            return Ok(());
        }

        formatter.success(&self.target.to_string());
        formatter.info(&format!("Size:       {} bytes", meta.size));
        formatter.info(&format!(
            "MD5:        {}",
            meta.digest.as_ref().map(|d| d.as_str()).unwrap_or("-")
        ));
        formatter.info(&format!(
            "Updated:    {}",
            meta.last_modified
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".to_string())
        ));
        formatter.info(&format!(
            "Generation: {}",
            meta.generation
                .map(|g| g.to_string())
                .unwrap_or_else(|| "-".to_string())
        ));
        Ok(())
    }
}
