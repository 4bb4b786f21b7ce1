//! Rm command - Delete one object

use anyhow::Result;
use clap::Args;
use tracing::info;

use bucketsync_core::domain::ObjectAddress;

use crate::context::AppContext;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct RmCommand {
    /// Object to delete, `gs://bucket/path`
    pub target: ObjectAddress,
}

impl RmCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        ctx.objects().delete(&self.target).await?;
        info!(target = %self.target, "Object deleted");

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "deleted": self.target.to_string(),
            }));
        } else {
            formatter.success(&format!("Deleted {}", self.target));
        }
        Ok(())
    }
}
