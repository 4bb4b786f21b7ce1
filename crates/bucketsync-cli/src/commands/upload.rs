//! Upload command - Copy a local file or directory into a bucket
//!
//! A directory source goes through the sync engine (parallel workers, one
//! listing for the upload policy). A file source is a single staged upload
//! retried with the configured backoff.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use bucketsync_core::domain::{AccessGrant, ObjectAddress, PredefinedAcl, UploadPolicy};
use bucketsync_core::usecases::{UploadOptions, UploadOutcome};
use bucketsync_sync::TreeUploadOptions;

use crate::context::AppContext;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct UploadCommand {
    /// Local file or directory
    pub source: PathBuf,

    /// Destination, `gs://bucket/path`
    pub destination: ObjectAddress,

    /// When to overwrite existing objects: always, if-new, if-modified
    #[arg(long = "if", value_name = "POLICY")]
    pub upload_if: Option<UploadPolicy>,

    /// Parallel upload workers for directory sources
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Canned ACL applied when objects are created (e.g. public-read)
    #[arg(long, value_name = "NAME")]
    pub predefined_acl: Option<PredefinedAcl>,

    /// Fine-grained grant TYPE:VALUE:PERMISSION, may be repeated
    #[arg(long = "grant", value_name = "GRANT")]
    pub grants: Vec<AccessGrant>,
}

impl UploadCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        let policy = match self.upload_if {
            Some(policy) => policy,
            None => ctx.config.upload_policy()?,
        };
        let predefined_acl = match self.predefined_acl {
            Some(acl) => Some(acl),
            None => ctx.config.predefined_acl()?,
        };

        let metadata = tokio::fs::metadata(&self.source)
            .await
            .with_context(|| format!("Cannot read {}", self.source.display()))?;

        info!(source = %self.source.display(), destination = %self.destination, %policy, "Starting upload");

        if metadata.is_dir() {
            let options = TreeUploadOptions {
                concurrency: self.threads.unwrap_or(ctx.config.transfer.concurrency),
                policy,
                predefined_acl,
                grants: self.grants.clone(),
            };
            let summary = ctx
                .engine()
                .upload_tree(&self.source, &self.destination, &options)
                .await?;

            if format.is_json() {
                formatter.print_json(&serde_json::to_value(&summary)?);
            } else {
                formatter.success(&format!(
                    "Uploaded {} file{} to {}",
                    summary.transferred,
                    if summary.transferred == 1 { "" } else { "s" },
                    self.destination
                ));
                formatter.info(&format!("Skipped:  {}", summary.skipped));
                formatter.info(&format!("Workers:  {}", summary.workers));
                formatter.info(&format!("Duration: {}ms", summary.duration_ms));
            }
            return Ok(());
        }

        let options = UploadOptions {
            policy,
            predefined_acl,
            grants: self.grants.clone(),
        };
        let transfer = ctx.transfer();
        let label = self.destination.to_string();
        let outcome = ctx
            .retry_policy()
            .run(&label, || transfer.upload(&self.source, &self.destination, &options))
            .await?;

        match (&outcome, format.is_json()) {
            (UploadOutcome::Uploaded { digest }, true) => formatter.print_json(&serde_json::json!({
                "uploaded": true,
                "destination": label,
                "md5": digest.as_str(),
            })),
            (UploadOutcome::Skipped(reason), true) => formatter.print_json(&serde_json::json!({
                "uploaded": false,
                "destination": label,
                "reason": reason.to_string(),
            })),
            (UploadOutcome::Uploaded { digest }, false) => {
                formatter.success(&format!("Uploaded {}", label));
                formatter.info(&format!("MD5: {}", digest));
            }
            (UploadOutcome::Skipped(reason), false) => {
                formatter.success(&format!("Skipped {} ({})", label, reason));
            }
        }
        Ok(())
    }
}
