//! Directory synchronization engine
//!
//! The [`DirectorySyncEngine`] mirrors a local tree into a bucket prefix and
//! a bucket prefix back into a local tree.
//!
//! ## Upload Flow
//!
//! 1. **Walk**: enumerate every regular file below the source directory
//! 2. **Filter**: unless the policy is `Always`, list the destination prefix
//!    once and apply the upload policy to every candidate against it
//! 3. **Transfer**: a pool of at most `concurrency` workers pulls files from
//!    one shared queue and uploads each with policy `Always`, retrying
//!    transient failures with exponential backoff
//! 4. **Report**: outcomes are merged after every worker has exited; any
//!    permanent failure turns the whole call into one batch error
//!
//! ## Download Flow
//!
//! Sequential and recursive: list one prefix level, download its files,
//! then descend into its sub-prefixes. Existing local files are overwritten.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use bucketsync_core::config::{Config, DEFAULT_UPLOAD_THREADS};
use bucketsync_core::domain::{
    AccessGrant, BatchFailure, Decision, LocalFile, ObjectAddress, PredefinedAcl,
    RemoteObjectMeta, SyncError, TransferDecision, UploadPolicy,
};
use bucketsync_core::ports::{ILocalFileSystem, IObjectStore};
use bucketsync_core::usecases::{
    DownloadOptions, ObjectOpsUseCase, TransferObjectUseCase, UploadOptions,
};

use crate::retry::RetryPolicy;

// ============================================================================
// Options and summaries
// ============================================================================

/// Options for [`DirectorySyncEngine::upload_tree`]
#[derive(Debug, Clone)]
pub struct TreeUploadOptions {
    /// Upper bound on parallel workers
    pub concurrency: usize,
    /// Which files to upload when the destination already has them
    pub policy: UploadPolicy,
    /// Canned ACL for every created object
    pub predefined_acl: Option<PredefinedAcl>,
    /// Grants applied to every uploaded object
    pub grants: Vec<AccessGrant>,
}

impl Default for TreeUploadOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_UPLOAD_THREADS,
            policy: UploadPolicy::Always,
            predefined_acl: None,
            grants: Vec::new(),
        }
    }
}

/// Summary of a successful tree upload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeUploadSummary {
    /// Files found below the source directory
    pub total: usize,
    /// Files written to the destination
    pub transferred: usize,
    /// Files the upload policy filtered out
    pub skipped: usize,
    /// Workers started (0 when nothing needed uploading)
    pub workers: usize,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

/// Summary of a successful tree download
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeDownloadSummary {
    /// Files written locally
    pub files: usize,
    /// Remote directory levels visited, the root included
    pub directories: usize,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

/// Terminal result of one upload task, sent back to the coordinator
type TaskOutcome = (String, Result<(), SyncError>);

// ============================================================================
// DirectorySyncEngine
// ============================================================================

/// Tree-level transfer engine
///
/// ## Dependencies
///
/// - `store`: remote object operations (listing, via the use cases)
/// - `local_filesystem`: tree walking, hashing and file I/O
pub struct DirectorySyncEngine {
    transfer: Arc<TransferObjectUseCase>,
    objects: ObjectOpsUseCase,
    store: Arc<dyn IObjectStore + Send + Sync>,
    local_filesystem: Arc<dyn ILocalFileSystem + Send + Sync>,
    retry: RetryPolicy,
}

impl DirectorySyncEngine {
    /// Creates an engine with the default retry policy (5 attempts, 1s base)
    pub fn new(
        store: Arc<dyn IObjectStore + Send + Sync>,
        local_filesystem: Arc<dyn ILocalFileSystem + Send + Sync>,
    ) -> Self {
        Self {
            transfer: Arc::new(TransferObjectUseCase::new(
                Arc::clone(&store),
                Arc::clone(&local_filesystem),
            )),
            objects: ObjectOpsUseCase::new(Arc::clone(&store)),
            store,
            local_filesystem,
            retry: RetryPolicy::default(),
        }
    }

    /// Creates an engine whose retry policy follows `config.transfer`
    pub fn from_config(
        store: Arc<dyn IObjectStore + Send + Sync>,
        local_filesystem: Arc<dyn ILocalFileSystem + Send + Sync>,
        config: &Config,
    ) -> Self {
        Self::new(store, local_filesystem).with_retry_policy(RetryPolicy::from_config(&config.transfer))
    }

    /// Replaces the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Single-object transfers sharing this engine's store
    pub fn transfer(&self) -> &TransferObjectUseCase {
        &self.transfer
    }

    // ========================================================================
    // Upload
    // ========================================================================

    /// Uploads every file below `source_dir` to `destination`
    ///
    /// `destination` is a bucket root or a prefix; each file lands at
    /// `destination/<relative path>`. The call returns only after every file
    /// has either been uploaded or failed permanently.
    ///
    /// # Errors
    ///
    /// [`SyncError::Batch`] listing every file that failed, or the error of
    /// the initial walk or listing.
    #[tracing::instrument(skip(self, destination, options), fields(destination = %destination))]
    pub async fn upload_tree(
        &self,
        source_dir: &Path,
        destination: &ObjectAddress,
        options: &TreeUploadOptions,
    ) -> Result<TreeUploadSummary, SyncError> {
        let started = Instant::now();

        let files = self
            .local_filesystem
            .walk_files(source_dir)
            .await
            .map_err(|e| SyncError::local_io(source_dir, e))?;
        let total = files.len();

        let (candidates, skipped, mut failures) = self
            .filter_candidates(files, destination, options.policy)
            .await?;

        info!(
            "Uploading {} files, skipping {}",
            candidates.len(),
            skipped
        );

        if candidates.is_empty() {
            if !failures.is_empty() {
                return Err(SyncError::Batch(BatchFailure::new("upload", failures)));
            }
            return Ok(TreeUploadSummary {
                total,
                transferred: 0,
                skipped,
                workers: 0,
                duration_ms: started.elapsed().as_millis() as u64,
            });
        }

        let workers = options.concurrency.clamp(1, candidates.len());
        let expected: Vec<String> = candidates.iter().map(|f| f.relative_path.clone()).collect();
        let outcomes = self
            .run_workers(candidates, destination, options, workers)
            .await?;

        let mut reported = HashSet::new();
        let mut transferred = 0;
        for (relative_path, result) in outcomes {
            reported.insert(relative_path.clone());
            match result {
                Ok(()) => transferred += 1,
                Err(err) => failures.push((relative_path, err)),
            }
        }
        for relative_path in expected {
            if !reported.contains(&relative_path) {
                failures.push((
                    relative_path,
                    SyncError::Internal("worker exited without reporting a result".into()),
                ));
            }
        }

        if !failures.is_empty() {
            error!(failed = failures.len(), transferred, "Tree upload finished with failures");
            return Err(SyncError::Batch(BatchFailure::new("upload", failures)));
        }

        let summary = TreeUploadSummary {
            total,
            transferred,
            skipped,
            workers,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            transferred,
            skipped,
            workers,
            duration_ms = summary.duration_ms,
            "Tree upload complete"
        );
        Ok(summary)
    }

    /// Applies the upload policy to every walked file against one listing
    ///
    /// Returns the files to upload, the number skipped, and the files whose
    /// decision itself failed.
    async fn filter_candidates(
        &self,
        files: Vec<LocalFile>,
        destination: &ObjectAddress,
        policy: UploadPolicy,
    ) -> Result<(Vec<LocalFile>, usize, Vec<(String, SyncError)>), SyncError> {
        if policy == UploadPolicy::Always {
            return Ok((files, 0, Vec::new()));
        }

        let existing = self.list_existing(destination).await?;
        let mut candidates = Vec::with_capacity(files.len());
        let mut skipped = 0;
        let mut failures = Vec::new();

        for file in files {
            let remote = existing.get(&file.relative_path);
            let local_digest = if TransferDecision::needs_local_digest(policy, remote) {
                match self.local_filesystem.fingerprint(&file.absolute_path).await {
                    Ok(digest) => Some(digest),
                    Err(e) => {
                        let err = SyncError::local_io(&file.absolute_path, e);
                        failures.push((file.relative_path, err));
                        continue;
                    }
                }
            } else {
                None
            };

            match TransferDecision::evaluate(policy, remote, local_digest.as_ref()) {
                Decision::Transfer => candidates.push(file),
                Decision::Skip(reason) => {
                    debug!(path = %file.relative_path, %reason, "Skipping upload");
                    skipped += 1;
                }
                Decision::Fail(err) => failures.push((file.relative_path, err)),
            }
        }

        Ok((candidates, skipped, failures))
    }

    /// One flat listing of everything below `destination`, keyed by the
    /// name relative to it
    async fn list_existing(
        &self,
        destination: &ObjectAddress,
    ) -> Result<HashMap<String, RemoteObjectMeta>, SyncError> {
        let prefix = destination.child_prefix();
        let listing = self
            .store
            .list_objects(destination.bucket(), &prefix, None)
            .await
            .map_err(|e| e.annotate("listing", destination.bucket(), &prefix))?;

        Ok(listing
            .objects
            .into_iter()
            .filter_map(|meta| {
                let relative = meta.name.strip_prefix(prefix.as_str())?.to_string();
                Some((relative, meta))
            })
            .collect())
    }

    /// Drives the worker pool to completion and returns every task outcome
    async fn run_workers(
        &self,
        candidates: Vec<LocalFile>,
        destination: &ObjectAddress,
        options: &TreeUploadOptions,
        workers: usize,
    ) -> Result<Vec<TaskOutcome>, SyncError> {
        let (task_tx, task_rx) = mpsc::unbounded_channel::<LocalFile>();
        for file in candidates {
            task_tx
                .send(file)
                .map_err(|_| SyncError::Internal("upload queue closed early".into()))?;
        }
        drop(task_tx);
        let queue = Arc::new(Mutex::new(task_rx));

        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<TaskOutcome>();
        let upload_options = Arc::new(UploadOptions {
            policy: UploadPolicy::Always,
            predefined_acl: options.predefined_acl,
            grants: options.grants.clone(),
        });

        let mut pool = JoinSet::new();
        for worker in 0..workers {
            let queue = Arc::clone(&queue);
            let result_tx = result_tx.clone();
            let transfer = Arc::clone(&self.transfer);
            let upload_options = Arc::clone(&upload_options);
            let destination = destination.clone();
            let retry = self.retry;

            pool.spawn(async move {
                let mut handled = 0usize;
                loop {
                    let next = queue.lock().await.recv().await;
                    let Some(file) = next else { break };

                    let target = destination.join(&file.relative_path);
                    let result = retry
                        .run(&file.relative_path, || {
                            transfer.upload(&file.absolute_path, &target, &upload_options)
                        })
                        .await
                        .map(|_| ());
                    if let Err(err) = &result {
                        warn!(worker, path = %file.relative_path, error = %err, "Upload failed permanently");
                    }
                    handled += 1;
                    if result_tx.send((file.relative_path, result)).is_err() {
                        break;
                    }
                }
                debug!(worker, handled, "Upload worker exiting");
            });
        }
        drop(result_tx);

        while let Some(joined) = pool.join_next().await {
            if let Err(err) = joined {
                error!(error = %err, "Upload worker panicked");
            }
        }

        let mut outcomes = Vec::new();
        while let Some(outcome) = result_rx.recv().await {
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    // ========================================================================
    // Download
    // ========================================================================

    /// Downloads everything below `source` into `dest_dir`
    ///
    /// Local files with the same names are overwritten. Failed files and
    /// directories that cannot be created are collected and reported
    /// together once the walk is complete.
    #[tracing::instrument(skip(self, source), fields(source = %source))]
    pub async fn download_tree(
        &self,
        source: &ObjectAddress,
        dest_dir: &Path,
    ) -> Result<TreeDownloadSummary, SyncError> {
        let started = Instant::now();
        let mut summary = TreeDownloadSummary::default();
        let mut failures = Vec::new();

        // (remote dir, local dir, path relative to `source`)
        let mut pending: Vec<(ObjectAddress, PathBuf, String)> =
            vec![(source.clone(), dest_dir.to_path_buf(), String::new())];

        while let Some((remote_dir, local_dir, relative_dir)) = pending.pop() {
            if let Err(e) = self.local_filesystem.create_dir_all(&local_dir).await {
                let err = SyncError::local_io(&local_dir, e);
                warn!(path = %local_dir.display(), error = %err, "Cannot create local directory");
                let label = if relative_dir.is_empty() { ".".to_string() } else { relative_dir };
                failures.push((label, err));
                continue;
            }
            let listing = self.objects.list_dir(&remote_dir).await?;
            summary.directories += 1;

            for name in &listing.files {
                if !is_safe_component(name) {
                    warn!(name = %name, "Skipping remote file with unsafe name");
                    continue;
                }
                let relative = join_relative(&relative_dir, name);
                let target = local_dir.join(name);
                match self
                    .transfer
                    .download(&remote_dir.join(name), &target, DownloadOptions::default())
                    .await
                {
                    Ok(()) => summary.files += 1,
                    Err(err) => {
                        warn!(path = %relative, error = %err, "Download failed");
                        failures.push((relative, err));
                    }
                }
            }

            for name in listing.dirs.iter().rev() {
                if !is_safe_component(name) {
                    warn!(prefix = %name, "Skipping remote directory with unsafe name");
                    continue;
                }
                pending.push((
                    remote_dir.join(name),
                    local_dir.join(name),
                    join_relative(&relative_dir, name),
                ));
            }
        }

        if !failures.is_empty() {
            return Err(SyncError::Batch(BatchFailure::new("download", failures)));
        }

        summary.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            files = summary.files,
            directories = summary.directories,
            "Tree download complete"
        );
        Ok(summary)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Rejects names that would escape the destination directory
fn is_safe_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !(cfg!(windows) && name.contains('\\'))
}

fn join_relative(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}
