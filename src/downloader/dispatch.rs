// Dispatch: fans a batch of plans out to the executor
//
// Video/audio batches may run in a bounded pool; stream batches always
// run sequentially so a long recording never competes with its
// siblings for bandwidth and disk. One plan's failure never cancels
// the others.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use super::executor::TaskExecutor;
use super::models::{DownloadMode, DownloadPlan, TaskResult};
use super::postprocess::StreamPostProcessor;

pub struct DispatchController {
    executor: Arc<TaskExecutor>,
    postprocessor: Option<Arc<StreamPostProcessor>>,
    max_parallel: usize,
}

impl DispatchController {
    pub fn new(
        executor: Arc<TaskExecutor>,
        postprocessor: Option<Arc<StreamPostProcessor>>,
        max_parallel: usize,
    ) -> Self {
        Self {
            executor,
            postprocessor,
            max_parallel: max_parallel.max(1),
        }
    }

    /// Run every plan and collect one result per plan. Sequential
    /// dispatch preserves input order; parallel dispatch reports in
    /// completion order and callers correlate by URL.
    pub async fn dispatch(&self, plans: Vec<DownloadPlan>) -> Vec<TaskResult> {
        let stream_batch = plans.iter().any(|p| p.mode == DownloadMode::Stream);
        if stream_batch && self.max_parallel > 1 {
            warn!(
                requested = self.max_parallel,
                "stream capture always runs sequentially, ignoring parallelism"
            );
        }

        if !stream_batch && self.max_parallel > 1 && plans.len() > 1 {
            self.dispatch_parallel(plans).await
        } else {
            self.dispatch_sequential(plans).await
        }
    }

    async fn dispatch_sequential(&self, plans: Vec<DownloadPlan>) -> Vec<TaskResult> {
        let mut results = Vec::with_capacity(plans.len());
        for plan in plans {
            results.push(
                run_one(
                    self.executor.clone(),
                    self.postprocessor.clone(),
                    plan,
                )
                .await,
            );
        }
        results
    }

    async fn dispatch_parallel(&self, plans: Vec<DownloadPlan>) -> Vec<TaskResult> {
        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let mut workers = JoinSet::new();

        for plan in plans {
            let semaphore = semaphore.clone();
            let executor = self.executor.clone();
            let postprocessor = self.postprocessor.clone();
            workers.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore never closed");
                run_one(executor, postprocessor, plan).await
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => warn!(error = %e, "download worker aborted"),
            }
        }
        results
    }
}

/// One plan, start to finish: download, then for stream plans the
/// MP4 normalization pass over the recording directory.
async fn run_one(
    executor: Arc<TaskExecutor>,
    postprocessor: Option<Arc<StreamPostProcessor>>,
    plan: DownloadPlan,
) -> TaskResult {
    let downloaded = executor.execute(&plan).await;
    if !downloaded.success || plan.mode != DownloadMode::Stream {
        return downloaded;
    }

    let Some(postprocessor) = postprocessor else {
        return downloaded;
    };

    let started = Instant::now();
    match postprocessor.normalize_dir(&plan.output_dir).await {
        Ok(converted) => {
            let total = downloaded.duration_ms + started.elapsed().as_millis() as u64;
            TaskResult::ok(
                &plan,
                total,
                format!("completed, {} recording(s) normalized to mp4", converted.len()),
            )
        }
        Err(e) => {
            let total = downloaded.duration_ms + started.elapsed().as_millis() as u64;
            TaskResult::failed(&plan, total, 1, e.to_string())
        }
    }
}
