// Task execution: one downloader subprocess per plan, single attempt

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use super::diagnostics::failure_message;
use super::models::{DownloadPlan, TaskResult};
use super::runner::ProcessRunner;

pub struct TaskExecutor {
    downloader: PathBuf,
    runner: Arc<dyn ProcessRunner>,
}

impl TaskExecutor {
    pub fn new(downloader: PathBuf, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { downloader, runner }
    }

    /// Run one plan to completion and report it as a TaskResult.
    /// Nothing is thrown past this boundary; a failed plan must not
    /// disturb its siblings in a batch.
    pub async fn execute(&self, plan: &DownloadPlan) -> TaskResult {
        let started = Instant::now();

        // The downloader refuses to create missing -P targets itself.
        if let Err(e) = fs::create_dir_all(&plan.output_dir) {
            return TaskResult::failed(
                plan,
                elapsed_ms(&started),
                -1,
                format!("cannot create output directory: {e}"),
            );
        }

        info!(url = %plan.url, mode = %plan.mode, "starting download");

        match self.runner.run(&self.downloader, &plan.arguments).await {
            Ok(outcome) if outcome.success => {
                let duration = elapsed_ms(&started);
                info!(url = %plan.url, duration_ms = duration, "download finished");
                TaskResult::ok(plan, duration, "completed".to_string())
            }
            Ok(outcome) => {
                let code = outcome.code.unwrap_or(-1);
                let message = failure_message(&outcome.stderr);
                warn!(url = %plan.url, code, %message, "download failed");
                TaskResult::failed(plan, elapsed_ms(&started), code, message)
            }
            Err(e) => {
                warn!(url = %plan.url, error = %e, "downloader could not be run");
                TaskResult::failed(plan, elapsed_ms(&started), -1, e.to_string())
            }
        }
    }
}

fn elapsed_ms(started: &Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
