// Subprocess seam shared by the executor and the post-processor
//
// Both external tools are driven through ProcessRunner so their
// success/failure paths can be exercised in tests without spawning
// anything.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use super::errors::DownloadError;

/// Exit state of one subprocess run plus its collected stderr.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub success: bool,
    pub code: Option<i32>,
    pub stderr: String,
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `program` with `args` as its full argument vector and wait
    /// for it to exit. No timeout: a hung tool blocks its plan.
    async fn run(&self, program: &Path, args: &[String]) -> Result<RunOutcome, DownloadError>;
}

/// Runs tools for real. Stdout flows straight through to the terminal
/// (the downloader's `--newline` progress is line-oriented); stderr is
/// captured for failure diagnostics and echoed at debug level.
pub struct SystemRunner;

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, program: &Path, args: &[String]) -> Result<RunOutcome, DownloadError> {
        let spawn_err = |source| DownloadError::Spawn {
            program: program.display().to_string(),
            source,
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;

        let stderr_pipe = child.stderr.take().ok_or_else(|| DownloadError::Spawn {
            program: program.display().to_string(),
            source: std::io::Error::other("failed to capture stderr"),
        })?;

        let collector = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr_pipe).lines();
            let mut collected = Vec::new();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(target: "tool", "{line}");
                collected.push(line);
            }
            collected.join("\n")
        });

        let status = child.wait().await.map_err(spawn_err)?;
        let stderr = collector.await.unwrap_or_default();

        Ok(RunOutcome {
            success: status.success(),
            code: status.code(),
            stderr,
        })
    }
}

#[cfg(test)]
pub mod stub {
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{DownloadError, ProcessRunner, RunOutcome};

    pub fn ok_outcome() -> RunOutcome {
        RunOutcome {
            success: true,
            code: Some(0),
            stderr: String::new(),
        }
    }

    pub fn fail_outcome(code: i32, stderr: &str) -> RunOutcome {
        RunOutcome {
            success: false,
            code: Some(code),
            stderr: stderr.to_string(),
        }
    }

    /// Pops one scripted outcome per invocation and records every call.
    /// An empty script answers with success.
    pub struct ScriptedRunner {
        outcomes: Mutex<VecDeque<RunOutcome>>,
        calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl ScriptedRunner {
        pub fn new(outcomes: Vec<RunOutcome>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn always_ok() -> Self {
            Self::new(Vec::new())
        }

        pub fn calls(&self) -> Vec<(String, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProcessRunner for ScriptedRunner {
        async fn run(
            &self,
            program: &Path,
            args: &[String],
        ) -> Result<RunOutcome, DownloadError> {
            self.calls
                .lock()
                .unwrap()
                .push((program.display().to_string(), args.to_vec()));
            Ok(self
                .outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(ok_outcome))
        }
    }
}
