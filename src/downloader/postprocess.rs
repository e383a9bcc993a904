// Stream normalization: every finished recording becomes an MP4
//
// Remux (stream copy) is tried first: lossless and fast, but it only
// works when the source codec is already MP4-compatible. The H.264/AAC
// transcode is the universal fallback, slow and lossy.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use super::errors::DownloadError;
use super::runner::ProcessRunner;

pub struct StreamPostProcessor {
    ffmpeg: PathBuf,
    runner: Arc<dyn ProcessRunner>,
}

impl StreamPostProcessor {
    pub fn new(ffmpeg: PathBuf, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { ffmpeg, runner }
    }

    /// Convert every completed non-MP4 file in `dir`. The first file
    /// that survives neither remux nor transcode fails the whole
    /// stream task.
    pub async fn normalize_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, DownloadError> {
        let mut candidates: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && needs_conversion(path))
            .collect();
        candidates.sort();

        let mut converted = Vec::with_capacity(candidates.len());
        for input in candidates {
            converted.push(self.convert(&input).await?);
        }
        Ok(converted)
    }

    async fn convert(&self, input: &Path) -> Result<PathBuf, DownloadError> {
        let output = input.with_extension("mp4");

        let remux = self
            .runner
            .run(&self.ffmpeg, &remux_args(input, &output))
            .await?;
        if remux.success {
            info!(file = %input.display(), "remuxed to mp4");
            return Ok(output);
        }

        warn!(file = %input.display(), "remux failed, falling back to transcode");
        let transcode = self
            .runner
            .run(&self.ffmpeg, &transcode_args(input, &output))
            .await?;
        if transcode.success {
            info!(file = %input.display(), "transcoded to mp4");
            return Ok(output);
        }

        // Don't leave a truncated .mp4 behind
        let _ = fs::remove_file(&output);
        Err(DownloadError::Conversion {
            file: input.to_path_buf(),
            message: last_line(&transcode.stderr),
        })
    }
}

/// Stream copy into an MP4 container, metadata atom up front so the
/// file starts playing before it finishes transferring.
fn remux_args(input: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        input.display().to_string(),
        "-c".to_string(),
        "copy".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        output.display().to_string(),
    ]
}

fn transcode_args(input: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        input.display().to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "medium".to_string(),
        "-crf".to_string(),
        "20".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        "192k".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        output.display().to_string(),
    ]
}

fn needs_conversion(path: &Path) -> bool {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return false,
    };
    if is_partial(name) {
        return false;
    }
    !path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("mp4"))
}

/// In-progress downloader artifacts: `.part`, `.ytdl`, `.temp` and
/// fragment files like `rec.ts.part-Frag12`.
fn is_partial(name: &str) -> bool {
    name.ends_with(".part")
        || name.ends_with(".ytdl")
        || name.ends_with(".temp")
        || name.contains(".part-Frag")
}

fn last_line(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("remux and transcode both failed")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::runner::stub::{fail_outcome, ok_outcome, ScriptedRunner};

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"x").unwrap();
        path
    }

    fn processor(runner: Arc<ScriptedRunner>) -> StreamPostProcessor {
        StreamPostProcessor::new(PathBuf::from("ffmpeg"), runner)
    }

    #[tokio::test]
    async fn successful_remux_skips_the_transcode() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "live.ts");
        let runner = Arc::new(ScriptedRunner::new(vec![ok_outcome()]));

        let converted = processor(runner.clone())
            .normalize_dir(dir.path())
            .await
            .unwrap();

        assert_eq!(converted, vec![dir.path().join("live.mp4")]);
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1.contains(&"copy".to_string()));
    }

    #[tokio::test]
    async fn failed_remux_falls_back_to_transcode() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "live.mkv");
        let runner = Arc::new(ScriptedRunner::new(vec![
            fail_outcome(1, "muxer does not support codec"),
            ok_outcome(),
        ]));

        let converted = processor(runner.clone())
            .normalize_dir(dir.path())
            .await
            .unwrap();

        assert_eq!(converted, vec![dir.path().join("live.mp4")]);
        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].1.contains(&"libx264".to_string()));
        assert!(calls[1].1.contains(&"+faststart".to_string()));
    }

    #[tokio::test]
    async fn double_failure_aborts_and_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = touch(dir.path(), "live.ts");
        let runner = Arc::new(ScriptedRunner::new(vec![
            fail_outcome(1, "remux error"),
            fail_outcome(1, "Error while decoding stream"),
        ]));

        let err = processor(runner)
            .normalize_dir(dir.path())
            .await
            .unwrap_err();

        match err {
            DownloadError::Conversion { file, message } => {
                assert_eq!(file, input);
                assert_eq!(message, "Error while decoding stream");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn mp4_and_partial_files_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "done.mp4");
        touch(dir.path(), "in-flight.ts.part");
        touch(dir.path(), "state.ytdl");
        touch(dir.path(), "rec.ts.part-Frag12");
        let runner = Arc::new(ScriptedRunner::always_ok());

        let converted = processor(runner.clone())
            .normalize_dir(dir.path())
            .await
            .unwrap();

        assert!(converted.is_empty());
        assert!(runner.calls().is_empty());
    }
}
