use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;

use super::errors::DownloadError;

/// The two external tools this program orchestrates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Downloader,
    Transcoder,
}

impl ToolKind {
    pub fn binary_name(&self) -> &'static str {
        match self {
            ToolKind::Downloader => "yt-dlp",
            ToolKind::Transcoder => "ffmpeg",
        }
    }

    fn version_arg(&self) -> &'static str {
        match self {
            ToolKind::Downloader => "--version",
            // ffmpeg uses a single dash
            ToolKind::Transcoder => "-version",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub path: Option<PathBuf>,
    pub version: Option<String>,
    pub is_available: bool,
}

pub struct ToolManager;

impl ToolManager {
    /// Resolve a tool to a concrete binary path, or fail preflight.
    /// An explicit override wins; otherwise well-known install
    /// locations are probed before falling back to PATH.
    pub fn resolve(kind: ToolKind, override_path: Option<&Path>) -> Result<PathBuf, DownloadError> {
        if let Some(path) = override_path {
            if path.is_file() {
                return Ok(path.to_path_buf());
            }
            return Err(DownloadError::ToolNotFound(format!(
                "{} (override path {} does not exist)",
                kind.binary_name(),
                path.display()
            )));
        }

        Self::detect(kind)
            .ok_or_else(|| DownloadError::ToolNotFound(kind.binary_name().to_string()))
    }

    /// Status report for the `tools` subcommand.
    pub fn info(kind: ToolKind, override_path: Option<&Path>) -> ToolInfo {
        let path = match override_path {
            Some(p) if p.is_file() => Some(p.to_path_buf()),
            Some(_) => None,
            None => Self::detect(kind),
        };
        let version = path.as_deref().and_then(|p| Self::version(p, kind));

        ToolInfo {
            name: kind.binary_name().to_string(),
            is_available: path.is_some(),
            path,
            version,
        }
    }

    fn detect(kind: ToolKind) -> Option<PathBuf> {
        let binary = kind.binary_name();

        let common_paths = [
            format!("/opt/homebrew/bin/{binary}"),
            format!("/usr/local/bin/{binary}"),
            format!("/usr/bin/{binary}"),
        ];
        for candidate in common_paths {
            let path = PathBuf::from(&candidate);
            if path.is_file() {
                return Some(path);
            }
        }

        // Fall back to PATH lookup
        if let Ok(output) = Command::new("which").arg(binary).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Some(PathBuf::from(path));
                }
            }
        }

        None
    }

    fn version(path: &Path, kind: ToolKind) -> Option<String> {
        match Command::new(path).arg(kind.version_arg()).output() {
            Ok(output) if output.status.success() => {
                // ffmpeg prints a banner; the first line is enough
                String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .next()
                    .map(|l| l.trim().to_string())
            }
            _ => None,
        }
    }
}
