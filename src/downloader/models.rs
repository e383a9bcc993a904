// Common data models for the download engine

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use super::errors::DownloadError;

/// What the user asked for: a video file, an audio rip, or a livestream capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadMode {
    Video,
    Audio,
    Stream,
}

impl DownloadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Stream => "stream",
        }
    }
}

impl fmt::Display for DownloadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Symbolic quality presets, resolved to yt-dlp format expressions
/// by the format selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityPreset {
    Best,
    P1080,
    P720,
    P480,
    AudioBest,
    AudioM4a,
    AudioMp3,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Best => "best",
            Self::P1080 => "1080p",
            Self::P720 => "720p",
            Self::P480 => "480p",
            Self::AudioBest => "audio-best",
            Self::AudioM4a => "audio-m4a",
            Self::AudioMp3 => "audio-mp3",
        }
    }

    /// Whether this preset selects an audio-only stream
    pub fn is_audio(&self) -> bool {
        matches!(self, Self::AudioBest | Self::AudioM4a | Self::AudioMp3)
    }

    /// Concrete audio container requested by the preset, if any.
    /// Drives the `--audio-format` conversion flag in audio mode.
    pub fn audio_container(&self) -> Option<&'static str> {
        match self {
            Self::AudioM4a => Some("m4a"),
            Self::AudioMp3 => Some("mp3"),
            _ => None,
        }
    }
}

impl FromStr for QualityPreset {
    type Err = DownloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "best" => Ok(Self::Best),
            "1080p" => Ok(Self::P1080),
            "720p" => Ok(Self::P720),
            "480p" => Ok(Self::P480),
            "audio-best" => Ok(Self::AudioBest),
            "audio-m4a" => Ok(Self::AudioM4a),
            "audio-mp3" => Ok(Self::AudioMp3),
            other => Err(DownloadError::UnknownPreset(other.to_string())),
        }
    }
}

impl fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the plan builder needs besides mode and URL.
/// Threaded explicitly from the CLI; there is no ambient preference state.
#[derive(Debug, Clone)]
pub struct PlanOptions {
    /// Directory downloads land in
    pub output_dir: PathBuf,
    /// yt-dlp output filename template
    pub template: String,
    pub quality: QualityPreset,
    /// Explicit format expression; bypasses preset resolution entirely
    pub format_override: Option<String>,
    pub proxy: Option<String>,
    /// Netscape cookies.txt path; must exist
    pub cookies_file: Option<PathBuf>,
    /// Suppress playlist expansion
    pub no_playlist: bool,
    /// Extra downloader arguments, passed through verbatim
    pub extra_args: Vec<String>,
    /// Transcoder binary, forwarded via --ffmpeg-location when known
    pub ffmpeg_path: Option<PathBuf>,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            output_dir: dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
            template: "%(title)s.%(ext)s".to_string(),
            quality: QualityPreset::Best,
            format_override: None,
            proxy: None,
            cookies_file: None,
            no_playlist: false,
            extra_args: Vec::new(),
            ffmpeg_path: None,
        }
    }
}

/// One fully-assembled downloader invocation.
/// Immutable after construction; `arguments` always ends with the URL.
#[derive(Debug, Clone)]
pub struct DownloadPlan {
    pub url: String,
    pub mode: DownloadMode,
    /// Created eagerly before execution; unique per plan in stream mode
    pub output_dir: PathBuf,
    pub arguments: Vec<String>,
}

/// Terminal outcome of one plan. Never mutated after creation.
#[derive(Debug, Clone, Serialize)]
pub struct TaskResult {
    pub url: String,
    pub mode: DownloadMode,
    pub output_path: PathBuf,
    pub success: bool,
    pub duration_ms: u64,
    pub exit_code: i32,
    pub message: String,
}

impl TaskResult {
    pub fn ok(plan: &DownloadPlan, duration_ms: u64, message: String) -> Self {
        Self {
            url: plan.url.clone(),
            mode: plan.mode,
            output_path: plan.output_dir.clone(),
            success: true,
            duration_ms,
            exit_code: 0,
            message,
        }
    }

    pub fn failed(
        plan: &DownloadPlan,
        duration_ms: u64,
        exit_code: i32,
        message: String,
    ) -> Self {
        Self {
            url: plan.url.clone(),
            mode: plan.mode,
            output_path: plan.output_dir.clone(),
            success: false,
            duration_ms,
            exit_code,
            message,
        }
    }
}
