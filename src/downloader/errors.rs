// Error types shared across the download engine

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// Input was neither a URL nor a path to a URL list file
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A URL list file contained a line that is not a URL
    #[error("invalid URL in {file} at line {line}: {entry}")]
    InvalidUrlInFile {
        file: PathBuf,
        line: usize,
        entry: String,
    },

    /// Cookies file passed on the command line does not exist
    #[error("cookies file not found: {0}")]
    CookiesFileNotFound(PathBuf),

    /// Quality preset name not in the closed preset table
    #[error("unknown quality preset '{0}' (expected best, 1080p, 720p, 480p, audio-best, audio-m4a or audio-mp3)")]
    UnknownPreset(String),

    /// Downloader or transcoder binary could not be resolved
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Subprocess could not be spawned or waited on
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Both the remux and the transcode attempt failed for a stream file
    #[error("conversion failed for {file}: {message}")]
    Conversion { file: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
