// Command-line surface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "vidgrab",
    version,
    about = "Download videos, rip audio and capture livestreams via yt-dlp and ffmpeg"
)]
pub struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download one or more videos
    Video {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Download and extract audio tracks
    Audio {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Record one or more livestreams, normalized to MP4
    Stream {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Show resolved tool paths and versions
    Tools {
        /// Downloader binary override
        #[arg(long, value_name = "PATH")]
        downloader_path: Option<PathBuf>,

        /// Transcoder binary override
        #[arg(long, value_name = "PATH")]
        ffmpeg_path: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
pub struct CommonArgs {
    /// URLs, or paths to text files with one URL per line
    #[arg(required = true, value_name = "URL|FILE")]
    pub inputs: Vec<String>,

    /// Output directory (defaults to the system download dir)
    #[arg(short = 'd', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output filename template
    #[arg(
        short = 't',
        long,
        value_name = "TEMPLATE",
        default_value = "%(title)s.%(ext)s"
    )]
    pub template: String,

    /// Quality preset: best, 1080p, 720p, 480p, audio-best, audio-m4a, audio-mp3
    #[arg(long, value_name = "PRESET")]
    pub quality: Option<String>,

    /// Explicit format expression, bypasses --quality
    #[arg(short, long, value_name = "EXPR")]
    pub format: Option<String>,

    /// Proxy URL forwarded to the downloader
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Netscape cookies.txt file
    #[arg(long, value_name = "FILE")]
    pub cookies: Option<PathBuf>,

    /// Do not expand playlists
    #[arg(long)]
    pub no_playlist: bool,

    /// Maximum simultaneous downloads (streams always record one at a time)
    #[arg(short = 'p', long, value_name = "N", default_value_t = 1)]
    pub parallel: usize,

    /// Print each downloader invocation instead of running it
    #[arg(long)]
    pub dry_run: bool,

    /// Print the result list as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Downloader binary override
    #[arg(long, value_name = "PATH")]
    pub downloader_path: Option<PathBuf>,

    /// Transcoder binary override
    #[arg(long, value_name = "PATH")]
    pub ffmpeg_path: Option<PathBuf>,

    /// Extra downloader arguments, passed through verbatim after `--`
    #[arg(last = true, value_name = "ARGS")]
    pub extra_args: Vec<String>,
}
