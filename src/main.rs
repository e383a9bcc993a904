mod cli;
mod downloader;

use std::path::Path;
use std::process;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, CommonArgs};
use crate::downloader::{
    build_plan, collect_urls, DispatchController, DownloadError, DownloadMode, PlanOptions,
    ProcessRunner, QualityPreset, StreamPostProcessor, SystemRunner, TaskExecutor, TaskResult,
    ToolKind, ToolManager,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            process::exit(2);
        }
    }
}

async fn run(cli: Cli) -> Result<i32, DownloadError> {
    match cli.command {
        Commands::Video { common } => run_batch(DownloadMode::Video, common).await,
        Commands::Audio { common } => run_batch(DownloadMode::Audio, common).await,
        Commands::Stream { common } => run_batch(DownloadMode::Stream, common).await,
        Commands::Tools {
            downloader_path,
            ffmpeg_path,
        } => {
            report_tools(downloader_path.as_deref(), ffmpeg_path.as_deref());
            Ok(0)
        }
    }
}

async fn run_batch(mode: DownloadMode, args: CommonArgs) -> Result<i32, DownloadError> {
    let urls = collect_urls(&args.inputs)?;
    if urls.is_empty() {
        info!("no URLs given, nothing to do");
        return Ok(0);
    }

    let quality = match &args.quality {
        Some(q) => q.parse::<QualityPreset>()?,
        None => default_quality(mode),
    };

    // Preflight: both tools resolve before any plan runs. The
    // transcoder is mandatory for stream capture, best-effort otherwise
    // (forwarded via --ffmpeg-location when present).
    let downloader = ToolManager::resolve(ToolKind::Downloader, args.downloader_path.as_deref())?;
    let ffmpeg = if mode == DownloadMode::Stream || args.ffmpeg_path.is_some() {
        Some(ToolManager::resolve(
            ToolKind::Transcoder,
            args.ffmpeg_path.as_deref(),
        )?)
    } else {
        ToolManager::resolve(ToolKind::Transcoder, None).ok()
    };

    let options = PlanOptions {
        output_dir: args
            .output_dir
            .unwrap_or_else(|| PlanOptions::default().output_dir),
        template: args.template,
        quality,
        format_override: args.format,
        proxy: args.proxy,
        cookies_file: args.cookies,
        no_playlist: args.no_playlist,
        extra_args: args.extra_args,
        ffmpeg_path: ffmpeg.clone(),
    };

    let plans = urls
        .iter()
        .map(|url| build_plan(mode, url, &options))
        .collect::<Result<Vec<_>, _>>()?;

    if args.dry_run {
        for plan in &plans {
            println!("{} {}", downloader.display(), plan.arguments.join(" "));
        }
        return Ok(0);
    }

    let runner: Arc<dyn ProcessRunner> = Arc::new(SystemRunner);
    let executor = Arc::new(TaskExecutor::new(downloader, runner.clone()));
    let postprocessor =
        ffmpeg.map(|path| Arc::new(StreamPostProcessor::new(path, runner.clone())));
    let controller = DispatchController::new(executor, postprocessor, args.parallel);

    let results = controller.dispatch(plans).await;

    if args.json {
        // Structured consumption: the caller inspects the list itself
        let json = serde_json::to_string_pretty(&results).expect("results serialize to JSON");
        println!("{json}");
        return Ok(0);
    }

    summarize(&results);
    Ok(if results.iter().all(|r| r.success) {
        0
    } else {
        1
    })
}

fn default_quality(mode: DownloadMode) -> QualityPreset {
    match mode {
        DownloadMode::Audio => QualityPreset::AudioBest,
        DownloadMode::Video | DownloadMode::Stream => QualityPreset::Best,
    }
}

fn summarize(results: &[TaskResult]) {
    let failed = results.iter().filter(|r| !r.success).count();
    for result in results {
        let secs = result.duration_ms as f64 / 1000.0;
        if result.success {
            println!("ok      {} ({secs:.1}s) -> {}", result.url, result.output_path.display());
        } else {
            println!(
                "failed  {} ({secs:.1}s, exit {}): {}",
                result.url, result.exit_code, result.message
            );
        }
    }
    if results.len() > 1 {
        println!("{}/{} succeeded", results.len() - failed, results.len());
    }
}

fn report_tools(downloader_path: Option<&Path>, ffmpeg_path: Option<&Path>) {
    let infos = [
        ToolManager::info(ToolKind::Downloader, downloader_path),
        ToolManager::info(ToolKind::Transcoder, ffmpeg_path),
    ];
    for info in infos {
        match (&info.path, &info.version) {
            (Some(path), Some(version)) => {
                println!("{:<8} {} ({version})", info.name, path.display())
            }
            (Some(path), None) => println!("{:<8} {} (version unknown)", info.name, path.display()),
            _ => println!("{:<8} not found", info.name),
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose >= 2 {
        "trace"
    } else if verbose == 1 {
        "debug"
    } else {
        "info"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Logs go to stderr so --json output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
