// Plan building: one ordered downloader argument vector per URL
//
// Flag order matters to the downloader's own parser: size/resume flags
// are read globally and must come first in stream mode, while the
// format flag has to stay contiguous with its value. The URL is always
// the final element.

use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use time::macros::format_description;
use time::OffsetDateTime;

use super::errors::DownloadError;
use super::format_selector::FormatSelector;
use super::models::{DownloadMode, DownloadPlan, PlanOptions};

/// Stream recordings drop files under this floor (stray fragments)
const STREAM_MIN_FILESIZE: &str = "5M";
/// and refuse to grow past this ceiling
const STREAM_MAX_FILESIZE: &str = "40G";

/// Build the plan for one URL. Pure aside from the cookies-file
/// existence check and the stream directory's random suffix; the output
/// directory itself is created later, just before execution.
pub fn build_plan(
    mode: DownloadMode,
    url: &str,
    options: &PlanOptions,
) -> Result<DownloadPlan, DownloadError> {
    match mode {
        DownloadMode::Video | DownloadMode::Audio => {
            let arguments = assemble(mode, url, &options.output_dir, options)?;
            Ok(DownloadPlan {
                url: url.to_string(),
                mode,
                output_dir: options.output_dir.clone(),
                arguments,
            })
        }
        DownloadMode::Stream => {
            // Each stream run records into its own suffixed directory so
            // consecutive and concurrent captures never collide.
            let output_dir = stream_output_dir(&options.output_dir);
            let mut arguments = stream_prefix();
            arguments.extend(assemble(mode, url, &output_dir, options)?);
            Ok(DownloadPlan {
                url: url.to_string(),
                mode,
                output_dir,
                arguments,
            })
        }
    }
}

/// The stream-only prefix block. These are global flags the downloader
/// must see before the format/output flags that follow.
fn stream_prefix() -> Vec<String> {
    [
        "--continue",
        "--live-from-start",
        "--min-filesize",
        STREAM_MIN_FILESIZE,
        "--max-filesize",
        STREAM_MAX_FILESIZE,
        "--abort-on-unavailable-fragments",
        "--no-keep-fragments",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn assemble(
    mode: DownloadMode,
    url: &str,
    output_dir: &Path,
    options: &PlanOptions,
) -> Result<Vec<String>, DownloadError> {
    let mut args: Vec<String> = vec![
        "--no-colors".to_string(),
        "--ignore-config".to_string(),
        "--newline".to_string(),
        "-P".to_string(),
        output_dir.display().to_string(),
        "-o".to_string(),
        options.template.clone(),
        "-f".to_string(),
        FormatSelector::resolve(mode, options.quality, options.format_override.as_deref()),
    ];

    if mode == DownloadMode::Audio {
        args.push("-x".to_string());
        args.push("--embed-metadata".to_string());
        args.push("--embed-thumbnail".to_string());
        if let Some(container) = options.quality.audio_container() {
            args.push("--audio-format".to_string());
            args.push(container.to_string());
        }
    }

    if options.no_playlist {
        args.push("--no-playlist".to_string());
    }

    if let Some(cookies) = &options.cookies_file {
        let absolute = fs::canonicalize(cookies)
            .map_err(|_| DownloadError::CookiesFileNotFound(cookies.clone()))?;
        if !absolute.is_file() {
            return Err(DownloadError::CookiesFileNotFound(cookies.clone()));
        }
        args.push("--cookies".to_string());
        args.push(absolute.display().to_string());
    }

    if let Some(proxy) = &options.proxy {
        args.push("--proxy".to_string());
        args.push(proxy.clone());
    }

    if let Some(ffmpeg) = &options.ffmpeg_path {
        args.push("--ffmpeg-location".to_string());
        args.push(ffmpeg.display().to_string());
    }

    for extra in &options.extra_args {
        if !extra.trim().is_empty() {
            args.push(extra.clone());
        }
    }

    args.push(url.to_string());
    Ok(args)
}

fn stream_output_dir(base: &Path) -> PathBuf {
    let format = format_description!("[year][month][day]-[hour][minute][second]");
    let stamp = OffsetDateTime::now_utc()
        .format(&format)
        .unwrap_or_else(|_| "00000000-000000".to_string());
    let suffix: u32 = rand::thread_rng().gen_range(0..0x0100_0000);
    base.join(format!("stream-{stamp}-{suffix:06x}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::models::QualityPreset;

    fn options(quality: QualityPreset) -> PlanOptions {
        PlanOptions {
            output_dir: PathBuf::from("/tmp/media"),
            quality,
            ..PlanOptions::default()
        }
    }

    fn index_of(args: &[String], flag: &str) -> usize {
        args.iter()
            .position(|a| a == flag)
            .unwrap_or_else(|| panic!("{flag} not in {args:?}"))
    }

    #[test]
    fn url_is_always_the_last_argument() {
        for mode in [
            DownloadMode::Video,
            DownloadMode::Audio,
            DownloadMode::Stream,
        ] {
            let plan =
                build_plan(mode, "https://example.com/x", &options(QualityPreset::Best)).unwrap();
            assert_eq!(plan.arguments.last().unwrap(), "https://example.com/x");
        }
    }

    #[test]
    fn video_plan_is_deterministic() {
        let opts = options(QualityPreset::P720);
        let a = build_plan(DownloadMode::Video, "https://example.com/x", &opts).unwrap();
        let b = build_plan(DownloadMode::Video, "https://example.com/x", &opts).unwrap();
        assert_eq!(a.arguments, b.arguments);
        assert_eq!(a.output_dir, b.output_dir);
    }

    #[test]
    fn video_best_carries_the_general_expression() {
        let plan = build_plan(
            DownloadMode::Video,
            "https://example.com/x",
            &options(QualityPreset::Best),
        )
        .unwrap();
        let f = index_of(&plan.arguments, "-f");
        assert_eq!(plan.arguments[f + 1], "bv*+ba/best");
    }

    #[test]
    fn audio_mp3_plan_has_extraction_and_conversion_flags() {
        let plan = build_plan(
            DownloadMode::Audio,
            "https://example.com/x",
            &options(QualityPreset::AudioMp3),
        )
        .unwrap();
        let args = &plan.arguments;
        assert!(args.contains(&"-x".to_string()));
        assert!(args.contains(&"--embed-metadata".to_string()));
        assert!(args.contains(&"--embed-thumbnail".to_string()));
        let conv = index_of(args, "--audio-format");
        assert_eq!(args[conv + 1], "mp3");
    }

    #[test]
    fn audio_best_plan_skips_container_conversion() {
        let plan = build_plan(
            DownloadMode::Audio,
            "https://example.com/x",
            &options(QualityPreset::AudioBest),
        )
        .unwrap();
        assert!(!plan.arguments.contains(&"--audio-format".to_string()));
    }

    #[test]
    fn stream_prefix_block_is_contiguous_and_first() {
        let plan = build_plan(
            DownloadMode::Stream,
            "https://example.com/live",
            &options(QualityPreset::Best),
        )
        .unwrap();
        let expected = [
            "--continue",
            "--live-from-start",
            "--min-filesize",
            "5M",
            "--max-filesize",
            "40G",
            "--abort-on-unavailable-fragments",
            "--no-keep-fragments",
        ];
        assert_eq!(&plan.arguments[..expected.len()], &expected[..]);
        // Size bounds must land before the format flag
        assert!(index_of(&plan.arguments, "--max-filesize") < index_of(&plan.arguments, "-f"));
    }

    #[test]
    fn stream_output_dir_is_uniquely_suffixed() {
        let opts = options(QualityPreset::Best);
        let a = build_plan(DownloadMode::Stream, "https://example.com/live", &opts).unwrap();
        let b = build_plan(DownloadMode::Stream, "https://example.com/live", &opts).unwrap();
        assert_ne!(a.output_dir, b.output_dir);
        let name = a.output_dir.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("stream-"), "got {name}");
        assert!(a.output_dir.starts_with("/tmp/media"));
    }

    #[test]
    fn output_flags_precede_the_format_flag() {
        let plan = build_plan(
            DownloadMode::Video,
            "https://example.com/x",
            &options(QualityPreset::Best),
        )
        .unwrap();
        assert!(index_of(&plan.arguments, "-P") < index_of(&plan.arguments, "-f"));
        assert!(index_of(&plan.arguments, "-o") < index_of(&plan.arguments, "-f"));
    }

    #[test]
    fn missing_cookies_file_fails_validation() {
        let mut opts = options(QualityPreset::Best);
        opts.cookies_file = Some(PathBuf::from("/nonexistent/cookies.txt"));
        let err = build_plan(DownloadMode::Video, "https://example.com/x", &opts).unwrap_err();
        assert!(matches!(err, DownloadError::CookiesFileNotFound(_)));
    }

    #[test]
    fn existing_cookies_file_is_passed_absolute() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut opts = options(QualityPreset::Best);
        opts.cookies_file = Some(file.path().to_path_buf());
        let plan = build_plan(DownloadMode::Video, "https://example.com/x", &opts).unwrap();
        let c = index_of(&plan.arguments, "--cookies");
        assert!(Path::new(&plan.arguments[c + 1]).is_absolute());
    }

    #[test]
    fn blank_extra_args_are_skipped_in_order() {
        let mut opts = options(QualityPreset::Best);
        opts.extra_args = vec![
            "--limit-rate".to_string(),
            "".to_string(),
            "2M".to_string(),
            "  ".to_string(),
        ];
        let plan = build_plan(DownloadMode::Video, "https://example.com/x", &opts).unwrap();
        let r = index_of(&plan.arguments, "--limit-rate");
        assert_eq!(plan.arguments[r + 1], "2M");
    }

    #[test]
    fn no_playlist_flag_is_opt_in() {
        let mut opts = options(QualityPreset::Best);
        let expanded = build_plan(DownloadMode::Video, "https://example.com/x", &opts).unwrap();
        assert!(!expanded.arguments.contains(&"--no-playlist".to_string()));

        opts.no_playlist = true;
        let single = build_plan(DownloadMode::Video, "https://example.com/x", &opts).unwrap();
        assert!(single.arguments.contains(&"--no-playlist".to_string()));
    }

    #[test]
    fn ffmpeg_location_is_forwarded_when_known() {
        let mut opts = options(QualityPreset::Best);
        opts.ffmpeg_path = Some(PathBuf::from("/usr/bin/ffmpeg"));
        let plan = build_plan(DownloadMode::Video, "https://example.com/x", &opts).unwrap();
        let loc = index_of(&plan.arguments, "--ffmpeg-location");
        assert_eq!(plan.arguments[loc + 1], "/usr/bin/ffmpeg");
    }
}
