// FormatSelector - maps quality presets to yt-dlp format expressions
//
// Resolution depends on both preset and mode: audio presets are
// meaningless for a video target and vice versa, so mismatches are
// corrected silently rather than handed to the downloader.

use super::models::{DownloadMode, QualityPreset};

/// General best video+audio expression, single-stream fallback
const BEST_VIDEO: &str = "bv*+ba/best";
/// Best audio-only stream, single-stream fallback
const BEST_AUDIO: &str = "ba/b";

pub struct FormatSelector;

impl FormatSelector {
    /// Resolve the format expression for one plan.
    ///
    /// An explicit override bypasses preset resolution entirely and is
    /// used verbatim. Stream mode selects like video mode.
    pub fn resolve(
        mode: DownloadMode,
        quality: QualityPreset,
        format_override: Option<&str>,
    ) -> String {
        if let Some(expr) = format_override {
            return expr.to_string();
        }

        let wants_audio = matches!(mode, DownloadMode::Audio);
        match (wants_audio, quality.is_audio()) {
            // Audio preset against a video/stream target: fall back to best
            (false, true) => BEST_VIDEO.to_string(),
            // Video preset against an audio target: fall back to best audio
            (true, false) => BEST_AUDIO.to_string(),
            _ => Self::format_spec(quality).to_string(),
        }
    }

    /// Preset table. Height-capped entries fall back to an equivalent
    /// single stream, then to the general best expression.
    fn format_spec(quality: QualityPreset) -> &'static str {
        match quality {
            QualityPreset::Best => BEST_VIDEO,
            QualityPreset::P1080 => "bv*[height<=1080]+ba/b[height<=1080]/bv*+ba/best",
            QualityPreset::P720 => "bv*[height<=720]+ba/b[height<=720]/bv*+ba/best",
            QualityPreset::P480 => "bv*[height<=480]+ba/b[height<=480]/bv*+ba/best",
            QualityPreset::AudioBest => BEST_AUDIO,
            // m4a container preferred, any audio as fallback
            QualityPreset::AudioM4a => "ba[ext=m4a]/ba/b",
            // mp3 conversion happens via extraction flags, not selection
            QualityPreset::AudioMp3 => BEST_AUDIO,
        }
    }
}
