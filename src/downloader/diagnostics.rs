// Failure diagnostics - classifies downloader stderr
//
// The downloader reports everything through stderr text; this maps the
// common failure patterns onto a short reason used in task summaries.

/// Why a download attempt failed, as far as stderr tells us
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// HTTP 403 / access denied
    Forbidden,
    /// Age-restricted content requiring login cookies
    AgeRestricted,
    /// Not available in this region
    GeoBlocked,
    /// Private video requiring authorization
    PrivateVideo,
    /// Removed or never existed
    VideoUnavailable,
    /// HTTP 429 or similar throttling
    RateLimited,
    /// Connection timeout or refusal
    NetworkFailure,
    /// The requested format expression matched nothing
    FormatUnavailable,
    /// No extractor claimed the URL
    UnsupportedUrl,
}

impl FailureReason {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Forbidden => "access denied (HTTP 403)",
            Self::AgeRestricted => "age-restricted content, cookies required",
            Self::GeoBlocked => "not available in this region",
            Self::PrivateVideo => "private video",
            Self::VideoUnavailable => "video unavailable",
            Self::RateLimited => "rate limited by the site",
            Self::NetworkFailure => "network failure or timeout",
            Self::FormatUnavailable => "requested format is not available",
            Self::UnsupportedUrl => "no extractor supports this URL",
        }
    }
}

/// Analyze stderr output and name the failure, most specific first.
pub fn diagnose(stderr: &str) -> Option<FailureReason> {
    let lower = stderr.to_lowercase();

    if lower.contains("requested format is not available") {
        return Some(FailureReason::FormatUnavailable);
    }
    if lower.contains("unsupported url") || lower.contains("is not a valid url") {
        return Some(FailureReason::UnsupportedUrl);
    }
    if lower.contains("age-restricted") || lower.contains("sign in to confirm your age") {
        return Some(FailureReason::AgeRestricted);
    }
    if lower.contains("private video") || lower.contains("video is private") {
        return Some(FailureReason::PrivateVideo);
    }
    if lower.contains("video unavailable")
        || lower.contains("video has been removed")
        || lower.contains("no longer available")
    {
        return Some(FailureReason::VideoUnavailable);
    }
    if lower.contains("not available in your country")
        || lower.contains("blocked in your country")
        || lower.contains("geographic restriction")
    {
        return Some(FailureReason::GeoBlocked);
    }
    if lower.contains("429") || lower.contains("rate limit") || lower.contains("too many requests")
    {
        return Some(FailureReason::RateLimited);
    }
    if lower.contains("403") || lower.contains("forbidden") {
        return Some(FailureReason::Forbidden);
    }
    if lower.contains("timed out")
        || lower.contains("timeout")
        || lower.contains("connection refused")
        || lower.contains("network unreachable")
    {
        return Some(FailureReason::NetworkFailure);
    }

    None
}

/// One-line failure message for a task summary: classified reason when
/// stderr matched a known pattern, otherwise the last ERROR line.
pub fn failure_message(stderr: &str) -> String {
    if let Some(reason) = diagnose(stderr) {
        return reason.description().to_string();
    }

    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("downloader reported no error output")
        .to_string()
}
