// URL collection: literal URLs and one-per-line list files

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use super::errors::DownloadError;

lazy_static! {
    static ref URL_RE: Regex = Regex::new(r"^(https?|ftp)://\S+$").unwrap();
}

/// Expand and validate a mixed list of URL-or-file inputs.
///
/// Each input is either a literal URL or a path to a text file with one
/// URL per line (blank lines skipped). The combined result is
/// deduplicated case-insensitively, keeping the first-seen spelling and
/// order. An empty result is not an error; the caller treats zero URLs
/// as a no-op.
pub fn collect_urls(inputs: &[String]) -> Result<Vec<String>, DownloadError> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for input in inputs {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        let path = Path::new(trimmed);
        if path.is_file() {
            let contents = fs::read_to_string(path)?;
            for (idx, line) in contents.lines().enumerate() {
                let entry = line.trim();
                if entry.is_empty() {
                    continue;
                }
                if !URL_RE.is_match(entry) {
                    return Err(DownloadError::InvalidUrlInFile {
                        file: path.to_path_buf(),
                        line: idx + 1,
                        entry: entry.to_string(),
                    });
                }
                push_unique(&mut seen, &mut urls, entry);
            }
        } else if URL_RE.is_match(trimmed) {
            push_unique(&mut seen, &mut urls, trimmed);
        } else {
            return Err(DownloadError::InvalidUrl(trimmed.to_string()));
        }
    }

    Ok(urls)
}

fn push_unique(seen: &mut HashSet<String>, urls: &mut Vec<String>, url: &str) {
    if seen.insert(url.to_lowercase()) {
        urls.push(url.to_string());
    }
}
