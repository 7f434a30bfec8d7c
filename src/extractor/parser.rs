//! Parsers for yt-dlp command output

use crate::types::MediaInfo;
use serde::Deserialize;

/// Marks our progress lines so they can't be confused with other stdout output
const PROGRESS_MARKER: &str = "vidfetch-progress";

/// Prefix yt-dlp puts on fatal error lines
const ERROR_PREFIX: &str = "ERROR:";

/// Prefix for every extraction failure surfaced to users
pub(crate) const FAILURE_PREFIX: &str = "An error occurred during download";

/// Value passed to `--progress-template`
///
/// Each progress tick prints one line:
/// `vidfetch-progress <downloaded> <total> <estimate>` where unknown fields
/// read `NA`.
pub fn progress_template() -> String {
    format!(
        "download:{PROGRESS_MARKER} %(progress.downloaded_bytes)s \
         %(progress.total_bytes)s %(progress.total_bytes_estimate)s"
    )
}

/// Parse one stdout line produced by [`progress_template`]
///
/// Returns `(downloaded_bytes, total_bytes)`, where the total falls back to
/// yt-dlp's estimate. Lines without the marker yield `None`.
pub fn parse_progress_line(line: &str) -> Option<(u64, Option<u64>)> {
    let mut fields = line.trim().strip_prefix(PROGRESS_MARKER)?.split_whitespace();

    let downloaded = parse_byte_count(fields.next()?)?;
    let total = fields.next().and_then(parse_byte_count);
    let estimate = fields.next().and_then(parse_byte_count);

    Some((downloaded, total.or(estimate)))
}

/// yt-dlp prints integers for exact sizes, floats for estimates, and `NA` or
/// `None` for unknowns
fn parse_byte_count(field: &str) -> Option<u64> {
    let value: f64 = field.parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value as u64)
    } else {
        None
    }
}

#[derive(Deserialize)]
struct ProbeOutput {
    title: Option<String>,
    ext: Option<String>,
}

/// Parse the JSON printed by `yt-dlp --dump-single-json`
///
/// Missing title and extension default to `video` and `mp4`.
pub fn parse_probe_output(stdout: &[u8]) -> crate::Result<MediaInfo> {
    let output: ProbeOutput = serde_json::from_slice(stdout).map_err(|e| {
        crate::Error::Extraction(format!(
            "{FAILURE_PREFIX}: could not read extractor metadata: {e}"
        ))
    })?;

    Ok(MediaInfo {
        title: output
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "video".to_string()),
        ext: output
            .ext
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| "mp4".to_string()),
    })
}

/// Pick the most useful line out of yt-dlp's stderr
///
/// The last `ERROR:` line wins, then the last non-empty line.
pub(crate) fn failure_message(stderr: &[u8], exit_code: Option<i32>) -> String {
    let output = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let detail = lines
        .iter()
        .rev()
        .find(|l| l.starts_with(ERROR_PREFIX))
        .or_else(|| lines.last())
        .map(|l| l.to_string())
        .unwrap_or_else(|| match exit_code {
            Some(code) => format!("yt-dlp exited with status {code}"),
            None => "yt-dlp was terminated by a signal".to_string(),
        });

    format!("{FAILURE_PREFIX}: {detail}")
}
