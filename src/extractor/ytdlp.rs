//! yt-dlp backed extractor using the external binary

use super::parser::{failure_message, parse_probe_output, parse_progress_line, progress_template};
use super::traits::MediaExtractor;
use crate::config::ExtractorConfig;
use crate::progress::ProgressSink;
use crate::types::MediaInfo;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

/// Output template handed to `-o`, relative to the scratch directory
const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Extractor that runs the external `yt-dlp` binary
///
/// # Examples
///
/// ```no_run
/// use vidfetch::extractor::{MediaExtractor, YtDlpExtractor};
/// use std::path::PathBuf;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // Create with explicit path
/// let extractor = YtDlpExtractor::new(PathBuf::from("/usr/bin/yt-dlp"));
///
/// // Or auto-discover from PATH
/// let extractor = YtDlpExtractor::from_path()
///     .expect("yt-dlp not found in PATH");
///
/// let info = extractor.probe("https://example.com/watch?v=abc").await?;
/// # Ok(())
/// # }
/// ```
pub struct YtDlpExtractor {
    binary_path: PathBuf,
    format: String,
    no_playlist: bool,
    extra_args: Vec<String>,
}

impl YtDlpExtractor {
    /// Create an extractor with an explicit binary path and default options
    pub fn new(binary_path: PathBuf) -> Self {
        Self::with_config(binary_path, &ExtractorConfig::default())
    }

    /// Create an extractor with options taken from the configuration
    pub fn with_config(binary_path: PathBuf, config: &ExtractorConfig) -> Self {
        Self {
            binary_path,
            format: config.format.clone(),
            no_playlist: config.no_playlist,
            extra_args: config.extra_args.clone(),
        }
    }

    /// Attempt to find yt-dlp in PATH
    ///
    /// # Returns
    ///
    /// `Some(YtDlpExtractor)` if the binary is found, `None` otherwise.
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Arguments shared by probe and fetch, URL excluded
    fn common_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.no_playlist {
            args.push("--no-playlist".to_string());
        }
        args.push("-f".to_string());
        args.push(self.format.clone());
        args.extend(self.extra_args.iter().cloned());
        args
    }

    fn probe_command(&self, url: &str) -> Command {
        let mut command = Command::new(&self.binary_path);
        // A dropped request must not leave the probe running
        command.kill_on_drop(true);
        command
            .arg("--dump-single-json")
            .arg("--skip-download")
            .args(self.common_args())
            .arg("--")
            .arg(url);
        command
    }

    fn fetch_command(&self, url: &str, dest_dir: &Path) -> Command {
        let mut command = Command::new(&self.binary_path);
        command
            .arg("--newline")
            .arg("--progress-template")
            .arg(progress_template())
            .arg("-o")
            .arg(dest_dir.join(OUTPUT_TEMPLATE))
            .args(self.common_args())
            .arg("--")
            .arg(url);
        command
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    async fn probe(&self, url: &str) -> crate::Result<MediaInfo> {
        let output = self
            .probe_command(url)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| crate::Error::ExternalTool(format!("Failed to execute yt-dlp: {}", e)))?;

        if !output.status.success() {
            return Err(crate::Error::Extraction(failure_message(
                &output.stderr,
                output.status.code(),
            )));
        }

        parse_probe_output(&output.stdout)
    }

    async fn fetch(
        &self,
        url: &str,
        dest_dir: &Path,
        progress: &ProgressSink,
    ) -> crate::Result<()> {
        let mut child = self
            .fetch_command(url, dest_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| crate::Error::ExternalTool(format!("Failed to execute yt-dlp: {}", e)))?;

        // Drain stderr concurrently so a chatty extractor can't block on a full pipe
        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let _ = stderr.read_to_end(&mut buf).await;
                buf
            })
        });

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if let Some((downloaded, total)) = parse_progress_line(&line) {
                            progress.report(downloaded, total).await;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(
                            task_id = %progress.task_id(),
                            error = %e,
                            "failed to read yt-dlp output"
                        );
                        break;
                    }
                }
            }
        }

        let status = child.wait().await?;
        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => Vec::new(),
        };

        if status.success() {
            Ok(())
        } else {
            let message = failure_message(&stderr, status.code());
            tracing::debug!(task_id = %progress.task_id(), %message, "yt-dlp failed");
            Err(crate::Error::Extraction(message))
        }
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

impl std::fmt::Debug for YtDlpExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YtDlpExtractor")
            .field("binary_path", &self.binary_path)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}
