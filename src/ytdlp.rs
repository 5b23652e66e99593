use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::fetcher::{FetchRequest, FetchStatus, MediaFetcher};
use crate::progress::{ProgressEvent, ProgressReporter};

/// Media fetcher backed by the external `yt-dlp` binary.
///
/// One process per link keeps failures attributable to a single item.
/// `--continue` lets yt-dlp resume its own partial files, and an item whose
/// output already exists is reported as skipped rather than refetched.
pub struct YtDlpFetcher {
    program: PathBuf,
}

impl YtDlpFetcher {
    /// Uses `yt-dlp` from PATH.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("yt-dlp"),
        }
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn build_args(&self, link: &str, request: &FetchRequest) -> Vec<String> {
        let mut args = vec![
            "--newline".to_string(),
            "--no-warnings".to_string(),
            "--no-playlist".to_string(),
            "--continue".to_string(),
            "-f".to_string(),
            request.format.chain(),
            "--merge-output-format".to_string(),
            request.format.merge_container.clone(),
            "-P".to_string(),
            request.target_dir.to_string_lossy().to_string(),
            "-o".to_string(),
            request.output_template.clone(),
        ];
        if let Some(cookies) = &request.cookies {
            args.push("--cookies".to_string());
            args.push(cookies.to_string_lossy().to_string());
        }
        args.push(link.to_string());
        args
    }
}

impl Default for YtDlpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch(
        &self,
        link: &str,
        request: &FetchRequest,
        reporter: &dyn ProgressReporter,
    ) -> Result<FetchStatus> {
        let args = self.build_args(link, request);
        debug!(program = %self.program.display(), ?args, "spawning yt-dlp");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {}", self.program.display()))?;

        let stdout = child.stdout.take().context("yt-dlp stdout not captured")?;
        let stderr = child.stderr.take().context("yt-dlp stderr not captured")?;

        let stdout_pump = async {
            let mut lines = BufReader::new(stdout).lines();
            let mut already_downloaded = false;
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(target: "ytdlp", "{line}");
                if line.contains("has already been downloaded") {
                    already_downloaded = true;
                }
                if let Some(update) = parse_progress_line(&line) {
                    reporter.emit(ProgressEvent::Downloading {
                        item: link.to_string(),
                        percent: update.percent,
                        rate_bytes_per_sec: update.rate_bytes_per_sec,
                        eta_seconds: update.eta_seconds,
                    });
                }
            }
            already_downloaded
        };

        let stderr_pump = async {
            let mut lines = BufReader::new(stderr).lines();
            let mut tail = String::new();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(target: "ytdlp", "{line}");
                if !line.trim().is_empty() {
                    tail = line;
                }
            }
            tail
        };

        // Drain both pipes before waiting so the child can never block on a
        // full pipe buffer.
        let (already_downloaded, stderr_tail) =
            futures::future::join(stdout_pump, stderr_pump).await;

        let status = child.wait().await.context("waiting for yt-dlp")?;
        if !status.success() {
            let code = status
                .code()
                .map(|code| code.to_string())
                .unwrap_or_else(|| "signal".to_string());
            if stderr_tail.is_empty() {
                return Err(anyhow!("yt-dlp exited with status {code}"));
            }
            return Err(anyhow!("yt-dlp exited with status {code}: {stderr_tail}"));
        }

        if already_downloaded {
            return Ok(FetchStatus::Skipped);
        }
        Ok(FetchStatus::Finished)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ProgressLine {
    percent: f64,
    rate_bytes_per_sec: Option<u64>,
    eta_seconds: Option<u64>,
}

/// Parses one `--newline` progress line, e.g.
/// `[download]  42.3% of 10.00MiB at 1.23MiB/s ETA 00:05`.
/// Returns `None` for every other kind of output line.
fn parse_progress_line(line: &str) -> Option<ProgressLine> {
    let rest = line.strip_prefix("[download]")?.trim_start();
    let percent_token = rest.split_whitespace().next()?;
    let percent: f64 = percent_token.strip_suffix('%')?.parse().ok()?;

    let mut rate_bytes_per_sec = None;
    let mut eta_seconds = None;

    let mut tokens = rest.split_whitespace();
    while let Some(token) = tokens.next() {
        match token {
            "at" => {
                if let Some(value) = tokens.next() {
                    rate_bytes_per_sec = parse_rate(value);
                }
            }
            "ETA" => {
                if let Some(value) = tokens.next() {
                    eta_seconds = parse_eta(value);
                }
            }
            _ => {}
        }
    }

    Some(ProgressLine {
        percent,
        rate_bytes_per_sec,
        eta_seconds,
    })
}

fn parse_rate(token: &str) -> Option<u64> {
    parse_size(token.strip_suffix("/s")?)
}

fn parse_size(token: &str) -> Option<u64> {
    // "B" last: every binary suffix ends with it
    const UNITS: [(&str, f64); 5] = [
        ("KiB", 1024.0),
        ("MiB", 1024.0 * 1024.0),
        ("GiB", 1024.0 * 1024.0 * 1024.0),
        ("TiB", 1024.0 * 1024.0 * 1024.0 * 1024.0),
        ("B", 1.0),
    ];
    let token = token.trim_start_matches('~');
    for (suffix, multiplier) in UNITS {
        if let Some(number) = token.strip_suffix(suffix) {
            let number: f64 = number.trim().parse().ok()?;
            return Some((number * multiplier) as u64);
        }
    }
    None
}

/// `hh:mm:ss` or `mm:ss`. yt-dlp prints `Unknown` when it has no estimate.
fn parse_eta(token: &str) -> Option<u64> {
    let mut seconds = 0u64;
    for part in token.split(':') {
        let part: u64 = part.parse().ok()?;
        seconds = seconds * 60 + part;
    }
    Some(seconds)
}
