use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::fetcher::{FetchRequest, FetchStatus, MediaFetcher};
use crate::progress::{ProgressEvent, ProgressReporter};

/// Fetcher for links that point straight at a media file.
///
/// No site API involved: HEAD for the size, ranged GET into a `.part` file,
/// rename on completion. A complete file of the expected size on disk is
/// skipped; a leftover `.part` is resumed with a Range request. The output
/// name is the final path segment of the URL.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MediaFetcher for HttpFetcher {
    async fn fetch(
        &self,
        link: &str,
        request: &FetchRequest,
        reporter: &dyn ProgressReporter,
    ) -> Result<FetchStatus> {
        let file_name = file_name_for(link)?;
        let output_path = request.target_dir.join(&file_name);
        let partial_path = PathBuf::from(format!("{}.part", output_path.display()));

        let response = self
            .client
            .head(link)
            .send()
            .await
            .context("HEAD request failed")?;

        let total_bytes = response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        if output_path.exists() {
            let actual_size = fs::metadata(&output_path)?.len();
            let matches = total_bytes.is_none_or(|expected| actual_size == expected);
            if matches {
                debug!(file = %file_name, "already on disk");
                return Ok(FetchStatus::Skipped);
            }
            // Size mismatch, refetch from scratch
            fs::remove_file(&output_path)?;
        }

        let mut current_pos = 0u64;
        if partial_path.exists() {
            current_pos = fs::metadata(&partial_path)?.len();
        }
        if let Some(total) = total_bytes {
            if current_pos > total {
                // Partial larger than the remote file; start over
                fs::remove_file(&partial_path)?;
                current_pos = 0;
            }
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&partial_path)
            .context("Failed to open output file")?;

        let mut get = self.client.get(link);
        if current_pos > 0 {
            get = get.header("Range", format!("bytes={current_pos}-"));
        }

        let mut response = get.send().await.context("GET request failed")?;
        if !response.status().is_success() && response.status() != 206 {
            return Err(anyhow!("HTTP request failed: {}", response.status()));
        }

        let started = Instant::now();
        let mut downloaded = 0u64;

        while let Some(chunk) = response.chunk().await? {
            if chunk.is_empty() {
                break;
            }
            file.write_all(&chunk)?;
            downloaded += chunk.len() as u64;

            let position = current_pos + downloaded;
            let elapsed = started.elapsed().as_secs_f64();
            let rate = if elapsed > 0.0 {
                Some((downloaded as f64 / elapsed) as u64)
            } else {
                None
            };
            let (percent, eta) = match total_bytes {
                Some(total) if total > 0 => {
                    let percent = position as f64 * 100.0 / total as f64;
                    let eta = rate
                        .filter(|rate| *rate > 0)
                        .map(|rate| total.saturating_sub(position) / rate);
                    (percent, eta)
                }
                _ => (0.0, None),
            };
            reporter.emit(ProgressEvent::Downloading {
                item: link.to_string(),
                percent,
                rate_bytes_per_sec: rate,
                eta_seconds: eta,
            });
        }

        fs::rename(&partial_path, &output_path)?;

        let actual_size = fs::metadata(&output_path)?.len();
        if let Some(expected) = total_bytes {
            if actual_size != expected {
                // Do not leave a short file a rerun would mistake for complete
                let _ = fs::remove_file(&output_path);
                return Err(anyhow!(
                    "File size mismatch for {file_name}: expected {expected} bytes, got {actual_size} bytes"
                ));
            }
        }

        Ok(FetchStatus::Finished)
    }
}

fn file_name_for(link: &str) -> Result<String> {
    let url = Url::parse(link).with_context(|| format!("invalid download url: {link}"))?;
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("no file name in url: {link}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_last_path_segment() {
        assert_eq!(
            file_name_for("https://example.com/media/clip.mp4").unwrap(),
            "clip.mp4"
        );
        assert_eq!(
            file_name_for("https://example.com/clip.mp4?token=abc").unwrap(),
            "clip.mp4"
        );
    }

    #[test]
    fn urls_without_a_file_name_are_rejected() {
        assert!(file_name_for("https://example.com/").is_err());
        assert!(file_name_for("/p/a").is_err());
    }
}
