use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::fetcher::{FetchRequest, FetchStatus, MediaFetcher};
use crate::link::Link;
use crate::progress::{ProgressEvent, ProgressReporter};

/// Per-link record of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadTask {
    pub link: Link,
    pub outcome: TaskOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    Finished,
    Skipped,
    Failed { reason: String },
}

/// Tally of a completed batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub finished: usize,
    pub skipped: usize,
    pub failed: usize,
    /// One record per input link, in input order.
    pub tasks: Vec<DownloadTask>,
}

impl BatchResult {
    pub fn attempted(&self) -> usize {
        self.tasks.len()
    }
}

/// Feeds links through a [`MediaFetcher`] one at a time.
///
/// Items are attempted strictly in input order and a failure on one never
/// stops the rest; the run itself only fails on its preconditions (missing
/// cookie file, uncreatable target directory).
pub struct BatchDownloader<F> {
    fetcher: F,
}

impl<F: MediaFetcher> BatchDownloader<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub async fn run(
        &self,
        links: &[Link],
        target_dir: &Path,
        cookies: Option<&Path>,
        reporter: &dyn ProgressReporter,
    ) -> Result<BatchResult> {
        if let Some(cookies) = cookies {
            if !cookies.exists() {
                return Err(Error::CredentialsMissing {
                    path: cookies.to_path_buf(),
                });
            }
        }
        fs::create_dir_all(target_dir).map_err(|source| Error::Storage {
            path: target_dir.to_path_buf(),
            source,
        })?;

        if links.is_empty() {
            info!("no links to download");
            return Ok(BatchResult {
                finished: 0,
                skipped: 0,
                failed: 0,
                tasks: Vec::new(),
            });
        }

        let request = FetchRequest::new(target_dir).with_cookies(cookies.map(Path::to_path_buf));

        info!(count = links.len(), dir = %target_dir.display(), "starting batch download");

        let mut tasks = Vec::with_capacity(links.len());
        let (mut finished, mut skipped, mut failed) = (0usize, 0usize, 0usize);

        for link in links {
            let outcome = match self.fetcher.fetch(link.as_str(), &request, reporter).await {
                Ok(FetchStatus::Finished) => {
                    finished += 1;
                    reporter.emit(ProgressEvent::Finished {
                        item: link.as_str().to_string(),
                    });
                    TaskOutcome::Finished
                }
                Ok(FetchStatus::Skipped) => {
                    skipped += 1;
                    reporter.emit(ProgressEvent::Skipped {
                        item: link.as_str().to_string(),
                    });
                    TaskOutcome::Skipped
                }
                Err(e) => {
                    failed += 1;
                    let reason = format!("{e:#}");
                    warn!(link = %link, %reason, "download failed");
                    reporter.emit(ProgressEvent::Error {
                        item: link.as_str().to_string(),
                        message: reason.clone(),
                    });
                    TaskOutcome::Failed { reason }
                }
            };
            tasks.push(DownloadTask {
                link: link.clone(),
                outcome,
            });
        }

        info!(finished, skipped, failed, "batch done");
        Ok(BatchResult {
            finished,
            skipped,
            failed,
            tasks,
        })
    }
}
