use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::progress::ProgressReporter;

/// Terminal outcome of a single fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    /// Media written to the target directory.
    Finished,
    /// Already present on disk from an earlier run; nothing was fetched.
    Skipped,
}

/// Quality fallback order for a fetch: best separate video+audio pair in the
/// preferred containers, then the best single file in the merge container,
/// then whatever the site offers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatSelection {
    pub video_container: String,
    pub audio_container: String,
    pub merge_container: String,
}

impl Default for FormatSelection {
    fn default() -> Self {
        Self {
            video_container: config::DEFAULT_MERGE_CONTAINER.to_string(),
            audio_container: config::DEFAULT_AUDIO_CONTAINER.to_string(),
            merge_container: config::DEFAULT_MERGE_CONTAINER.to_string(),
        }
    }
}

impl FormatSelection {
    /// Renders the policy as a yt-dlp format string.
    pub fn chain(&self) -> String {
        format!(
            "bestvideo[ext={v}]+bestaudio[ext={a}]/best[ext={m}]/best",
            v = self.video_container,
            a = self.audio_container,
            m = self.merge_container
        )
    }
}

/// Everything a fetcher needs besides the link itself.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Directory the media lands in. Exists by the time `fetch` runs.
    pub target_dir: PathBuf,
    /// Output file template, `%(upload_date)s_%(title)s.%(ext)s` style.
    pub output_template: String,
    /// Netscape cookie file for authenticated fetches.
    pub cookies: Option<PathBuf>,
    pub format: FormatSelection,
}

impl FetchRequest {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            output_template: config::DEFAULT_OUTPUT_TEMPLATE.to_string(),
            cookies: None,
            format: FormatSelection::default(),
        }
    }

    pub fn with_cookies(mut self, cookies: Option<PathBuf>) -> Self {
        self.cookies = cookies;
        self
    }
}

/// Downloads one media item.
///
/// An `Err` marks that item failed; the batch moves on to the next link
/// either way. Implementations detect their own earlier output on disk and
/// return [`FetchStatus::Skipped`] instead of refetching.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(
        &self,
        link: &str,
        request: &FetchRequest,
        reporter: &dyn ProgressReporter,
    ) -> Result<FetchStatus>;
}
