use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Seconds to wait after each scroll for lazily loaded content to render.
pub const DEFAULT_SCROLL_PAUSE_SECS: f64 = 1.5;

/// Consecutive scrolls with no new links before collection stops. One quiet
/// round is not proof the page is exhausted; several in a row is.
pub const DEFAULT_MAX_STAGNANT_ROUNDS: u32 = 5;

/// Flat text file the collected links are written to, one per line.
pub const DEFAULT_LINKS_FILE: &str = "links.txt";

/// Netscape-format cookie export used for authenticated downloads.
pub const DEFAULT_COOKIES_FILE: &str = "cookies.txt";

/// Directory downloaded media lands in.
pub const DEFAULT_TARGET_DIR: &str = "videos";

/// Output file template. The upload-date prefix keeps the directory sorted
/// chronologically.
pub const DEFAULT_OUTPUT_TEMPLATE: &str = "%(upload_date)s_%(title)s.%(ext)s";

/// Container the final download is merged into.
pub const DEFAULT_MERGE_CONTAINER: &str = "mp4";

/// Preferred audio container when video and audio are fetched separately.
pub const DEFAULT_AUDIO_CONTAINER: &str = "m4a";

/// Tuning for the scroll loop.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectorSettings {
    pub scroll_pause: Duration,
    pub max_stagnant_rounds: u32,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            scroll_pause: Duration::from_secs_f64(DEFAULT_SCROLL_PAUSE_SECS),
            max_stagnant_rounds: DEFAULT_MAX_STAGNANT_ROUNDS,
        }
    }
}

impl CollectorSettings {
    pub fn new(scroll_pause: Duration, max_stagnant_rounds: u32) -> Result<Self> {
        let settings = Self {
            scroll_pause,
            max_stagnant_rounds,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scroll_pause.is_zero() {
            return Err(Error::Config(
                "scroll_pause must be greater than zero".to_string(),
            ));
        }
        if self.max_stagnant_rounds == 0 {
            return Err(Error::Config(
                "max_stagnant_rounds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
