use tracing::{debug, info};

use crate::config::CollectorSettings;
use crate::driver::PageDriver;
use crate::error::{Error, Result};
use crate::link::{Link, LinkSet};
use crate::progress::{ProgressEvent, ProgressReporter};

/// Snapshot of one scroll round.
#[derive(Debug, Clone, Copy)]
pub struct RoundStats {
    pub visible: usize,
    pub skipped_elements: usize,
    pub unique_total: usize,
    pub stagnant_rounds: u32,
}

/// Explores an infinite-scroll page until it stops yielding new links.
///
/// Each round queries the rendered link elements, folds their normalized
/// hrefs into a running set, then scrolls and waits. A round that grows the
/// set resets the stagnation counter; one that does not increments it. The
/// loop ends once `max_stagnant_rounds` consecutive rounds added nothing.
pub struct ScrollCollector {
    settings: CollectorSettings,
}

impl ScrollCollector {
    pub fn new(settings: CollectorSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    /// Runs the scroll loop and returns every unique link seen, sorted.
    ///
    /// Unreadable elements are skipped and counted; driver failures (query,
    /// scroll or wait) abort the run.
    pub async fn collect(
        &self,
        driver: &dyn PageDriver,
        reporter: &dyn ProgressReporter,
    ) -> Result<Vec<Link>> {
        let mut links = LinkSet::new();
        let mut stagnant_rounds = 0u32;
        let mut round = 0u64;

        while stagnant_rounds < self.settings.max_stagnant_rounds {
            round += 1;
            let elements = driver.query_link_elements().await.map_err(|cause| {
                Error::Driver {
                    action: "querying link elements",
                    cause,
                }
            })?;

            let visible = elements.len();
            let before = links.len();
            let mut skipped_elements = 0usize;

            for element in &elements {
                let href = match element.href().await {
                    Ok(href) => href,
                    Err(e) => {
                        // Stale handle after a re-render; drop it and move on
                        skipped_elements += 1;
                        debug!("unreadable link element: {e:#}");
                        continue;
                    }
                };
                match href.as_deref().and_then(Link::normalize) {
                    Some(link) => {
                        links.insert(link);
                    }
                    None => skipped_elements += 1,
                }
            }

            if links.len() == before {
                stagnant_rounds += 1;
            } else {
                stagnant_rounds = 0;
            }

            let stats = RoundStats {
                visible,
                skipped_elements,
                unique_total: links.len(),
                stagnant_rounds,
            };
            info!(
                round,
                visible = stats.visible,
                unique_total = stats.unique_total,
                stagnant_rounds = stats.stagnant_rounds,
                "scroll round"
            );
            reporter.emit(ProgressEvent::Round {
                visible: stats.visible,
                skipped_elements: stats.skipped_elements,
                unique_total: stats.unique_total,
                stagnant_rounds: stats.stagnant_rounds,
            });

            driver
                .scroll_to_bottom()
                .await
                .map_err(|cause| Error::Driver {
                    action: "scrolling",
                    cause,
                })?;
            driver
                .wait(self.settings.scroll_pause)
                .await
                .map_err(|cause| Error::Driver {
                    action: "waiting after scroll",
                    cause,
                })?;
        }

        info!(total = links.len(), rounds = round, "collection finished");
        Ok(links.into_sorted_vec())
    }
}
