use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

/// Handle to one rendered link element.
///
/// A handle can go stale when the page re-renders between the query and the
/// read; callers treat a failed `href` as skippable, not fatal.
#[async_trait]
pub trait LinkElement: Send + Sync {
    /// The element's href attribute, if it carries one.
    async fn href(&self) -> Result<Option<String>>;
}

/// A live, scrollable page holding content links.
///
/// This is the only surface the collector needs. Session lifecycle
/// (connecting, navigation, login, teardown) belongs to the implementation
/// and happens before and after a collection run.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Handles to every content-link element currently rendered.
    async fn query_link_elements(&self) -> Result<Vec<Box<dyn LinkElement>>>;

    /// Scrolls the viewport to the bottom of the page, triggering the next
    /// batch of lazily loaded content.
    async fn scroll_to_bottom(&self) -> Result<()>;

    /// Gives freshly triggered content time to render.
    async fn wait(&self, pause: Duration) -> Result<()>;
}
