//! Collects content links from an infinite-scroll page and bulk-downloads
//! the media behind them.
//!
//! The two core pieces are [`collector::ScrollCollector`], which drives a
//! [`driver::PageDriver`] until the page stops yielding new links, and
//! [`downloader::BatchDownloader`], which feeds the collected links through a
//! [`fetcher::MediaFetcher`] one at a time, isolating per-item failures.
//! Progress from both flows through [`progress::ProgressReporter`].

pub mod cli;
pub mod collector;
pub mod config;
pub mod console;
pub mod downloader;
pub mod driver;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod link;
pub mod progress;
pub mod store;
#[cfg(feature = "webdriver")]
pub mod webdriver;
pub mod ytdlp;

pub use error::{Error, Result};
pub use link::{Link, LinkSet};
