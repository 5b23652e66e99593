use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RunMode {
    /// Scroll the page and write the link store
    Collect,
    /// Download everything in the link store
    Download,
    /// Collect, then download
    All,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Engine {
    /// yt-dlp subprocess (site-aware, merges streams)
    Ytdlp,
    /// Ranged HTTP GET, for links that point straight at a file
    Direct,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReporterKind {
    /// Terminal progress bars
    Console,
    /// Structured log lines
    Log,
    /// No progress output
    Quiet,
}

#[derive(Parser, Debug)]
#[command(name = "scroll-dl")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// What to run
    #[arg(short, long, value_enum, default_value = "download")]
    pub mode: RunMode,

    /// Page to collect links from (collect/all modes)
    #[arg(short, long)]
    pub page: Option<String>,

    /// WebDriver endpoint to attach to
    #[arg(long, default_value = "http://localhost:9515")]
    pub webdriver_url: String,

    /// Seconds to wait after each scroll
    #[arg(long, default_value_t = config::DEFAULT_SCROLL_PAUSE_SECS)]
    pub scroll_pause: f64,

    /// Consecutive scrolls with no new links before stopping
    #[arg(long, default_value_t = config::DEFAULT_MAX_STAGNANT_ROUNDS)]
    pub max_stagnant_rounds: u32,

    /// Link store path
    #[arg(short, long, default_value = config::DEFAULT_LINKS_FILE)]
    pub links_file: PathBuf,

    /// Netscape cookie file for authenticated downloads
    #[arg(short, long, default_value = config::DEFAULT_COOKIES_FILE)]
    pub cookies: PathBuf,

    /// Fetch anonymously, without a cookie file
    #[arg(long)]
    pub anonymous: bool,

    /// Directory downloads land in
    #[arg(short, long, default_value = config::DEFAULT_TARGET_DIR)]
    pub output: PathBuf,

    /// Download engine
    #[arg(long, value_enum, default_value = "ytdlp")]
    pub engine: Engine,

    /// yt-dlp binary to invoke
    #[arg(long, default_value = "yt-dlp")]
    pub ytdlp_path: PathBuf,

    /// Progress output
    #[arg(long, value_enum, default_value = "console")]
    pub reporter: ReporterKind,

    /// Also append every progress event to this file as JSON lines
    #[arg(long)]
    pub event_log: Option<PathBuf>,
}
