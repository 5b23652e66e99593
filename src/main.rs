use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use scroll_dl::cli::{Args, Engine, ReporterKind, RunMode};
use scroll_dl::console::ConsoleReporter;
use scroll_dl::downloader::{BatchDownloader, BatchResult, TaskOutcome};
use scroll_dl::http::HttpFetcher;
use scroll_dl::progress::{FanoutReporter, JsonlReporter, LogReporter, ProgressReporter};
use scroll_dl::store::LinkStore;
use scroll_dl::ytdlp::YtDlpFetcher;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let reporter = build_reporter(&args)?;

    match args.mode {
        RunMode::Collect => {
            collect(&args, reporter.as_ref()).await?;
        }
        RunMode::Download => {
            download(&args, reporter.as_ref()).await?;
        }
        RunMode::All => {
            collect(&args, reporter.as_ref()).await?;
            download(&args, reporter.as_ref()).await?;
        }
    }

    Ok(())
}

fn build_reporter(args: &Args) -> Result<Box<dyn ProgressReporter>> {
    let mut fanout = FanoutReporter::new();
    match args.reporter {
        ReporterKind::Console => fanout.push(Box::new(ConsoleReporter::new())),
        ReporterKind::Log => fanout.push(Box::new(LogReporter)),
        ReporterKind::Quiet => {}
    }
    if let Some(path) = &args.event_log {
        fanout.push(Box::new(JsonlReporter::create(path)?));
    }
    Ok(Box::new(fanout))
}

#[cfg(feature = "webdriver")]
async fn collect(args: &Args, reporter: &dyn ProgressReporter) -> Result<()> {
    use std::time::Duration;

    use anyhow::{Context, anyhow};
    use scroll_dl::LinkSet;
    use scroll_dl::collector::ScrollCollector;
    use scroll_dl::config::CollectorSettings;
    use scroll_dl::webdriver::WebDriverPage;

    let page = args
        .page
        .as_deref()
        .context("--page is required for collect mode")?;
    let pause = Duration::try_from_secs_f64(args.scroll_pause)
        .map_err(|_| anyhow!("invalid --scroll-pause value: {}", args.scroll_pause))?;
    let settings = CollectorSettings::new(pause, args.max_stagnant_rounds)?;
    let collector = ScrollCollector::new(settings)?;

    let driver = WebDriverPage::connect(&args.webdriver_url, page).await?;
    let collected = collector.collect(&driver, reporter).await;
    if let Err(e) = driver.close().await {
        tracing::warn!("webdriver close failed: {e:#}");
    }

    let links: LinkSet = collected?.into_iter().collect();
    let store = LinkStore::new(&args.links_file);
    store.save(&links)?;
    println!(
        "Collected {} links into {}",
        links.len(),
        args.links_file.display()
    );
    Ok(())
}

#[cfg(not(feature = "webdriver"))]
async fn collect(_args: &Args, _reporter: &dyn ProgressReporter) -> Result<()> {
    anyhow::bail!("collect mode requires a build with the webdriver feature")
}

async fn download(args: &Args, reporter: &dyn ProgressReporter) -> Result<()> {
    let store = LinkStore::new(&args.links_file);
    let links = store.load()?;
    if links.is_empty() {
        println!(
            "No links in {}. Nothing to download.",
            args.links_file.display()
        );
        return Ok(());
    }

    let cookies = if args.anonymous {
        None
    } else {
        Some(args.cookies.as_path())
    };

    let result = match args.engine {
        Engine::Ytdlp => {
            let downloader = BatchDownloader::new(YtDlpFetcher::with_program(&args.ytdlp_path));
            downloader
                .run(&links, &args.output, cookies, reporter)
                .await?
        }
        Engine::Direct => {
            let downloader = BatchDownloader::new(HttpFetcher::new()?);
            downloader
                .run(&links, &args.output, cookies, reporter)
                .await?
        }
    };

    print_summary(&result);
    Ok(())
}

fn print_summary(result: &BatchResult) {
    println!(
        "\nDone: {} finished, {} skipped, {} failed",
        result.finished, result.skipped, result.failed
    );
    for task in &result.tasks {
        if let TaskOutcome::Failed { reason } = &task.outcome {
            eprintln!("  failed: {} ({reason})", task.link);
        }
    }
}
