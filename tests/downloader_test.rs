use std::fs;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use scroll_dl::downloader::{BatchDownloader, TaskOutcome};
use scroll_dl::fetcher::{FetchRequest, FetchStatus, MediaFetcher};
use scroll_dl::progress::{NullReporter, ProgressEvent, ProgressReporter};
use scroll_dl::{Error, Link};

/// Fetcher that resolves each link from a script instead of the network.
#[derive(Default)]
struct FakeFetcher {
    fail_on: Vec<&'static str>,
    skip_on: Vec<&'static str>,
    calls: Arc<Mutex<Vec<String>>>,
    requests: Arc<Mutex<Vec<FetchRequest>>>,
}

impl FakeFetcher {
    fn failing_on(mut self, link: &'static str) -> Self {
        self.fail_on.push(link);
        self
    }

    fn skipping_on(mut self, link: &'static str) -> Self {
        self.skip_on.push(link);
        self
    }
}

#[async_trait]
impl MediaFetcher for FakeFetcher {
    async fn fetch(
        &self,
        link: &str,
        request: &FetchRequest,
        reporter: &dyn ProgressReporter,
    ) -> Result<FetchStatus> {
        self.calls.lock().unwrap().push(link.to_string());
        self.requests.lock().unwrap().push(request.clone());
        reporter.emit(ProgressEvent::Downloading {
            item: link.to_string(),
            percent: 50.0,
            rate_bytes_per_sec: None,
            eta_seconds: None,
        });
        if self.fail_on.iter().any(|l| *l == link) {
            return Err(anyhow!("extractor says no"));
        }
        if self.skip_on.iter().any(|l| *l == link) {
            return Ok(FetchStatus::Skipped);
        }
        Ok(FetchStatus::Finished)
    }
}

#[derive(Default)]
struct CapturingReporter {
    events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressReporter for CapturingReporter {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn link(raw: &str) -> Link {
    Link::normalize(raw).unwrap()
}

#[tokio::test]
async fn one_failure_does_not_stop_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let links = [
        link("/p/a"),
        link("/p/b"),
        link("/p/c"),
        link("/p/d"),
        link("/p/e"),
    ];
    let fetcher = FakeFetcher::default().failing_on("/p/c");
    let downloader = BatchDownloader::new(fetcher);

    let result = downloader
        .run(&links, dir.path(), None, &NullReporter)
        .await
        .unwrap();

    assert_eq!(result.finished, 4);
    assert_eq!(result.skipped, 0);
    assert_eq!(result.failed, 1);
    assert_eq!(result.attempted(), 5);
    assert_eq!(
        result.tasks[2].outcome,
        TaskOutcome::Failed {
            reason: "extractor says no".into()
        }
    );
    assert_eq!(result.tasks[3].outcome, TaskOutcome::Finished);
}

#[tokio::test]
async fn links_are_fetched_in_input_order() {
    let dir = tempfile::tempdir().unwrap();
    // Deliberately unsorted; the batch must not reorder its input.
    let links = [link("/p/b"), link("/p/a"), link("/p/c")];
    let fetcher = FakeFetcher::default();
    let calls = fetcher.calls.clone();
    let downloader = BatchDownloader::new(fetcher);

    downloader
        .run(&links, dir.path(), None, &NullReporter)
        .await
        .unwrap();

    assert_eq!(*calls.lock().unwrap(), ["/p/b", "/p/a", "/p/c"]);
}

#[tokio::test]
async fn missing_cookie_file_fails_before_any_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let cookies = dir.path().join("absent.txt");
    let target = dir.path().join("videos");
    let fetcher = FakeFetcher::default();
    let calls = fetcher.calls.clone();
    let downloader = BatchDownloader::new(fetcher);

    let err = downloader
        .run(&[link("/p/a")], &target, Some(&cookies), &NullReporter)
        .await
        .unwrap_err();

    match err {
        Error::CredentialsMissing { path } => assert_eq!(path, cookies),
        other => panic!("unexpected error: {other}"),
    }
    assert!(calls.lock().unwrap().is_empty());
    assert!(!target.exists());
}

#[tokio::test]
async fn cookie_file_is_threaded_through_to_the_fetcher() {
    let dir = tempfile::tempdir().unwrap();
    let cookies = dir.path().join("cookies.txt");
    fs::write(&cookies, "# Netscape HTTP Cookie File\n").unwrap();
    let fetcher = FakeFetcher::default();
    let requests = fetcher.requests.clone();
    let downloader = BatchDownloader::new(fetcher);

    downloader
        .run(&[link("/p/a")], dir.path(), Some(&cookies), &NullReporter)
        .await
        .unwrap();

    let requests = requests.lock().unwrap();
    assert_eq!(requests[0].cookies.as_deref(), Some(cookies.as_path()));
    assert_eq!(requests[0].target_dir, dir.path());
}

#[tokio::test]
async fn empty_batch_still_creates_the_target_directory() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("a").join("b").join("videos");
    let downloader = BatchDownloader::new(FakeFetcher::default());

    let result = downloader
        .run(&[], &target, None, &NullReporter)
        .await
        .unwrap();

    assert_eq!(result.attempted(), 0);
    assert_eq!((result.finished, result.skipped, result.failed), (0, 0, 0));
    assert!(target.is_dir());
}

#[tokio::test]
async fn already_present_items_count_as_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let links = [link("/p/a"), link("/p/b")];
    let fetcher = FakeFetcher::default().skipping_on("/p/a");
    let downloader = BatchDownloader::new(fetcher);

    let result = downloader
        .run(&links, dir.path(), None, &NullReporter)
        .await
        .unwrap();

    assert_eq!(result.finished, 1);
    assert_eq!(result.skipped, 1);
    assert_eq!(result.tasks[0].outcome, TaskOutcome::Skipped);
}

#[tokio::test]
async fn every_item_gets_a_terminal_event() {
    let dir = tempfile::tempdir().unwrap();
    let links = [link("/p/a"), link("/p/b"), link("/p/c")];
    let fetcher = FakeFetcher::default()
        .skipping_on("/p/b")
        .failing_on("/p/c");
    let downloader = BatchDownloader::new(fetcher);
    let reporter = CapturingReporter::default();

    downloader
        .run(&links, dir.path(), None, &reporter)
        .await
        .unwrap();

    let events = reporter.events.lock().unwrap();
    let terminal: Vec<String> = events
        .iter()
        .filter_map(|event| match event {
            ProgressEvent::Finished { item } => Some(format!("finished {item}")),
            ProgressEvent::Skipped { item } => Some(format!("skipped {item}")),
            ProgressEvent::Error { item, message } => {
                assert!(!message.is_empty());
                Some(format!("error {item}"))
            }
            _ => None,
        })
        .collect();
    assert_eq!(terminal, ["finished /p/a", "skipped /p/b", "error /p/c"]);
}

#[tokio::test]
async fn uncreatable_target_directory_is_a_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();
    let downloader = BatchDownloader::new(FakeFetcher::default());

    let err = downloader
        .run(&[link("/p/a")], &blocker.join("videos"), None, &NullReporter)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Storage { .. }));
}
