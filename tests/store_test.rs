use std::fs;

use scroll_dl::store::LinkStore;
use scroll_dl::{Error, Link, LinkSet};

fn set(raw: &[&str]) -> LinkSet {
    raw.iter().filter_map(|r| Link::normalize(r)).collect()
}

#[test]
fn round_trip_is_sorted_and_deduplicated() {
    let dir = tempfile::tempdir().unwrap();
    let store = LinkStore::new(dir.path().join("links.txt"));

    store
        .save(&set(&["/p/c", "/p/a?igshid=1", "/p/b", "/p/a/"]))
        .unwrap();
    let links = store.load().unwrap();

    let raw: Vec<&str> = links.iter().map(Link::as_str).collect();
    assert_eq!(raw, ["/p/a", "/p/b", "/p/c"]);

    let content = fs::read_to_string(store.path()).unwrap();
    assert_eq!(content, "/p/a\n/p/b\n/p/c\n");
}

#[test]
fn save_replaces_previous_contents() {
    let dir = tempfile::tempdir().unwrap();
    let store = LinkStore::new(dir.path().join("links.txt"));

    store.save(&set(&["/p/a", "/p/b", "/p/c"])).unwrap();
    store.save(&set(&["/p/z"])).unwrap();

    let links = store.load().unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].as_str(), "/p/z");
    // The staging file must not survive a successful save.
    assert!(!dir.path().join("links.txt.part").exists());
}

#[test]
fn save_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let store = LinkStore::new(dir.path().join("state").join("links.txt"));

    store.save(&set(&["/p/a"])).unwrap();

    assert!(store.path().is_file());
}

#[test]
fn loading_a_missing_store_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("links.txt");
    let store = LinkStore::new(&path);

    match store.load().unwrap_err() {
        Error::LinksMissing { path: reported } => assert_eq!(reported, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn an_empty_store_loads_as_no_links() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("links.txt");
    fs::write(&path, "").unwrap();

    let links = LinkStore::new(&path).load().unwrap();
    assert!(links.is_empty());
}

#[test]
fn load_drops_blank_lines_and_renormalizes_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("links.txt");
    // A hand-edited store: blank lines, stray whitespace, an unstripped query.
    fs::write(&path, "/p/a\n\n   \n/p/b?utm_source=x\n/p/c/\n").unwrap();

    let links = LinkStore::new(&path).load().unwrap();
    let raw: Vec<&str> = links.iter().map(Link::as_str).collect();
    assert_eq!(raw, ["/p/a", "/p/b", "/p/c"]);
}
