use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A normalized content URL.
///
/// Normalization strips the query string and any trailing slash and trims
/// surrounding whitespace, so `/p/a`, `/p/a/` and `/p/a?igshid=123` all map
/// to the same key. The transform is purely lexical and works on relative
/// paths as well as absolute URLs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Link(String);

impl Link {
    /// Returns the normalized form of `raw`, or `None` if nothing is left
    /// after stripping. Normalizing an already-normalized link is a no-op.
    pub fn normalize(raw: &str) -> Option<Link> {
        let trimmed = raw.trim();
        let without_query = trimmed.split('?').next().unwrap_or("");
        let cleaned = without_query.trim_end_matches('/');
        if cleaned.is_empty() {
            return None;
        }
        Some(Link(cleaned.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deduplicated set of links, iterated in sorted order.
#[derive(Debug, Clone, Default)]
pub struct LinkSet {
    links: BTreeSet<Link>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the link was not already present.
    pub fn insert(&mut self, link: Link) -> bool {
        self.links.insert(link)
    }

    pub fn contains(&self, link: &Link) -> bool {
        self.links.contains(link)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    pub fn into_sorted_vec(self) -> Vec<Link> {
        self.links.into_iter().collect()
    }
}

impl FromIterator<Link> for LinkSet {
    fn from_iter<I: IntoIterator<Item = Link>>(iter: I) -> Self {
        Self {
            links: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for LinkSet {
    type Item = Link;
    type IntoIter = std::collections::btree_set::IntoIter<Link>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_query_and_trailing_slash() {
        assert_eq!(Link::normalize("/p/a?igshid=123").unwrap().as_str(), "/p/a");
        assert_eq!(Link::normalize("/p/a/").unwrap().as_str(), "/p/a");
        assert_eq!(
            Link::normalize("https://example.com/reel/xyz/?utm=1")
                .unwrap()
                .as_str(),
            "https://example.com/reel/xyz"
        );
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(Link::normalize("  /p/a \n").unwrap().as_str(), "/p/a");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = Link::normalize("/p/a/?x=1").unwrap();
        let twice = Link::normalize(once.as_str()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_after_stripping_is_none() {
        assert!(Link::normalize("").is_none());
        assert!(Link::normalize("   ").is_none());
        assert!(Link::normalize("?x=1").is_none());
        assert!(Link::normalize("/").is_none());
    }

    #[test]
    fn set_deduplicates_variants() {
        let mut set = LinkSet::new();
        assert!(set.insert(Link::normalize("/p/a").unwrap()));
        assert!(!set.insert(Link::normalize("/p/a/").unwrap()));
        assert!(!set.insert(Link::normalize("/p/a?utm=2").unwrap()));
        assert!(set.insert(Link::normalize("/p/b").unwrap()));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn iteration_is_sorted() {
        let set: LinkSet = ["/p/c", "/p/a", "/p/b"]
            .iter()
            .filter_map(|raw| Link::normalize(raw))
            .collect();
        let order: Vec<&str> = set.iter().map(Link::as_str).collect();
        assert_eq!(order, ["/p/a", "/p/b", "/p/c"]);
    }
}
