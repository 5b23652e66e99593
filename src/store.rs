use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::link::{Link, LinkSet};

/// Flat text store for collected links: one normalized link per line, UTF-8,
/// sorted, no header.
pub struct LinkStore {
    path: PathBuf,
}

impl LinkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the store wholesale. The links are written to a sibling
    /// `.part` file and renamed over the store path, so a concurrent reader
    /// sees either the old contents or the new, never a torn file.
    pub fn save(&self, links: &LinkSet) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| Error::Storage {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let partial = PathBuf::from(format!("{}.part", self.path.display()));
        let mut file = fs::File::create(&partial).map_err(|source| Error::Storage {
            path: partial.clone(),
            source,
        })?;
        for link in links.iter() {
            writeln!(file, "{link}").map_err(|source| Error::Storage {
                path: partial.clone(),
                source,
            })?;
        }
        fs::rename(&partial, &self.path).map_err(|source| Error::Storage {
            path: self.path.clone(),
            source,
        })?;

        info!(count = links.len(), path = %self.path.display(), "saved link store");
        Ok(())
    }

    /// Loads the stored links in file order, dropping blank lines and
    /// re-normalizing entries (a no-op for anything this store wrote).
    ///
    /// A missing store is an error; an existing but empty store is an empty
    /// list, which callers treat as "nothing to do".
    pub fn load(&self) -> Result<Vec<Link>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::LinksMissing {
                    path: self.path.clone(),
                });
            }
            Err(source) => {
                return Err(Error::Storage {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let links: Vec<Link> = content.lines().filter_map(Link::normalize).collect();
        debug!(count = links.len(), path = %self.path.display(), "loaded link store");
        Ok(links)
    }
}
