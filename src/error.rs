use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Run-fatal failures. Per-item fetch errors and unreadable page elements
/// are handled where they occur and never show up here.
#[derive(Debug, Error)]
pub enum Error {
    /// The page driver broke mid-collection. Collection cannot continue.
    #[error("page driver failed while {action}: {cause:#}")]
    Driver {
        action: &'static str,
        cause: anyhow::Error,
    },

    #[error("invalid collector settings: {0}")]
    Config(String),

    #[error("storage failure at {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cookie file not found: {}", .path.display())]
    CredentialsMissing { path: PathBuf },

    #[error("link store not found: {}", .path.display())]
    LinksMissing { path: PathBuf },
}
