//! Reading the JSON directory document from disk.

use devldap_core::{Directory, StoreError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid directory document {}: {source}", path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: StoreError,
    },
}

impl LoadError {
    pub fn path(&self) -> &Path {
        match self {
            LoadError::Io { path, .. } | LoadError::Store { path, .. } => path,
        }
    }
}

/// Read and parse the document at `path`.
pub fn load_file(path: &Path) -> Result<Directory, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(path, &text)
}

/// [`load_file`] without blocking the runtime thread on the read.
pub async fn load_file_async(path: &Path) -> Result<Directory, LoadError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse(path, &text)
}

fn parse(path: &Path, text: &str) -> Result<Directory, LoadError> {
    let directory = Directory::from_json_str(text).map_err(|source| LoadError::Store {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), entries = directory.len(), "directory document parsed");
    Ok(directory)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
