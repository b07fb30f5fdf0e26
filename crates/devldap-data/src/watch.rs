//! Hot reload of the directory document.
//!
//! The watcher observes the document's *parent directory* rather than the
//! file, so editors that save by writing a temporary file and renaming it
//! over the original are still seen. Bursts of events are debounced into one
//! reload. A reload that fails to read or parse keeps the current generation.
//!
//! ```text
//! notify thread ──► mpsc ──► debounce ──► load_file_async ──► DirectoryHandle::publish
//! ```

use crate::loader::{load_file_async, LoadError};
use devldap_core::DirectoryHandle;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("{} has no file name to watch", path.display())]
    NoFileName { path: PathBuf },

    #[error("failed to watch {}: {source}", path.display())]
    Notify {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Re-read `path` and publish it. On failure the handle is left untouched.
pub async fn reload(path: &Path, handle: &DirectoryHandle) -> Result<u64, LoadError> {
    match load_file_async(path).await {
        Ok(directory) => {
            let entries = directory.len();
            let generation = handle.publish(directory);
            info!(path = %path.display(), entries, generation, "directory reloaded");
            Ok(generation)
        }
        Err(e) => {
            warn!(
                error = %e,
                generation = handle.snapshot().generation(),
                "reload failed; keeping the current directory"
            );
            Err(e)
        }
    }
}

/// Start watching `path`. The returned task runs until `cancel` fires.
pub fn spawn_watcher(
    path: PathBuf,
    handle: DirectoryHandle,
    debounce: Duration,
    cancel: CancellationToken,
) -> Result<JoinHandle<()>, WatchError> {
    let file_name = path
        .file_name()
        .map(OsString::from)
        .ok_or_else(|| WatchError::NoFileName { path: path.clone() })?;
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        // The receiver is gone once the task stops; nothing left to notify.
        let _ = tx.send(res);
    })
    .map_err(|source| WatchError::Notify {
        path: parent.clone(),
        source,
    })?;
    watcher
        .watch(&parent, RecursiveMode::NonRecursive)
        .map_err(|source| WatchError::Notify {
            path: parent.clone(),
            source,
        })?;

    info!(path = %path.display(), debounce_ms = debounce.as_millis() as u64, "watching directory document");
    Ok(tokio::spawn(watch_loop(
        watcher, rx, path, file_name, handle, debounce, cancel,
    )))
}

async fn watch_loop(
    // Dropping the watcher stops the notify thread.
    _watcher: RecommendedWatcher,
    mut rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    path: PathBuf,
    file_name: OsString,
    handle: DirectoryHandle,
    debounce: Duration,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        match event {
            Ok(event) if concerns(&event, &file_name) => {
                debug!(kind = ?event.kind, "directory document changed");
                if !settle(&mut rx, debounce, &cancel).await {
                    break;
                }
                let _ = reload(&path, &handle).await;
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "file watcher error"),
        }
    }
    debug!(path = %path.display(), "directory watcher stopped");
}

/// Swallow events until `debounce` passes quietly. Returns false when the
/// watcher should stop instead.
async fn settle(
    rx: &mut mpsc::UnboundedReceiver<notify::Result<Event>>,
    debounce: Duration,
    cancel: &CancellationToken,
) -> bool {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return false,
            _ = tokio::time::sleep(debounce) => return true,
            more = rx.recv() => {
                if more.is_none() {
                    return false;
                }
            }
        }
    }
}

fn concerns(event: &Event, file_name: &OsString) -> bool {
    let relevant_kind = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
    );
    relevant_kind
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
