//! devldap-data: the JSON directory document on disk.
//!
//! [`load_file`] parses the document once at startup. [`spawn_watcher`] keeps
//! a [`DirectoryHandle`](devldap_core::DirectoryHandle) in step with the file
//! afterwards, publishing a new generation for every successful reload.

pub mod loader;
pub mod watch;

pub use loader::{load_file, load_file_async, LoadError};
pub use watch::{reload, spawn_watcher, WatchError};
