//! Directory store: the whole JSON document as an immutable, typed tree.
//!
//! A [`Directory`] is never mutated after it is built. Reloading produces a
//! new one which is published through the [`DirectoryHandle`]; requests keep
//! the `Arc<Directory>` they started with, so a search observes exactly one
//! generation from start to finish.

use crate::entry::{AttributeValue, Entry};
use crate::error::StoreError;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;

/// DN → entry. Keys are compared byte-exact.
///
/// Iteration order is the key order of a `BTreeMap`; callers must not rely on
/// it beyond "stable within one generation".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    entries: BTreeMap<String, Entry>,
    generation: u64,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document of the form
    /// `{"<dn>": {"<attr>": "<value>" | ["<value>", ...]}}`.
    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        let raw: BTreeMap<String, serde_json::Map<String, serde_json::Value>> =
            serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    fn from_raw(
        raw: BTreeMap<String, serde_json::Map<String, serde_json::Value>>,
    ) -> Result<Self, StoreError> {
        let mut entries = BTreeMap::new();
        for (dn, attrs) in raw {
            let mut entry = Entry::new();
            for (name, value) in attrs {
                let value: AttributeValue = serde_json::from_value(value)?;
                if entry.insert(&name, value).is_some() {
                    return Err(StoreError::DuplicateAttribute { dn, attribute: name });
                }
            }
            entries.insert(dn, entry);
        }
        Ok(Self {
            entries,
            generation: 0,
        })
    }

    /// Exact-key lookup (used by bind, never by search).
    pub fn get(&self, dn: &str) -> Option<&Entry> {
        self.entries.get(dn)
    }

    pub fn insert(&mut self, dn: impl Into<String>, entry: Entry) -> Option<Entry> {
        self.entries.insert(dn.into(), entry)
    }

    /// Builder-style [`insert`](Self::insert), handy in tests and fixtures.
    pub fn with(mut self, dn: impl Into<String>, entry: Entry) -> Self {
        self.insert(dn, entry);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Generation number assigned when published; `0` for an unpublished tree.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

// ---------------------------------------------------------------------------
// DirectoryHandle
// ---------------------------------------------------------------------------

/// Process-wide handle to the current [`Directory`] generation.
///
/// Cloning the handle is cheap; every clone publishes into and reads from the
/// same channel. Publishing swaps the whole tree in one step.
#[derive(Debug, Clone)]
pub struct DirectoryHandle {
    tx: Arc<watch::Sender<Arc<Directory>>>,
}

impl DirectoryHandle {
    /// Create the handle and publish `initial` as generation 1.
    pub fn new(mut initial: Directory) -> Self {
        initial.generation = 1;
        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self { tx: Arc::new(tx) }
    }

    /// The generation current at the time of the call.
    pub fn snapshot(&self) -> Arc<Directory> {
        self.tx.borrow().clone()
    }

    /// Replace the current generation. Returns the new generation number.
    pub fn publish(&self, mut next: Directory) -> u64 {
        let mut generation = 0;
        self.tx.send_modify(|current| {
            generation = current.generation + 1;
            next.generation = generation;
            *current = Arc::new(std::mem::take(&mut next));
        });
        generation
    }

    /// Receiver that is notified whenever a new generation is published.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Directory>> {
        self.tx.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
