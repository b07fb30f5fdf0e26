//! Per-connection session state.
//!
//! A [`Session`] tracks the requests of one client connection that are still
//! running, keyed by message id. Each request gets a child of the
//! connection's [`CancellationToken`], so cancelling the connection (client
//! gone, server shutting down) cancels every request on it, and an abandon
//! cancels exactly one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    connection: CancellationToken,
    in_flight: Mutex<HashMap<i32, Registration>>,
    next_ticket: AtomicU64,
}

/// One tracked request. The ticket tells apart two registrations that share a
/// message id.
#[derive(Debug, Clone)]
pub struct Registration {
    id: i32,
    ticket: u64,
    token: CancellationToken,
}

impl Registration {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Session {
    pub fn new(connection: CancellationToken) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                connection,
                in_flight: Mutex::new(HashMap::new()),
                next_ticket: AtomicU64::new(0),
            }),
        }
    }

    /// A session whose connection token is not tied to anything.
    pub fn detached() -> Self {
        Self::new(CancellationToken::new())
    }

    /// The connection-level token.
    pub fn token(&self) -> &CancellationToken {
        &self.inner.connection
    }

    /// Track request `id`. Reusing an id that is still in flight replaces the
    /// earlier registration.
    pub fn register(&self, id: i32) -> Registration {
        let registration = Registration {
            id,
            ticket: self.inner.next_ticket.fetch_add(1, Ordering::Relaxed),
            token: self.inner.connection.child_token(),
        };
        let mut in_flight = self.lock();
        if in_flight.insert(id, registration.clone()).is_some() {
            debug!(id, "message id reused while still in flight");
        }
        registration
    }

    /// Stop tracking `registration`. A later registration of the same id is
    /// left alone.
    pub fn finish(&self, registration: &Registration) {
        let mut in_flight = self.lock();
        if in_flight
            .get(&registration.id)
            .is_some_and(|current| current.ticket == registration.ticket)
        {
            in_flight.remove(&registration.id);
        }
    }

    /// Cancel request `id`. Returns false when nothing with that id is in
    /// flight, which is not an error: the request may already have finished.
    pub fn abandon(&self, id: i32) -> bool {
        match self.lock().remove(&id) {
            Some(registration) => {
                registration.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<i32, Registration>> {
        // A panic while holding the lock leaves the map itself intact.
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::detached()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
