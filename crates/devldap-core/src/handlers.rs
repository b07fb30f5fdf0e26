//! Request handlers.
//!
//! Each handler takes one decoded request plus a [`Context`] and writes its
//! responses, in order, to a [`ResponseSink`]. Handlers are synchronous and do
//! no I/O. Cancellation is a poll of the request token, never a wait.

use crate::config::RootDseConfig;
use crate::directory::Directory;
use crate::entry::Entry;
use crate::filter::CompiledFilter;
use crate::projector::project;
use crate::selector::select_entries;
use crate::session::Session;
use crate::types::{
    Authentication, BindRequest, Control, ExtendedRequest, OpResult, OperationKind, Request,
    Response, ResponseSink, ResultCode, SearchEntry, SearchRequest, PAGED_RESULTS_OID,
    WHOAMI_OID,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const INVALID_CREDENTIALS: &str = "invalid credentials";
pub const UNSUPPORTED_AUTHENTICATION: &str = "Authentication choice not supported";
pub const DEFAULT_BIND_SUCCESS: &str = "Default binding behavior set to return Success";
pub const NOT_IMPLEMENTED: &str = "Operation not implemented by server";

/// Everything a handler may look at besides the request itself.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    /// Message id of the request being handled.
    pub id: i32,
    pub controls: &'a [Control],
    /// Snapshot taken when the request arrived.
    pub directory: &'a Directory,
    pub session: &'a Session,
    pub cancel: &'a CancellationToken,
}

// ---------------------------------------------------------------------------
// Bind
// ---------------------------------------------------------------------------

/// Simple bind against the `userPassword` of the entry named by the request.
///
/// Passwords are compared in cleartext. A multi-valued `userPassword` accepts
/// any of its values.
pub fn bind(ctx: &Context<'_>, req: &BindRequest, sink: &mut dyn ResponseSink) {
    let supplied = match &req.authentication {
        Authentication::Simple(password) => password,
        other => {
            warn!(id = ctx.id, name = %req.name, choice = other.choice(), "bind rejected: unsupported authentication");
            sink.write(Response::Bind(OpResult::new(
                ResultCode::UnwillingToPerform,
                UNSUPPORTED_AUTHENTICATION,
            )));
            return;
        }
    };

    let stored = ctx
        .directory
        .get(&req.name)
        .and_then(|entry| entry.get("userpassword"));
    let accepted = stored.is_some_and(|value| value.values().any(|p| p == supplied.as_str()));

    if accepted {
        info!(id = ctx.id, name = %req.name, "bind succeeded");
        sink.write(Response::Bind(OpResult::success()));
    } else {
        info!(id = ctx.id, name = %req.name, has_password = stored.is_some(), "bind failed");
        sink.write(Response::Bind(OpResult::new(
            ResultCode::InvalidCredentials,
            INVALID_CREDENTIALS,
        )));
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Generic search: suffix-select, filter, project.
///
/// The request token is polled before any work and between candidate
/// entries. A cancelled search stops where it is and writes no done status.
pub fn search(ctx: &Context<'_>, req: &SearchRequest, sink: &mut dyn ResponseSink) {
    if ctx.cancel.is_cancelled() {
        debug!(id = ctx.id, "search cancelled before start");
        return;
    }

    debug!(
        id = ctx.id,
        base = %req.base,
        scope = ?req.scope,
        filter = %req.filter,
        attributes = ?req.attributes,
        time_limit = req.time_limit,
        size_limit = req.size_limit,
        generation = ctx.directory.generation(),
        "search"
    );
    log_controls(ctx.id, ctx.controls);

    let filter = CompiledFilter::new(&req.filter);
    let mut returned = 0usize;
    for (dn, entry) in select_entries(ctx.directory, &req.base) {
        if ctx.cancel.is_cancelled() {
            debug!(id = ctx.id, returned, "search cancelled");
            return;
        }
        if !filter.matches(entry) {
            continue;
        }
        sink.write(Response::SearchEntry(SearchEntry {
            dn: dn.to_string(),
            attributes: project(entry, &req.attributes),
        }));
        returned += 1;
    }

    debug!(id = ctx.id, returned, "search done");
    sink.write(Response::SearchDone(OpResult::success()));
}

/// Answer a Root DSE query with what the server knows about itself.
pub fn root_dse(
    ctx: &Context<'_>,
    req: &SearchRequest,
    dse: &RootDseConfig,
    sink: &mut dyn ResponseSink,
) {
    if ctx.cancel.is_cancelled() {
        debug!(id = ctx.id, "root DSE query cancelled before start");
        return;
    }
    debug!(id = ctx.id, attributes = ?req.attributes, "root DSE query");

    sink.write(Response::SearchEntry(SearchEntry {
        dn: String::new(),
        attributes: project(&root_dse_entry(dse), &req.attributes),
    }));
    sink.write(Response::SearchDone(OpResult::success()));
}

fn root_dse_entry(dse: &RootDseConfig) -> Entry {
    let mut entry = Entry::new()
        .with("objectClass", vec!["top", "extensibleObject"])
        .with("vendorName", dse.vendor_name.as_str())
        .with("vendorVersion", dse.vendor_version.as_str())
        .with("supportedLDAPVersion", "3")
        .with("supportedExtension", WHOAMI_OID)
        .with("supportedControl", PAGED_RESULTS_OID);
    // An attribute with no values is not a valid partial attribute.
    if !dse.naming_contexts.is_empty() {
        entry.insert("namingContexts", dse.naming_contexts.clone());
    }
    entry
}

fn log_controls(id: i32, controls: &[Control]) {
    for control in controls {
        let oid = control.oid().unwrap_or("unknown");
        match control {
            Control::PagedResults { size, cookie } => {
                debug!(id, oid, size, cookie = ?cookie, "paged results control ignored");
            }
            Control::Other { description } => {
                debug!(id, oid, control = %description, "request control ignored");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Extended
// ---------------------------------------------------------------------------

pub fn extended(ctx: &Context<'_>, req: &ExtendedRequest, sink: &mut dyn ResponseSink) {
    debug!(
        id = ctx.id,
        name = %req.name,
        value_len = req.value.as_ref().map_or(0, Vec::len),
        "extended request"
    );
    sink.write(Response::Extended {
        result: OpResult::success(),
        name: None,
        value: None,
    });
}

/// "Who am I?" (RFC 4532). Always an empty identity.
pub fn whoami(ctx: &Context<'_>, _req: &ExtendedRequest, sink: &mut dyn ResponseSink) {
    debug!(id = ctx.id, "whoami");
    sink.write(Response::Extended {
        result: OpResult::success(),
        name: None,
        value: None,
    });
}

// ---------------------------------------------------------------------------
// Abandon / NotFound
// ---------------------------------------------------------------------------

/// Cancel the in-flight request `target`. Writes nothing.
pub fn abandon(ctx: &Context<'_>, target: i32) {
    if ctx.session.abandon(target) {
        debug!(id = ctx.id, target, "request abandoned");
    } else {
        debug!(id = ctx.id, target, "abandon for a request that is not in flight");
    }
}

/// Fallback for requests no route accepted.
///
/// Binds succeed; everything else is refused.
pub fn not_found(ctx: &Context<'_>, request: &Request, sink: &mut dyn ResponseSink) {
    match request.kind() {
        OperationKind::Bind => {
            debug!(id = ctx.id, "bind accepted by default route");
            sink.write(Response::Bind(OpResult::new(
                ResultCode::Success,
                DEFAULT_BIND_SUCCESS,
            )));
        }
        kind => {
            warn!(id = ctx.id, %kind, "operation not implemented");
            sink.write(Response::Result {
                kind,
                result: OpResult::new(ResultCode::UnwillingToPerform, NOT_IMPLEMENTED),
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
