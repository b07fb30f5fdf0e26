//! Request router.
//!
//! An ordered table of [`Route`]s. The first route whose operation kind and
//! matchers all accept a request handles it; a request no route accepts goes
//! to [`handlers::not_found`]. Abandon and unbind are connection-level and
//! never reach the table.
//!
//! # Default table
//!
//! ```text
//! bind          Bind
//! whoami        Extended  name = 1.3.6.1.4.1.4203.1.11.3
//! extended      Extended
//! root-dse      Search    base = "", scope = base, filter = (objectClass=*)
//! search        Search
//! ```

use crate::config::{Config, RootDseConfig};
use crate::filter::Filter;
use crate::handlers::{self, Context};
use crate::types::{OperationKind, Request, ResponseSink, SearchScope, WHOAMI_OID};
use tracing::debug;

/// Which handler a route runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Bind,
    WhoAmI,
    Extended,
    RootDse,
    Search,
}

/// One extra condition a route puts on a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Search base DN, compared exactly.
    BaseDn(String),
    Scope(SearchScope),
    /// Search filter is a presence test on this attribute (any case).
    Present(String),
    /// Extended request name, compared exactly.
    ExtendedName(String),
}

impl Matcher {
    fn accepts(&self, request: &Request) -> bool {
        match (self, request) {
            (Matcher::BaseDn(base), Request::Search(req)) => req.base == *base,
            (Matcher::Scope(scope), Request::Search(req)) => req.scope == *scope,
            (Matcher::Present(attribute), Request::Search(req)) => {
                matches!(&req.filter, Filter::Present(a) if a.eq_ignore_ascii_case(attribute))
            }
            (Matcher::ExtendedName(name), Request::Extended(req)) => req.name == *name,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Route {
    pub label: &'static str,
    pub kind: OperationKind,
    pub matchers: Vec<Matcher>,
    pub handler: Handler,
}

impl Route {
    pub fn new(label: &'static str, kind: OperationKind, handler: Handler) -> Self {
        Self {
            label,
            kind,
            matchers: Vec::new(),
            handler,
        }
    }

    pub fn when(mut self, matcher: Matcher) -> Self {
        self.matchers.push(matcher);
        self
    }

    fn accepts(&self, request: &Request) -> bool {
        request.kind() == self.kind && self.matchers.iter().all(|m| m.accepts(request))
    }
}

#[derive(Debug, Clone)]
pub struct Router {
    routes: Vec<Route>,
    root_dse: RootDseConfig,
}

impl Router {
    /// A router with no routes: everything goes to the default route.
    pub fn new(root_dse: RootDseConfig) -> Self {
        Self {
            routes: Vec::new(),
            root_dse,
        }
    }

    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// The default table. Without `server.authenticate` there is no bind
    /// route and every bind is accepted by the default route.
    pub fn standard(config: &Config) -> Self {
        let mut router = Self::new(config.root_dse.clone());
        if config.server.authenticate {
            router = router.route(Route::new("bind", OperationKind::Bind, Handler::Bind));
        }
        router
            .route(
                Route::new("whoami", OperationKind::Extended, Handler::WhoAmI)
                    .when(Matcher::ExtendedName(WHOAMI_OID.to_string())),
            )
            .route(Route::new("extended", OperationKind::Extended, Handler::Extended))
            .route(
                Route::new("root-dse", OperationKind::Search, Handler::RootDse)
                    .when(Matcher::BaseDn(String::new()))
                    .when(Matcher::Scope(SearchScope::BaseObject))
                    .when(Matcher::Present("objectClass".to_string())),
            )
            .route(Route::new("search", OperationKind::Search, Handler::Search))
    }

    /// The first route accepting `request`, `None` for the default route.
    pub fn resolve(&self, request: &Request) -> Option<&Route> {
        self.routes.iter().find(|route| route.accepts(request))
    }

    /// Handle one request, writing its responses to `sink`.
    pub fn dispatch(&self, ctx: &Context<'_>, request: &Request, sink: &mut dyn ResponseSink) {
        match request {
            Request::Abandon(target) => return handlers::abandon(ctx, *target),
            Request::Unbind => {
                debug!(id = ctx.id, "unbind");
                return;
            }
            _ => {}
        }

        let Some(route) = self.resolve(request) else {
            return handlers::not_found(ctx, request, sink);
        };
        debug!(id = ctx.id, route = route.label, "routed");

        match (route.handler, request) {
            (Handler::Bind, Request::Bind(req)) => handlers::bind(ctx, req, sink),
            (Handler::WhoAmI, Request::Extended(req)) => handlers::whoami(ctx, req, sink),
            (Handler::Extended, Request::Extended(req)) => handlers::extended(ctx, req, sink),
            (Handler::RootDse, Request::Search(req)) => {
                handlers::root_dse(ctx, req, &self.root_dse, sink)
            }
            (Handler::Search, Request::Search(req)) => handlers::search(ctx, req, sink),
            _ => handlers::not_found(ctx, request, sink),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
