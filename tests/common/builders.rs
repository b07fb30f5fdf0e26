//! Test builders: a router harness and request constructors.
//!
//! These are for readability in tests, not for production use. They panic on
//! invalid input rather than returning `Result`.

use devldap_core::{
    BindRequest, Config, Context, Directory, DirectoryHandle, ExtendedRequest, Filter, Message,
    Request, Response, Router, SearchRequest, SearchScope, Session,
};
use tokio_util::sync::CancellationToken;

/// Parse a directory document, panicking on malformed fixtures.
pub fn directory(json: &str) -> Directory {
    Directory::from_json_str(json).expect("fixture must be a valid directory document")
}

/// A router over a published directory, driven without a socket.
pub struct Harness {
    pub handle: DirectoryHandle,
    pub router: Router,
    pub session: Session,
}

impl Harness {
    pub fn new(json: &str) -> Self {
        Self::with_config(json, &Config::defaults())
    }

    pub fn with_config(json: &str, config: &Config) -> Self {
        Self {
            handle: DirectoryHandle::new(directory(json)),
            router: Router::standard(config),
            session: Session::detached(),
        }
    }

    /// Dispatch `message` with a fresh request token.
    pub fn run(&self, message: Message) -> Vec<Response> {
        self.run_with(message, &CancellationToken::new())
    }

    /// Dispatch `message` under an existing request token.
    pub fn run_with(&self, message: Message, cancel: &CancellationToken) -> Vec<Response> {
        let snapshot = self.handle.snapshot();
        let ctx = Context {
            id: message.id,
            controls: &message.controls,
            directory: &snapshot,
            session: &self.session,
            cancel,
        };
        let mut out = Vec::new();
        self.router.dispatch(&ctx, &message.request, &mut out);
        out
    }
}

pub fn bind(name: &str, password: &str) -> Message {
    Message::new(1, Request::Bind(BindRequest::simple(name, password)))
}

/// Whole-subtree search with an RFC 4515 filter.
pub fn search(base: &str, filter: &str, attributes: &[&str]) -> Message {
    let filter = Filter::parse(filter).expect("fixture filter must parse");
    Message::new(
        2,
        Request::Search(SearchRequest::new(base, filter).attributes(attributes.iter().copied())),
    )
}

pub fn root_dse(attributes: &[&str]) -> Message {
    Message::new(
        3,
        Request::Search(
            SearchRequest::new("", Filter::present("objectClass"))
                .scope(SearchScope::BaseObject)
                .attributes(attributes.iter().copied()),
        ),
    )
}

pub fn extended(name: &str) -> Message {
    Message::new(
        4,
        Request::Extended(ExtendedRequest {
            name: name.to_string(),
            value: None,
        }),
    )
}
