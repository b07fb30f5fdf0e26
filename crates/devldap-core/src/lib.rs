//! devldap-core: directory model and request handling for devldap.
//!
//! This crate owns everything between an already-decoded LDAP request and the
//! responses written back for it. Nothing here performs I/O; the wire codec
//! lives in `devldap-server` and file loading in `devldap-data`.
//!
//! # Architecture
//!
//! ```text
//! Request ──► Router ──► Handler ──► Selector ──► Filter ──► Projector
//!                           │                                   │
//!                           └──────────── ResponseSink ◄────────┘
//! ```
//!
//! Handlers read one [`Directory`] snapshot per request, obtained from the
//! [`DirectoryHandle`] that the reload path publishes new generations into.

pub mod config;
pub mod directory;
pub mod entry;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod projector;
pub mod router;
pub mod selector;
pub mod session;
pub mod types;

pub use config::Config;
pub use directory::{Directory, DirectoryHandle};
pub use entry::{AttributeValue, Entry};
pub use error::{FilterParseError, StoreError};
pub use filter::{Filter, SubstringFragment};
pub use handlers::Context;
pub use router::Router;
pub use session::{Registration, Session};
pub use types::{
    Authentication, BindRequest, Control, ExtendedRequest, Message, OperationKind,
    PartialAttribute, Request, Response, ResponseSink, ResultCode, SearchEntry, SearchRequest,
    SearchScope,
};
