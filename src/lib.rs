//! devldap: a development LDAP server backed by a JSON document.
//!
//! Bind and search are answered from an in-memory copy of the document;
//! everything else is refused or acknowledged without effect. Not for
//! production: passwords are stored and compared in cleartext.
//!
//! # Architecture
//!
//! ```text
//! data.json ──► devldap-data ──► DirectoryHandle ──┐
//!                  (watch)                          ▼
//! client ◄──► devldap-server ◄──► Router ──► Handlers (devldap-core)
//! ```
//!
//! The crate re-exports the three workspace members so that integration tests
//! and the `query` subcommand can drive handlers without a socket.

pub mod query;

pub use devldap_core as core;
pub use devldap_data as data;
pub use devldap_server as server;
