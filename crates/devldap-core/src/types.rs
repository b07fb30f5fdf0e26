//! Core types for devldap-core: the decoded request and response model.
//!
//! The wire codec turns BER messages into [`Message`] values and turns
//! [`Response`] values back into BER. Handlers only ever see these types.

use crate::filter::Filter;

/// OID of the "Who am I?" extended operation (RFC 4532).
pub const WHOAMI_OID: &str = "1.3.6.1.4.1.4203.1.11.3";

/// OID of the simple paged results control (RFC 2696).
pub const PAGED_RESULTS_OID: &str = "1.2.840.113556.1.4.319";

/// One decoded LDAP message: correlation id, operation and request controls.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: i32,
    pub request: Request,
    pub controls: Vec<Control>,
}

impl Message {
    pub fn new(id: i32, request: Request) -> Self {
        Self {
            id,
            request,
            controls: Vec::new(),
        }
    }

    pub fn with_control(mut self, control: Control) -> Self {
        self.controls.push(control);
        self
    }
}

/// The protocol operation carried by a [`Message`].
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Bind(BindRequest),
    Unbind,
    Search(SearchRequest),
    Extended(ExtendedRequest),
    /// Abandon the in-flight request with this message id.
    Abandon(i32),
    /// An operation this server has no handler for (modify, add, ...).
    Other(OperationKind),
}

impl Request {
    pub fn kind(&self) -> OperationKind {
        match self {
            Request::Bind(_) => OperationKind::Bind,
            Request::Unbind => OperationKind::Unbind,
            Request::Search(_) => OperationKind::Search,
            Request::Extended(_) => OperationKind::Extended,
            Request::Abandon(_) => OperationKind::Abandon,
            Request::Other(kind) => *kind,
        }
    }
}

/// LDAP operation type, used for routing and for choosing a response type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Bind,
    Unbind,
    Search,
    Modify,
    Add,
    Delete,
    ModifyDn,
    Compare,
    Abandon,
    Extended,
    Unknown,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::Bind => write!(f, "bind"),
            OperationKind::Unbind => write!(f, "unbind"),
            OperationKind::Search => write!(f, "search"),
            OperationKind::Modify => write!(f, "modify"),
            OperationKind::Add => write!(f, "add"),
            OperationKind::Delete => write!(f, "delete"),
            OperationKind::ModifyDn => write!(f, "modifyDN"),
            OperationKind::Compare => write!(f, "compare"),
            OperationKind::Abandon => write!(f, "abandon"),
            OperationKind::Extended => write!(f, "extended"),
            OperationKind::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindRequest {
    pub name: String,
    pub authentication: Authentication,
}

impl BindRequest {
    pub fn simple(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            authentication: Authentication::Simple(password.into()),
        }
    }
}

/// Bind authentication choice.
#[derive(Clone, PartialEq, Eq)]
pub enum Authentication {
    Simple(String),
    Sasl { mechanism: String },
}

impl Authentication {
    /// Name of the choice, as logged.
    pub fn choice(&self) -> &'static str {
        match self {
            Authentication::Simple(_) => "simple",
            Authentication::Sasl { .. } => "sasl",
        }
    }
}

// Credentials stay out of debug output.
impl std::fmt::Debug for Authentication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Authentication::Simple(_) => f.write_str("Simple(<redacted>)"),
            Authentication::Sasl { mechanism } => {
                f.debug_struct("Sasl").field("mechanism", mechanism).finish()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    BaseObject,
    SingleLevel,
    #[default]
    WholeSubtree,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub base: String,
    pub scope: SearchScope,
    pub size_limit: i32,
    pub time_limit: i32,
    pub filter: Filter,
    pub attributes: Vec<String>,
}

impl SearchRequest {
    /// Whole-subtree search with no limits.
    pub fn new(base: impl Into<String>, filter: Filter) -> Self {
        Self {
            base: base.into(),
            scope: SearchScope::WholeSubtree,
            size_limit: 0,
            time_limit: 0,
            filter,
            attributes: Vec::new(),
        }
    }

    pub fn scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedRequest {
    pub name: String,
    pub value: Option<Vec<u8>>,
}

/// A request control, as decoded by the protocol engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    /// RFC 2696 simple paged results. Logged, otherwise ignored.
    PagedResults { size: i32, cookie: Vec<u8> },
    /// Any other control; carries the engine's description of it.
    Other { description: String },
}

impl Control {
    pub fn oid(&self) -> Option<&'static str> {
        match self {
            Control::PagedResults { .. } => Some(PAGED_RESULTS_OID),
            Control::Other { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// LDAP result codes produced by this server (RFC 4511 §4.1.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Success,
    OperationsError,
    ProtocolError,
    InvalidCredentials,
    UnwillingToPerform,
    Other,
}

impl ResultCode {
    pub fn code(self) -> u32 {
        match self {
            ResultCode::Success => 0,
            ResultCode::OperationsError => 1,
            ResultCode::ProtocolError => 2,
            ResultCode::InvalidCredentials => 49,
            ResultCode::UnwillingToPerform => 53,
            ResultCode::Other => 80,
        }
    }
}

impl std::fmt::Display for ResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResultCode::Success => "success",
            ResultCode::OperationsError => "operationsError",
            ResultCode::ProtocolError => "protocolError",
            ResultCode::InvalidCredentials => "invalidCredentials",
            ResultCode::UnwillingToPerform => "unwillingToPerform",
            ResultCode::Other => "other",
        };
        write!(f, "{name} ({})", self.code())
    }
}

/// Result code plus diagnostic message, shared by every terminal response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpResult {
    pub code: ResultCode,
    pub message: String,
}

impl OpResult {
    pub fn success() -> Self {
        Self {
            code: ResultCode::Success,
            message: String::new(),
        }
    }

    pub fn new(code: ResultCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// One attribute of a search result entry, values already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialAttribute {
    pub name: String,
    pub values: Vec<Vec<u8>>,
}

impl PartialAttribute {
    pub fn new<I, V>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Vec<u8>>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEntry {
    pub dn: String,
    pub attributes: Vec<PartialAttribute>,
}

impl SearchEntry {
    pub fn attribute(&self, name: &str) -> Option<&PartialAttribute> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }
}

/// Everything a handler can write back for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Bind(OpResult),
    Extended {
        result: OpResult,
        name: Option<String>,
        value: Option<Vec<u8>>,
    },
    SearchEntry(SearchEntry),
    SearchDone(OpResult),
    /// Terminal result for an operation without a dedicated variant.
    Result { kind: OperationKind, result: OpResult },
}

impl Response {
    /// The terminal result, `None` for search result entries.
    pub fn result(&self) -> Option<&OpResult> {
        match self {
            Response::Bind(r) | Response::SearchDone(r) => Some(r),
            Response::Extended { result, .. } | Response::Result { result, .. } => Some(result),
            Response::SearchEntry(_) => None,
        }
    }
}

/// Where handlers write their responses, in order.
pub trait ResponseSink {
    fn write(&mut self, response: Response);
}

impl ResponseSink for Vec<Response> {
    fn write(&mut self, response: Response) {
        self.push(response);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_redacted_in_debug() {
        let req = BindRequest::simple("uid=alice,o=x", "hunter2");
        let shown = format!("{req:?}");
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("uid=alice,o=x"));
    }

    #[test]
    fn request_kinds() {
        assert_eq!(Request::Unbind.kind(), OperationKind::Unbind);
        assert_eq!(Request::Abandon(3).kind(), OperationKind::Abandon);
        assert_eq!(
            Request::Other(OperationKind::Modify).kind(),
            OperationKind::Modify
        );
    }

    #[test]
    fn result_code_display() {
        assert_eq!(ResultCode::InvalidCredentials.to_string(), "invalidCredentials (49)");
        assert_eq!(ResultCode::UnwillingToPerform.code(), 53);
    }

    #[test]
    fn vec_is_a_sink() {
        let mut sink: Vec<Response> = Vec::new();
        sink.write(Response::SearchDone(OpResult::success()));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].result().map(|r| r.code), Some(ResultCode::Success));
    }

    #[test]
    fn control_oids() {
        let paged = Message::new(1, Request::Unbind).with_control(Control::PagedResults {
            size: 10,
            cookie: Vec::new(),
        });
        assert_eq!(paged.controls[0].oid(), Some(PAGED_RESULTS_OID));
        let other = Control::Other {
            description: "ManageDsaIT".to_string(),
        };
        assert_eq!(other.oid(), None);
    }
}
