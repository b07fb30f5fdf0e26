//! Translation between `ldap3_proto` messages and the devldap-core model.
//!
//! Everything protocol-engine specific stops here: handlers never see an
//! `LdapMsg`, and the codec never sees a [`Response`].

use devldap_core::types::OpResult;
use devldap_core::{
    Authentication, BindRequest, Control, ExtendedRequest, Filter, Message, OperationKind,
    Request, Response, ResultCode, SearchRequest, SearchScope, SubstringFragment,
};
use ldap3_proto::control::LdapControl;
use ldap3_proto::proto::{
    LdapBindCred, LdapBindResponse, LdapExtendedResponse, LdapFilter, LdapMsg,
    LdapOp, LdapPartialAttribute, LdapResult, LdapResultCode, LdapSearchResultEntry,
    LdapSearchScope, LdapSubstringFilter,
};

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

pub fn message(msg: LdapMsg) -> Message {
    Message {
        id: msg.msgid,
        request: request(msg.op),
        controls: msg.ctrl.into_iter().map(control).collect(),
    }
}

fn request(op: LdapOp) -> Request {
    match op {
        LdapOp::BindRequest(req) => Request::Bind(BindRequest {
            name: req.dn,
            authentication: match req.cred {
                LdapBindCred::Simple(password) => Authentication::Simple(password),
                other => Authentication::Sasl {
                    mechanism: sasl_mechanism(&other),
                },
            },
        }),
        LdapOp::UnbindRequest => Request::Unbind,
        LdapOp::SearchRequest(req) => Request::Search(SearchRequest {
            base: req.base,
            scope: scope(req.scope),
            size_limit: req.sizelimit,
            time_limit: req.timelimit,
            filter: filter(req.filter),
            attributes: req.attrs,
        }),
        LdapOp::ExtendedRequest(req) => Request::Extended(ExtendedRequest {
            name: req.name,
            value: req.value,
        }),
        LdapOp::AbandonRequest(target) => Request::Abandon(target),
        LdapOp::ModifyRequest(_) => Request::Other(OperationKind::Modify),
        LdapOp::AddRequest(_) => Request::Other(OperationKind::Add),
        LdapOp::DelRequest(_) => Request::Other(OperationKind::Delete),
        _ => Request::Other(OperationKind::Unknown),
    }
}

// Only the variant name; credentials stay out of the model.
fn sasl_mechanism(cred: &LdapBindCred) -> String {
    format!("{cred:?}")
        .split(['(', ' ', '{'])
        .next()
        .unwrap_or_default()
        .to_string()
}

fn scope(scope: LdapSearchScope) -> SearchScope {
    match scope {
        LdapSearchScope::Base => SearchScope::BaseObject,
        LdapSearchScope::OneLevel => SearchScope::SingleLevel,
        _ => SearchScope::WholeSubtree,
    }
}

/// Map the engine's filter tree. Kinds without a core counterpart become an
/// opaque extensible match, which never matches.
pub fn filter(f: LdapFilter) -> Filter {
    match f {
        LdapFilter::And(children) => Filter::And(children.into_iter().map(filter).collect()),
        LdapFilter::Or(children) => Filter::Or(children.into_iter().map(filter).collect()),
        LdapFilter::Not(inner) => Filter::Not(Box::new(filter(*inner))),
        LdapFilter::Equality(attribute, value) => Filter::Equality { attribute, value },
        LdapFilter::GreaterOrEqual(attribute, value) => Filter::GreaterOrEqual { attribute, value },
        LdapFilter::LessOrEqual(attribute, value) => Filter::LessOrEqual { attribute, value },
        LdapFilter::Approx(attribute, value) => Filter::Approx { attribute, value },
        LdapFilter::Present(attribute) => Filter::Present(attribute),
        LdapFilter::Substring(attribute, sub) => Filter::Substrings {
            attribute,
            fragments: fragments(sub),
        },
        other => Filter::ExtensibleMatch(format!("{other:?}")),
    }
}

fn fragments(sub: LdapSubstringFilter) -> Vec<SubstringFragment> {
    let mut out = Vec::with_capacity(sub.any.len() + 2);
    if let Some(initial) = sub.initial {
        out.push(SubstringFragment::Initial(initial));
    }
    out.extend(sub.any.into_iter().map(SubstringFragment::Any));
    if let Some(last) = sub.final_ {
        out.push(SubstringFragment::Final(last));
    }
    out
}

fn control(ctrl: LdapControl) -> Control {
    match ctrl {
        LdapControl::SimplePagedResults { size, cookie } => Control::PagedResults { size, cookie },
        other => Control::Other {
            description: format!("{other:?}"),
        },
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

pub fn response(id: i32, response: Response) -> LdapMsg {
    let op = match response {
        Response::Bind(r) => LdapOp::BindResponse(LdapBindResponse {
            res: result(r),
            saslcreds: None,
        }),
        Response::Extended {
            result: r,
            name,
            value,
        } => LdapOp::ExtendedResponse(LdapExtendedResponse {
            res: result(r),
            name,
            value,
        }),
        Response::SearchEntry(entry) => LdapOp::SearchResultEntry(LdapSearchResultEntry {
            dn: entry.dn,
            attributes: entry
                .attributes
                .into_iter()
                .map(|a| LdapPartialAttribute {
                    atype: a.name,
                    vals: a.values,
                })
                .collect(),
        }),
        Response::SearchDone(r) => LdapOp::SearchResultDone(result(r)),
        Response::Result { kind, result: r } => match kind {
            OperationKind::Search => LdapOp::SearchResultDone(result(r)),
            OperationKind::Modify => LdapOp::ModifyResponse(result(r)),
            OperationKind::Add => LdapOp::AddResponse(result(r)),
            OperationKind::Delete => LdapOp::DelResponse(result(r)),
            _ => LdapOp::ExtendedResponse(LdapExtendedResponse {
                res: result(r),
                name: None,
                value: None,
            }),
        },
    };
    LdapMsg {
        msgid: id,
        op,
        ctrl: Vec::new(),
    }
}

fn result(r: OpResult) -> LdapResult {
    LdapResult {
        code: result_code(r.code),
        matcheddn: String::new(),
        message: r.message,
        referral: Vec::new(),
    }
}

fn result_code(code: ResultCode) -> LdapResultCode {
    match code {
        ResultCode::Success => LdapResultCode::Success,
        ResultCode::OperationsError => LdapResultCode::OperationsError,
        ResultCode::ProtocolError => LdapResultCode::ProtocolError,
        ResultCode::InvalidCredentials => LdapResultCode::InvalidCredentials,
        ResultCode::UnwillingToPerform => LdapResultCode::UnwillingToPerform,
        ResultCode::Other => LdapResultCode::Other,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
