//! Filter evaluator: decides whether one entry matches an LDAP search filter.
//!
//! Evaluation is fail-closed: every kind this server does not implement
//! (`!`, `>=`, `<=`, `~=`, extensible match) logs and returns `false`. The
//! only path that returns `true` without looking at the entry is an `&` with
//! no children.
//!
//! Attribute *names* are case-insensitive; attribute *values* compare
//! byte-exact, and substring filters compile to case-sensitive regexes.
//!
//! [`matches`] is the one-shot form. A search evaluating the same filter
//! against many entries builds a [`CompiledFilter`] once instead, so each
//! substring regex is compiled once per request rather than once per entry.

mod text;

use crate::entry::{AttributeValue, Entry};
use regex::Regex;
use tracing::{debug, trace, warn};

/// An LDAP search filter (RFC 4511 §4.5.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Equality { attribute: String, value: String },
    GreaterOrEqual { attribute: String, value: String },
    LessOrEqual { attribute: String, value: String },
    Present(String),
    Approx { attribute: String, value: String },
    Substrings {
        attribute: String,
        fragments: Vec<SubstringFragment>,
    },
    /// Extensible match, kept as the engine's textual rendering.
    ExtensibleMatch(String),
}

/// One component of a substring filter, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubstringFragment {
    Initial(String),
    Any(String),
    Final(String),
}

impl Filter {
    pub fn equality(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Equality {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn present(attribute: impl Into<String>) -> Self {
        Filter::Present(attribute.into())
    }

    pub fn substrings(attribute: impl Into<String>, fragments: Vec<SubstringFragment>) -> Self {
        Filter::Substrings {
            attribute: attribute.into(),
            fragments,
        }
    }

    pub fn not(inner: Filter) -> Self {
        Filter::Not(Box::new(inner))
    }
}

/// Does `entry` match `filter`?
pub fn matches(entry: &Entry, filter: &Filter) -> bool {
    CompiledFilter::new(filter).matches(entry)
}

// ---------------------------------------------------------------------------
// Substring patterns
// ---------------------------------------------------------------------------

enum Piece<'a> {
    Literal(&'a str),
    Wildcard,
}

/// Translate substring fragments into an anchored regular expression.
///
/// `Initial` is followed by a wildcard, `Any` is wrapped in wildcards on both
/// sides and `Final` is preceded by one. Runs of wildcards collapse into one
/// `.*`; literal text is regex-escaped.
pub fn substring_pattern(fragments: &[SubstringFragment]) -> String {
    let mut pieces = Vec::with_capacity(fragments.len() * 3);
    for fragment in fragments {
        match fragment {
            SubstringFragment::Initial(s) => {
                pieces.push(Piece::Literal(s));
                pieces.push(Piece::Wildcard);
            }
            SubstringFragment::Any(s) => {
                pieces.push(Piece::Wildcard);
                pieces.push(Piece::Literal(s));
                pieces.push(Piece::Wildcard);
            }
            SubstringFragment::Final(s) => {
                pieces.push(Piece::Wildcard);
                pieces.push(Piece::Literal(s));
            }
        }
    }
    pieces.retain(|p| !matches!(p, Piece::Literal(s) if s.is_empty()));
    pieces.dedup_by(|a, b| matches!((a, b), (Piece::Wildcard, Piece::Wildcard)));

    let mut pattern = String::from("^");
    for piece in pieces {
        match piece {
            Piece::Literal(s) => pattern.push_str(&regex::escape(s)),
            Piece::Wildcard => pattern.push_str(".*"),
        }
    }
    pattern.push('$');
    pattern
}

// ---------------------------------------------------------------------------
// CompiledFilter
// ---------------------------------------------------------------------------

enum Node<'f> {
    And(Vec<Node<'f>>),
    Or(Vec<Node<'f>>),
    Equality {
        attribute: &'f str,
        value: &'f str,
    },
    Present(&'f str),
    Substrings {
        attribute: &'f str,
        /// `None` when the pattern failed to compile.
        regex: Option<Regex>,
        pattern: String,
    },
    /// Kinds that always evaluate to `false`.
    Unsupported {
        kind: &'static str,
        source: &'f Filter,
    },
}

/// A filter prepared for evaluation against many entries.
pub struct CompiledFilter<'f> {
    source: &'f Filter,
    root: Node<'f>,
}

impl<'f> CompiledFilter<'f> {
    pub fn new(filter: &'f Filter) -> Self {
        Self {
            source: filter,
            root: compile(filter),
        }
    }

    pub fn filter(&self) -> &'f Filter {
        self.source
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        eval(&self.root, entry)
    }
}

fn compile(filter: &Filter) -> Node<'_> {
    match filter {
        Filter::And(children) => Node::And(children.iter().map(compile).collect()),
        Filter::Or(children) => Node::Or(children.iter().map(compile).collect()),
        Filter::Not(_) => Node::Unsupported {
            kind: "!",
            source: filter,
        },
        Filter::Equality { attribute, value } => Node::Equality { attribute, value },
        Filter::GreaterOrEqual { .. } => Node::Unsupported {
            kind: ">=",
            source: filter,
        },
        Filter::LessOrEqual { .. } => Node::Unsupported {
            kind: "<=",
            source: filter,
        },
        Filter::Present(attribute) => Node::Present(attribute),
        Filter::Approx { .. } => Node::Unsupported {
            kind: "~=",
            source: filter,
        },
        Filter::Substrings {
            attribute,
            fragments,
        } => {
            let pattern = substring_pattern(fragments);
            let regex = match Regex::new(&pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(%pattern, error = %e, "substring filter did not compile; it will match nothing");
                    None
                }
            };
            Node::Substrings {
                attribute,
                regex,
                pattern,
            }
        }
        Filter::ExtensibleMatch(_) => Node::Unsupported {
            kind: "extensible",
            source: filter,
        },
    }
}

fn eval(node: &Node<'_>, entry: &Entry) -> bool {
    match node {
        Node::And(children) => children.iter().all(|c| eval(c, entry)),
        Node::Or(children) => children.iter().any(|c| eval(c, entry)),
        Node::Equality { attribute, value } => equality(entry, attribute, value),
        Node::Present(attribute) => {
            let found = entry.contains(attribute);
            trace!(%attribute, found, "presence filter");
            found
        }
        Node::Substrings {
            attribute,
            regex,
            pattern,
        } => substrings(entry, attribute, regex.as_ref(), pattern),
        Node::Unsupported { kind, source } => {
            debug!(kind, filter = %source, "filter kind not implemented; treating as no match");
            false
        }
    }
}

/// Scalar: exact equality. List: any member equal. Absent: no match.
fn equality(entry: &Entry, attribute: &str, value: &str) -> bool {
    let Some(stored) = entry.get(attribute) else {
        trace!(%attribute, "equality filter: attribute absent");
        return false;
    };
    let found = stored.values().any(|v| v == value);
    trace!(%attribute, %value, found, "equality filter");
    found
}

/// Only scalar values are tested; a multi-valued attribute never matches.
fn substrings(entry: &Entry, attribute: &str, regex: Option<&Regex>, pattern: &str) -> bool {
    let Some(regex) = regex else {
        return false;
    };
    match entry.get(attribute) {
        Some(AttributeValue::Scalar(value)) => {
            let found = regex.is_match(value);
            trace!(%attribute, %value, %pattern, found, "substring filter");
            found
        }
        Some(AttributeValue::List(_)) => {
            debug!(%attribute, %pattern, "substring filter against a multi-valued attribute; no match");
            false
        }
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
