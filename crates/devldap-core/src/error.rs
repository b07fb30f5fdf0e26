//! Error types for devldap-core.
//!
//! Only loading a directory document and parsing filter text can fail.
//! Query evaluation never returns an error: absent attributes, bad hex and
//! unsupported filter kinds all resolve to documented defaults.

use thiserror::Error;

/// The directory document could not be turned into a [`Directory`](crate::Directory).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Not JSON, or not an object of objects of strings / string arrays.
    #[error("directory document is malformed: {0}")]
    Json(#[from] serde_json::Error),

    /// Two attribute names of one entry differ only in case.
    #[error("entry {dn:?} declares attribute {attribute:?} more than once (names are case-insensitive)")]
    DuplicateAttribute { dn: String, attribute: String },
}

/// RFC 4515 filter text could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterParseError {
    #[error("filter is empty")]
    Empty,

    #[error("unexpected end of filter, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("expected {expected} at offset {offset}, found {found:?}")]
    Unexpected {
        expected: &'static str,
        found: char,
        offset: usize,
    },

    #[error("missing attribute description at offset {offset}")]
    MissingAttribute { offset: usize },

    #[error("invalid escape sequence at offset {offset}")]
    InvalidEscape { offset: usize },

    #[error("assertion value at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },

    #[error("unexpected trailing input at offset {offset}")]
    TrailingInput { offset: usize },
}

impl FilterParseError {
    /// Byte offset the error points at, when there is one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            FilterParseError::Empty | FilterParseError::UnexpectedEnd { .. } => None,
            FilterParseError::Unexpected { offset, .. }
            | FilterParseError::MissingAttribute { offset }
            | FilterParseError::InvalidEscape { offset }
            | FilterParseError::InvalidUtf8 { offset }
            | FilterParseError::TrailingInput { offset } => Some(*offset),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_attribute_message_names_entry() {
        let err = StoreError::DuplicateAttribute {
            dn: "cn=x,o=y".into(),
            attribute: "mail".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("cn=x,o=y"));
        assert!(msg.contains("mail"));
    }

    #[test]
    fn offsets() {
        assert_eq!(FilterParseError::Empty.offset(), None);
        assert_eq!(FilterParseError::TrailingInput { offset: 7 }.offset(), Some(7));
    }
}
