//! Domain-specific assertion macros for devldap harnesses.
//!
//! These wrap `pretty_assertions` and say which response in the batch broke
//! the expectation.

use devldap_core::{Response, SearchEntry};

/// Search result entries of a response batch, in order.
pub fn entries(responses: &[Response]) -> Vec<&SearchEntry> {
    responses
        .iter()
        .filter_map(|r| match r {
            Response::SearchEntry(e) => Some(e),
            _ => None,
        })
        .collect()
}

/// DNs of the entries in a response batch, sorted.
pub fn entry_dns(responses: &[Response]) -> Vec<&str> {
    let mut dns: Vec<&str> = entries(responses).iter().map(|e| e.dn.as_str()).collect();
    dns.sort_unstable();
    dns
}

/// Assert that the batch ends with exactly one terminal result carrying `code`.
///
/// ```rust
/// assert_result_code!(out, ResultCode::Success);
/// ```
#[macro_export]
macro_rules! assert_result_code {
    ($responses:expr, $code:expr) => {{
        let responses: &[devldap_core::Response] = &$responses;
        let terminal: Vec<_> = responses.iter().filter_map(|r| r.result()).collect();
        match terminal.as_slice() {
            [only] => pretty_assertions::assert_eq!(
                only.code, $code,
                "assert_result_code! failed: diagnostic {:?}",
                only.message
            ),
            other => panic!(
                "assert_result_code! failed: expected exactly one terminal result, found {}: {:?}",
                other.len(),
                responses
            ),
        }
        match responses.last().and_then(|r| r.result()) {
            Some(_) => {}
            None => panic!("assert_result_code! failed: terminal result is not last: {:?}", responses),
        }
    }};
}

/// Assert that no projected attribute of any entry is named `dn`.
#[macro_export]
macro_rules! assert_no_dn_attribute {
    ($responses:expr) => {{
        for entry in $crate::common::entries(&$responses) {
            if let Some(attr) = entry.attribute("dn") {
                panic!(
                    "assert_no_dn_attribute! failed: entry {:?} projects {:?}",
                    entry.dn, attr
                );
            }
        }
    }};
}
