//! Attribute projector: renders the requested attributes of a matched entry.
//!
//! Values starting with `{hex}` are binary: the rest of the string is hex
//! decoded into raw bytes. Bad hex is logged and projected as an empty
//! value; it never fails the search.

use crate::entry::{AttributeValue, Entry};
use crate::types::PartialAttribute;
use tracing::warn;

/// Marker prefix for hex-encoded binary values.
pub const HEX_PREFIX: &str = "{hex}";

/// Request for every user attribute (RFC 4511 §4.5.1.8).
pub const ALL_ATTRIBUTES: &str = "*";

/// Request for no attributes at all (RFC 4511 §4.5.1.8).
pub const NO_ATTRIBUTES: &str = "1.1";

/// Decode one stored value into the bytes sent to the client.
pub fn decode_value(raw: &str) -> Vec<u8> {
    match raw.strip_prefix(HEX_PREFIX) {
        Some(hex_text) => match hex::decode(hex_text) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(value = %raw, error = %e, "could not decode hex value; sending empty bytes");
                Vec::new()
            }
        },
        None => raw.as_bytes().to_vec(),
    }
}

/// Resolve one attribute (case-insensitively) to its decoded values.
///
/// `None` means the attribute is absent and must be left out of the result
/// entirely.
pub fn resolve(entry: &Entry, name: &str) -> Option<Vec<Vec<u8>>> {
    entry.get(name).map(decode_all)
}

fn decode_all(value: &AttributeValue) -> Vec<Vec<u8>> {
    value.values().map(decode_value).collect()
}

/// Project the requested attributes of `entry`, in request order.
///
/// `dn` is never projected: it travels as the entry's name. An empty request
/// or `*` projects every stored attribute, `1.1` projects none, and names
/// repeated in the request (ignoring case) are projected once.
pub fn project(entry: &Entry, requested: &[String]) -> Vec<PartialAttribute> {
    let wants_all = requested.is_empty() || requested.iter().any(|a| a == ALL_ATTRIBUTES);
    if wants_all {
        return entry
            .iter()
            .filter(|(name, _)| !is_dn(name))
            .map(|(name, value)| PartialAttribute {
                name: name.to_string(),
                values: decode_all(value),
            })
            .collect();
    }

    let mut projected: Vec<PartialAttribute> = Vec::with_capacity(requested.len());
    // Folded the same way `Entry` folds its keys.
    let mut seen: Vec<String> = Vec::with_capacity(requested.len());
    for name in requested {
        if is_dn(name) || name == NO_ATTRIBUTES {
            continue;
        }
        let folded = name.to_lowercase();
        if seen.contains(&folded) {
            continue;
        }
        seen.push(folded);
        if let Some(values) = resolve(entry, name) {
            projected.push(PartialAttribute {
                name: name.clone(),
                values,
            });
        }
    }
    projected
}

fn is_dn(name: &str) -> bool {
    name.eq_ignore_ascii_case("dn")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
