//! Directory entries and their attribute values.
//!
//! Attribute names are lower-cased once, when the entry is built, so every
//! lookup lower-cases the requested name and compares exactly.

use serde::Deserialize;

/// The stored value of one attribute.
///
/// The shape is fixed when the document is loaded; evaluation never has to
/// probe whether a value is a string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Scalar(String),
    List(Vec<String>),
}

impl AttributeValue {
    /// Iterate the raw (undecoded) values, one for a scalar.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            AttributeValue::Scalar(s) => std::slice::from_ref(s),
            AttributeValue::List(v) => v.as_slice(),
        };
        slice.iter().map(String::as_str)
    }

    /// The value when it is a scalar, `None` for lists.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            AttributeValue::Scalar(s) => Some(s),
            AttributeValue::List(_) => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Scalar(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Scalar(s)
    }
}

impl From<Vec<&str>> for AttributeValue {
    fn from(v: Vec<&str>) -> Self {
        AttributeValue::List(v.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(v: Vec<String>) -> Self {
        AttributeValue::List(v)
    }
}

/// One directory entry: lower-cased attribute name → value, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    attributes: Vec<(String, AttributeValue)>,
}

impl Entry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an attribute, lower-casing its name.
    ///
    /// Returns the previous value if the (case-insensitive) name was already
    /// present.
    pub fn insert(
        &mut self,
        name: impl AsRef<str>,
        value: impl Into<AttributeValue>,
    ) -> Option<AttributeValue> {
        let key = name.as_ref().to_lowercase();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.attributes.push((key, value));
                None
            }
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl AsRef<str>, value: impl Into<AttributeValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Case-insensitive attribute lookup.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        let key = name.to_lowercase();
        self.attributes
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Case-insensitive presence test.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Attributes in stored order, names already lower-cased.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let entry = Entry::new().with("givenName", "Ada");
        assert_eq!(entry.get("givenname"), Some(&AttributeValue::from("Ada")));
        assert_eq!(entry.get("GIVENNAME"), Some(&AttributeValue::from("Ada")));
        assert!(entry.contains("GivenName"));
        assert!(!entry.contains("sn"));
    }

    #[test]
    fn insert_replaces_same_name_in_other_case() {
        let mut entry = Entry::new().with("cn", "one");
        let previous = entry.insert("CN", "two");
        assert_eq!(previous, Some(AttributeValue::from("one")));
        assert_eq!(entry.len(), 1);
        assert_eq!(entry.get("cn").and_then(AttributeValue::as_scalar), Some("two"));
    }

    #[test]
    fn values_iterates_both_shapes() {
        let scalar = AttributeValue::from("a");
        let list = AttributeValue::from(vec!["a", "b"]);
        assert_eq!(scalar.values().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(list.values().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(list.as_scalar(), None);
    }

    #[test]
    fn untagged_deserialize_picks_shape() {
        let scalar: AttributeValue = serde_json::from_str(r#""x""#).unwrap();
        let list: AttributeValue = serde_json::from_str(r#"["x","y"]"#).unwrap();
        assert_eq!(scalar, AttributeValue::from("x"));
        assert_eq!(list, AttributeValue::from(vec!["x", "y"]));
        assert!(serde_json::from_str::<AttributeValue>("42").is_err());
    }
}
