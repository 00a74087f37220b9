//! URL-form-encoded submissions.
//!
//! The datagram payload is the raw `application/x-www-form-urlencoded` body of
//! an HTTP POST. This module turns it into an ordered [`Submission`].

use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

/// Error decoding a datagram payload.
#[derive(Debug, Error)]
pub enum FormError {
    /// Payload is not valid UTF-8.
    #[error("payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// One decoded form payload.
///
/// Field order follows first appearance in the payload. Blank values are
/// dropped, and a repeated field name keeps its first non-blank value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    fields: Vec<(String, String)>,
}

impl Submission {
    /// Decode a datagram payload.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormError> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::parse(text))
    }

    /// Parse form-encoded text (`a=1&b=two+words`).
    pub fn parse(text: &str) -> Self {
        let mut submission = Self::default();
        for (name, value) in url::form_urlencoded::parse(text.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            if submission.get(&name).is_none() {
                submission.fields.push((name.into_owned(), value.into_owned()));
            }
        }
        submission
    }

    /// Re-encode using standard form encoding.
    pub fn to_form_encoded(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.fields.iter())
            .finish()
    }

    /// Append a field unless the name is already present.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if self.get(&name).is_none() {
            self.fields.push((name, value.into()));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl Serialize for Submission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_pairs() {
        let s = Submission::parse("name=Ann&age=30");
        assert_eq!(s.len(), 2);
        assert_eq!(s.get("name"), Some("Ann"));
        assert_eq!(s.get("age"), Some("30"));
        let order: Vec<_> = s.iter().map(|(n, _)| n).collect();
        assert_eq!(order, vec!["name", "age"]);
    }

    #[test]
    fn test_repeated_key_keeps_first_value() {
        let s = Submission::parse("color=red&size=m&color=blue");
        assert_eq!(s.len(), 2);
        assert_eq!(s.get("color"), Some("red"));
    }

    #[test]
    fn test_plus_and_percent_decoding() {
        let s = Submission::parse("message=hello+world&city=Kyiv%20%D0%BA%D0%B8%D1%97%D0%B2");
        assert_eq!(s.get("message"), Some("hello world"));
        assert_eq!(s.get("city"), Some("Kyiv київ"));
    }

    #[test]
    fn test_blank_values_are_dropped() {
        let s = Submission::parse("name=&message=hi");
        assert_eq!(serde_json::to_string(&s).unwrap(), r#"{"message":"hi"}"#);

        let s = Submission::parse("flag&name=x");
        assert_eq!(s.get("flag"), None);
        assert_eq!(s.get("name"), Some("x"));
    }

    #[test]
    fn test_repeated_key_keeps_first_non_blank_value() {
        let s = Submission::parse("a=&a=x&a=y");
        assert_eq!(serde_json::to_string(&s).unwrap(), r#"{"a":"x"}"#);
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let err = Submission::from_bytes(&[b'a', b'=', 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, FormError::InvalidUtf8(_)));
    }

    #[test]
    fn test_round_trip_without_repeated_keys() {
        let mut original = Submission::default();
        original.insert("username", "Ann Lee");
        original.insert("message", "a&b=c 100% ok");
        original.insert("note", "привіт");

        let encoded = original.to_form_encoded();
        assert_eq!(Submission::parse(&encoded), original);
    }

    #[test]
    fn test_serializes_as_ordered_object() {
        let s = Submission::parse("b=2&a=1");
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"{"b":"2","a":"1"}"#);
    }
}
