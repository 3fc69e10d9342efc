// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Tag

use serde::{Deserialize, Serialize};

use super::EventId;
use crate::PublicKey;

/// Tag
///
/// Ordered list of strings; the first one is the tag name.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(Vec<String>);

impl Tag {
    /// Parse tag from a sequence of strings
    pub fn parse<I, S>(tag: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tag.into_iter().map(|s| s.into()).collect())
    }

    /// `e` tag
    #[inline]
    pub fn event(id: EventId) -> Self {
        Self(vec![String::from("e"), id.to_hex()])
    }

    /// `p` tag
    #[inline]
    pub fn public_key(public_key: PublicKey) -> Self {
        Self(vec![String::from("p"), public_key.to_hex()])
    }

    /// `t` tag
    #[inline]
    pub fn hashtag<S>(hashtag: S) -> Self
    where
        S: Into<String>,
    {
        Self(vec![String::from("t"), hashtag.into()])
    }

    /// `d` tag
    #[inline]
    pub fn identifier<S>(identifier: S) -> Self
    where
        S: Into<String>,
    {
        Self(vec![String::from("d"), identifier.into()])
    }

    /// Tag name (first element)
    #[inline]
    pub fn kind(&self) -> Option<&str> {
        self.0.first().map(|s| s.as_str())
    }

    /// Single-letter tag name, if any
    pub fn single_letter(&self) -> Option<char> {
        let mut chars = self.kind()?.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => Some(c),
            _ => None,
        }
    }

    /// First value after the name
    #[inline]
    pub fn content(&self) -> Option<&str> {
        self.0.get(1).map(|s| s.as_str())
    }

    /// Get as slice of strings
    #[inline]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Consume and get as vector of strings
    #[inline]
    pub fn to_vec(self) -> Vec<String> {
        self.0
    }

    /// Number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for Tag {
    fn from(tag: Vec<String>) -> Self {
        Self(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_accessors() {
        let tag = Tag::parse(["e", "abc", "wss://relay.example.com", "reply"]);
        assert_eq!(tag.kind(), Some("e"));
        assert_eq!(tag.single_letter(), Some('e'));
        assert_eq!(tag.content(), Some("abc"));
        assert_eq!(tag.len(), 4);

        let tag = Tag::parse(["client", "x"]);
        assert_eq!(tag.single_letter(), None);

        let tag = Tag::default();
        assert!(tag.is_empty());
        assert_eq!(tag.kind(), None);
    }

    #[test]
    fn test_tag_serde() {
        let tag = Tag::hashtag("nostr");
        assert_eq!(serde_json::to_string(&tag).unwrap(), r#"["t","nostr"]"#);
        let tag: Tag = serde_json::from_str(r#"["p","x"]"#).unwrap();
        assert_eq!(tag.as_slice(), ["p", "x"]);
        assert!(serde_json::from_str::<Tag>(r#"["p",1]"#).is_err());
    }
}
