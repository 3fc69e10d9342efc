// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Relay Url
//!
//! Relay URLs are canonicalized on parse, so two spellings of the same relay compare equal.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::{ParseError, Url};

const DEFAULT_SCHEME: &str = "wss";

/// Url Error
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// Url error
    Url(ParseError),
    /// Empty url
    Empty,
    /// Scheme other than `ws` or `wss`
    UnsupportedScheme(String),
    /// Url without host
    MissingHost,
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(e) => write!(f, "Url: {e}"),
            Self::Empty => write!(f, "Empty url"),
            Self::UnsupportedScheme(s) => write!(f, "Unsupported scheme: {s}"),
            Self::MissingHost => write!(f, "Missing host"),
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Url(e)
    }
}

/// Canonical relay url
///
/// Canonicalization rules:
/// * `wss://` is assumed when no scheme is given
/// * only `ws` and `wss` are accepted
/// * the default port of the scheme is dropped
/// * repeated `/` are collapsed and a trailing `/` is stripped
/// * query parameters are sorted, fragment and user info are removed
#[derive(Debug, Clone)]
pub struct RelayUrl {
    url: Url,
    canonical: String,
}

impl RelayUrl {
    /// Parse and canonicalize a relay url
    pub fn parse<S>(url: S) -> Result<Self, Error>
    where
        S: AsRef<str>,
    {
        let url: &str = url.as_ref().trim();

        if url.is_empty() {
            return Err(Error::Empty);
        }

        let url: Cow<str> = if has_scheme(url) {
            Cow::Borrowed(url)
        } else {
            Cow::Owned(format!("{DEFAULT_SCHEME}://{url}"))
        };

        let mut url: Url = Url::parse(&url)?;

        match url.scheme() {
            "ws" | "wss" => {}
            scheme => return Err(Error::UnsupportedScheme(scheme.to_string())),
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(Error::MissingHost);
        }

        // Can't fail: host is set
        let _ = url.set_username("");
        let _ = url.set_password(None);
        url.set_fragment(None);

        let path: String = canonical_path(url.path());
        url.set_path(&path);

        let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        if pairs.is_empty() {
            url.set_query(None);
        } else {
            pairs.sort();
            url.query_pairs_mut().clear().extend_pairs(pairs.iter());
        }

        let canonical: String = render(&url);

        Ok(Self { url, canonical })
    }

    /// Canonical string form
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Underlying [`Url`]
    #[inline]
    pub fn as_url(&self) -> &Url {
        &self.url
    }

    /// Check if the url uses `wss`
    #[inline]
    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "wss"
    }
}

fn canonical_path(path: &str) -> String {
    let mut out: String = String::with_capacity(path.len());
    let mut prev_slash: bool = false;

    for c in path.chars() {
        if c == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(c);
    }

    if out.ends_with('/') {
        out.pop();
    }

    out
}

fn render(url: &Url) -> String {
    let mut out: String = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());

    if let Some(port) = url.port() {
        out.push(':');
        out.push_str(&port.to_string());
    }

    let path: &str = url.path();
    if path != "/" {
        out.push_str(path);
    }

    if let Some(query) = url.query() {
        out.push('?');
        out.push_str(query);
    }

    out
}

impl PartialEq for RelayUrl {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for RelayUrl {}

impl PartialOrd for RelayUrl {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RelayUrl {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical.cmp(&other.canonical)
    }
}

impl Hash for RelayUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for RelayUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical)
    }
}

impl FromStr for RelayUrl {
    type Err = Error;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        Self::parse(url)
    }
}

impl TryFrom<&str> for RelayUrl {
    type Error = Error;

    fn try_from(url: &str) -> Result<Self, Self::Error> {
        Self::parse(url)
    }
}

impl TryFrom<String> for RelayUrl {
    type Error = Error;

    fn try_from(url: String) -> Result<Self, Self::Error> {
        Self::parse(url)
    }
}

impl TryFrom<Url> for RelayUrl {
    type Error = Error;

    fn try_from(url: Url) -> Result<Self, Self::Error> {
        Self::parse(url.as_str())
    }
}

impl From<RelayUrl> for Url {
    fn from(url: RelayUrl) -> Self {
        url.url
    }
}

impl Serialize for RelayUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.canonical)
    }
}

impl<'de> Deserialize<'de> for RelayUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let url: String = String::deserialize(deserializer)?;
        Self::parse(url).map_err(serde::de::Error::custom)
    }
}

/// Check for a `<scheme>://` prefix, ignoring `://` inside the path, query or fragment
fn has_scheme(url: &str) -> bool {
    match url.find("://") {
        Some(pos) => !url[..pos].contains(|c| matches!(c, '/' | '?' | '#')),
        None => false,
    }
}
