//! Relay endpoints and ordered relay sets

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, Result};

/// Normalized relay address
///
/// Normalization lower-cases scheme and host, drops the scheme's default
/// port, drops any fragment and trailing slash. Only `ws` and `wss` are
/// accepted. Normalizing an already normalized address is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelayUrl(String);

impl RelayUrl {
    pub fn parse(input: &str) -> Result<Self> {
        let mut url = Url::parse(input.trim())
            .map_err(|e| Error::InvalidRelayUrl(format!("{}: {}", input, e)))?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::InvalidRelayUrl(format!(
                "{}: scheme must be ws or wss",
                input
            )));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(Error::InvalidRelayUrl(format!("{}: missing host", input)));
        }

        url.set_fragment(None);
        let normalized = url.as_str().trim_end_matches('/').to_string();
        Ok(RelayUrl(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelayUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RelayUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        RelayUrl::parse(s)
    }
}

impl TryFrom<String> for RelayUrl {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        RelayUrl::parse(&value)
    }
}

impl From<RelayUrl> for String {
    fn from(url: RelayUrl) -> Self {
        url.0
    }
}

impl AsRef<str> for RelayUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered set of relays; the first occurrence of a relay wins
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelaySet(Vec<RelayUrl>);

impl RelaySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every address, skipping the ones that do not normalize
    pub fn parse_lossy<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        inputs
            .into_iter()
            .filter_map(|s| match RelayUrl::parse(s.as_ref()) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::debug!("Skipping relay address: {}", e);
                    None
                }
            })
            .collect()
    }

    /// Parse every address, failing on the first invalid one
    pub fn parse_all<I, S>(inputs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        inputs
            .into_iter()
            .map(|s| RelayUrl::parse(s.as_ref()))
            .collect()
    }

    /// Append `url` unless already present; returns whether it was added
    pub fn push(&mut self, url: RelayUrl) -> bool {
        if self.0.contains(&url) {
            return false;
        }
        self.0.push(url);
        true
    }

    /// `self` followed by the members of `other` not already present
    pub fn union(mut self, other: &RelaySet) -> RelaySet {
        self.extend(other.iter().cloned());
        self
    }

    pub fn contains(&self, url: &RelayUrl) -> bool {
        self.0.contains(url)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RelayUrl> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[RelayUrl] {
        &self.0
    }
}

impl FromIterator<RelayUrl> for RelaySet {
    fn from_iter<T: IntoIterator<Item = RelayUrl>>(iter: T) -> Self {
        let mut set = RelaySet::new();
        set.extend(iter);
        set
    }
}

impl Extend<RelayUrl> for RelaySet {
    fn extend<T: IntoIterator<Item = RelayUrl>>(&mut self, iter: T) {
        for url in iter {
            self.push(url);
        }
    }
}

impl IntoIterator for RelaySet {
    type Item = RelayUrl;
    type IntoIter = std::vec::IntoIter<RelayUrl>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a RelaySet {
    type Item = &'a RelayUrl;
    type IntoIter = std::slice::Iter<'a, RelayUrl>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        let cases = [
            ("wss://relay.damus.io", "wss://relay.damus.io"),
            ("wss://relay.damus.io/", "wss://relay.damus.io"),
            ("WSS://Relay.Damus.IO/", "wss://relay.damus.io"),
            ("wss://nos.lol:443", "wss://nos.lol"),
            ("ws://localhost:80/", "ws://localhost"),
            ("ws://127.0.0.1:7777", "ws://127.0.0.1:7777"),
            ("wss://relay.example.com/inbox/", "wss://relay.example.com/inbox"),
            ("  wss://nos.lol#frag ", "wss://nos.lol"),
        ];

        for (input, expected) in cases {
            assert_eq!(RelayUrl::parse(input).unwrap().as_str(), expected, "{}", input);
        }
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for input in [
            "WSS://Relay.Nostr.Band/",
            "wss://relay.primal.net:443/",
            "ws://127.0.0.1:9000/path/",
        ] {
            let once = RelayUrl::parse(input).unwrap();
            let twice = RelayUrl::parse(once.as_str()).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_rejects_non_websocket() {
        assert!(RelayUrl::parse("https://relay.damus.io").is_err());
        assert!(RelayUrl::parse("relay.damus.io").is_err());
        assert!(RelayUrl::parse("").is_err());
        assert!(matches!(
            RelayUrl::parse("ftp://x"),
            Err(Error::InvalidRelayUrl(_))
        ));
    }

    #[test]
    fn test_relay_set_first_occurrence_wins() {
        let set = RelaySet::parse_lossy([
            "wss://b.example",
            "wss://a.example/",
            "not a url",
            "WSS://B.example",
        ]);

        let urls: Vec<&str> = set.iter().map(RelayUrl::as_str).collect();
        assert_eq!(urls, vec!["wss://b.example", "wss://a.example"]);
    }

    #[test]
    fn test_relay_set_union() {
        let write = RelaySet::parse_lossy(["wss://mine.example", "wss://nos.lol"]);
        let defaults = RelaySet::parse_lossy(["wss://nos.lol", "wss://relay.damus.io"]);

        let merged = write.union(&defaults);
        let urls: Vec<&str> = merged.iter().map(RelayUrl::as_str).collect();
        assert_eq!(
            urls,
            vec!["wss://mine.example", "wss://nos.lol", "wss://relay.damus.io"]
        );
    }

    #[test]
    fn test_parse_all_fails_fast() {
        assert!(RelaySet::parse_all(["wss://ok.example", "http://bad"]).is_err());
        assert_eq!(RelaySet::parse_all(["wss://ok.example"]).unwrap().len(), 1);
    }

    #[test]
    fn test_serde() {
        let url: RelayUrl = serde_json::from_str("\"wss://Nos.lol/\"").unwrap();
        assert_eq!(url.as_str(), "wss://nos.lol");
        assert_eq!(serde_json::to_string(&url).unwrap(), "\"wss://nos.lol\"");
    }
}
