//! Public-key identities

use nostr_sdk::PublicKey;
use nostr_sdk::nips::nip19::{FromBech32, ToBech32};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A user's public key, normalized to lowercase hex
///
/// Accepts either 64-character hex or a bech32 `npub1…` string. The key
/// is checked to be a valid curve point, so any `Identity` can be handed to
/// relays as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Parse a hex or npub public key
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::InvalidIdentity("empty public key".to_string()));
        }

        let key = if input.starts_with("npub1") {
            PublicKey::from_bech32(input)
                .map_err(|e| Error::InvalidIdentity(format!("{}: {}", input, e)))?
        } else {
            PublicKey::from_hex(input)?
        };

        Ok(Identity(key.to_string()))
    }

    /// Lowercase hex form used on the wire
    pub fn hex(&self) -> &str {
        &self.0
    }

    /// Bech32 `npub1…` form for display
    pub fn npub(&self) -> Result<String> {
        let key = PublicKey::from_hex(&self.0)?;
        key.to_bech32()
            .map_err(|e| Error::InvalidIdentity(e.to_string()))
    }

    /// Shortened hex for log lines
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Identity::parse(s)
    }
}

impl TryFrom<String> for Identity {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Identity::parse(&value)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

impl From<PublicKey> for Identity {
    fn from(key: PublicKey) -> Self {
        Identity(key.to_string())
    }
}
