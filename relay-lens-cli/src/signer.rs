//! Local key signer
//!
//! Holds a secret key in memory and signs events with it. Used by the
//! `follow` and `unfollow` commands.

use anyhow::{Context, Result};
use async_trait::async_trait;
use nostr_sdk::{Keys, Tag, Timestamp};
use relay_lens_core::{Event, Identity, Signer, SignerError};
use std::path::Path;

/// Environment variable consulted when no key file is given
pub const SECRET_KEY_ENV: &str = "RELAY_LENS_SECRET_KEY";

pub struct KeysSigner {
    keys: Keys,
}

impl KeysSigner {
    /// Parse a hex or `nsec` secret key
    pub fn from_secret(secret: &str) -> Result<Self> {
        let keys = Keys::parse(secret.trim()).context("Invalid secret key")?;
        Ok(Self { keys })
    }

    /// Read the secret key from the first non-empty line of `path`
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read secret key file: {}", path.display()))?;
        let secret = contents
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .with_context(|| format!("Secret key file is empty: {}", path.display()))?;
        Self::from_secret(secret)
    }

    /// Key file if given, else [`SECRET_KEY_ENV`]; `None` when neither is set
    pub fn load(key_file: Option<&Path>) -> Result<Option<Self>> {
        if let Some(path) = key_file {
            return Self::from_file(path).map(Some);
        }
        match std::env::var(SECRET_KEY_ENV) {
            Ok(secret) if !secret.trim().is_empty() => Self::from_secret(&secret).map(Some),
            _ => Ok(None),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::from(self.keys.public_key())
    }
}

#[async_trait]
impl Signer for KeysSigner {
    async fn public_key(&self) -> Result<Identity, SignerError> {
        Ok(self.identity())
    }

    async fn sign(&self, unsigned: Event) -> Result<Event, SignerError> {
        let tags = unsigned
            .tags
            .iter()
            .map(|tag| Tag::parse(tag.as_slice()))
            .collect::<Result<Vec<Tag>, _>>()
            .map_err(|e| SignerError::Rejected(format!("unsupported tag: {}", e)))?;

        let signed = nostr_sdk::EventBuilder::new(
            nostr_sdk::Kind::from(unsigned.kind),
            unsigned.content,
            tags,
        )
        .custom_created_at(Timestamp::from(unsigned.created_at))
        .to_event(&self.keys)
        .map_err(|e| SignerError::Rejected(e.to_string()))?;

        Ok(Event::from(signed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_lens_core::{EventBuilder, Kind, validate_signed_event};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_signed_event_is_valid() {
        let signer = KeysSigner {
            keys: Keys::generate(),
        };
        let viewer = signer.identity();

        let unsigned = EventBuilder::new()
            .kind(Kind::ContactList)
            .created_at(1_700_000_000)
            .p_tag("3bf0c63fcb93463407af97a5e5ee64fa883d107ef9e558472c4eb9aaaefa459d")
            .build();
        let signed = signer.sign(unsigned).await.unwrap();

        assert!(validate_signed_event(&signed).is_ok());
        assert_eq!(signed.pubkey.as_deref(), Some(viewer.hex()));
        assert_eq!(signed.created_at, 1_700_000_000);
        assert_eq!(signed.kind(), Kind::ContactList);
        assert_eq!(
            signed.first_tag_value("p"),
            Some("3bf0c63fcb93463407af97a5e5ee64fa883d107ef9e558472c4eb9aaaefa459d")
        );
    }

    #[test]
    fn test_from_file_skips_blank_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file).unwrap();
        writeln!(
            file,
            "  0000000000000000000000000000000000000000000000000000000000000001  "
        )
        .unwrap();
        file.flush().unwrap();

        let signer = KeysSigner::from_file(file.path()).unwrap();
        assert_eq!(
            signer.identity().hex(),
            "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
    }

    #[test]
    fn test_invalid_secret() {
        assert!(KeysSigner::from_secret("not a key").is_err());
        assert!(KeysSigner::from_file(Path::new("/nonexistent/key")).is_err());
    }
}
