//! Nostr event envelope

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::kind::Kind;

/// Positional tag attached to an event
///
/// The first element names the tag, the rest are positional parameters:
///
/// - `["p", <pubkey>]` references an identity
/// - `["e", <event id>]` references another event
/// - `["r", <relay url>, "write"]` declares a relay
///
/// Tags are kept verbatim so unknown tags survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag(pub Vec<String>);

impl Tag {
    /// Build a tag from any string-like values
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Tag(values.into_iter().map(Into::into).collect())
    }

    /// Tag name (first element)
    pub fn name(&self) -> Option<&str> {
        self.get(0)
    }

    /// First positional parameter (second element)
    pub fn value(&self) -> Option<&str> {
        self.get(1)
    }

    /// Element at `index`
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Whether this tag is named `name`
    pub fn is(&self, name: &str) -> bool {
        self.name() == Some(name)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Generic event envelope as exchanged with relays
///
/// `id`, `pubkey` and `sig` are optional so the same type carries both
/// unsigned drafts and signed events.
///
/// ```json
/// {
///   "id": "4376c65d2f232afbe9b882a35baa4f6fe8667c4e684749af565f981833ed6a65",
///   "pubkey": "6e468422dfb74a5738702a8823b9b28168abab8655faacb6853cd0ee15deee93",
///   "created_at": 1673347337,
///   "kind": 3,
///   "tags": [["p", "82341f882b6eabcd2ba7f1ef90aad961cf074af15b9ef44a09f9d2a8fbfbe6a2"]],
///   "content": "",
///   "sig": "908a15e46fb4d8675bab026fc230a0e3542bfade63da02d542fb78b2a8513fcd..."
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Lowercase hex SHA-256 of the canonical serialization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Author public key (hex)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,
    /// Unix timestamp in seconds
    pub created_at: u64,
    /// Kind number
    pub kind: u16,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub content: String,
    /// Schnorr signature over the id (hex)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
}

impl Event {
    /// Typed view of the kind number
    pub fn kind(&self) -> Kind {
        Kind::from(self.kind)
    }

    /// Tags whose first element is `name`, in original order
    pub fn tags_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Tag> + 'a {
        self.tags.iter().filter(move |tag| tag.is(name))
    }

    /// Second element of every tag named `name`
    pub fn tag_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.tags_named(name).filter_map(Tag::value)
    }

    /// Second element of the first tag named `name`
    pub fn first_tag_value<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        self.tag_values(name).next()
    }

    /// Canonical NIP-01 id: sha256 of `[0, pubkey, created_at, kind, tags, content]`
    ///
    /// Returns `None` when the event has no author yet.
    pub fn compute_id(&self) -> Option<String> {
        let pubkey = self.pubkey.as_deref()?;
        let canonical = serde_json::json!([
            0,
            pubkey,
            self.created_at,
            self.kind,
            self.tags,
            self.content
        ]);
        let digest = Sha256::digest(canonical.to_string().as_bytes());
        Some(hex::encode(digest))
    }

    /// Whether `id`, `pubkey` and `sig` are all present
    pub fn is_signed(&self) -> bool {
        self.id.is_some() && self.pubkey.is_some() && self.sig.is_some()
    }
}
