//! Builder pattern for Event construction

use crate::event::{Event, Tag};

/// Fluent builder for constructing Event instances
///
/// # Example
///
/// ```
/// use relay_lens_core::{EventBuilder, Kind};
///
/// let event = EventBuilder::new()
///     .pubkey("def456")
///     .created_at(1234567890)
///     .kind(Kind::ContactList)
///     .p_tag("82341f882b6eabcd2ba7f1ef90aad961cf074af15b9ef44a09f9d2a8fbfbe6a2")
///     .add_tag(vec!["t", "nostr"])
///     .build();
///
/// assert_eq!(event.kind, 3);
/// assert_eq!(event.tags.len(), 2);
/// assert!(event.id.is_none());
/// ```
#[derive(Debug, Default)]
pub struct EventBuilder {
    id: Option<String>,
    pubkey: Option<String>,
    created_at: u64,
    kind: u16,
    tags: Vec<Tag>,
    content: String,
    sig: Option<String>,
}

impl EventBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the event ID
    pub fn id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the public key
    pub fn pubkey<S: Into<String>>(mut self, pubkey: S) -> Self {
        self.pubkey = Some(pubkey.into());
        self
    }

    /// Set the creation timestamp
    pub fn created_at(mut self, timestamp: u64) -> Self {
        self.created_at = timestamp;
        self
    }

    /// Set the event kind
    pub fn kind<K: Into<u16>>(mut self, kind: K) -> Self {
        self.kind = kind.into();
        self
    }

    /// Set the content
    pub fn content<S: Into<String>>(mut self, content: S) -> Self {
        self.content = content.into();
        self
    }

    /// Set the signature
    pub fn sig<S: Into<String>>(mut self, sig: S) -> Self {
        self.sig = Some(sig.into());
        self
    }

    /// Add a single tag
    ///
    /// Accepts any iterator of string-like values
    pub fn add_tag<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.push(Tag::new(values));
        self
    }

    /// Add a `["p", pubkey]` tag
    pub fn p_tag<S: Into<String>>(self, pubkey: S) -> Self {
        self.add_tag([String::from("p"), pubkey.into()])
    }

    /// Add an `["e", event_id]` tag
    pub fn e_tag<S: Into<String>>(self, event_id: S) -> Self {
        self.add_tag([String::from("e"), event_id.into()])
    }

    /// Replace all tags at once
    pub fn tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = tags;
        self
    }

    /// Build the Event
    pub fn build(self) -> Event {
        Event {
            id: self.id,
            pubkey: self.pubkey,
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags,
            content: self.content,
            sig: self.sig,
        }
    }
}
