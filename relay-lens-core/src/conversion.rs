//! Conversion between JSON, nostr-sdk events and the engine's Event
//!
//! Relays hand out plain JSON, the local signer works in nostr-sdk types, and
//! everything inside the engine uses [`Event`]. The trait impls here are the
//! only bridges between the three.

use crate::{
    Event, Tag,
    error::{Error, Result},
};

/// Convert from a nostr-sdk Event (infallible)
impl From<nostr_sdk::Event> for Event {
    fn from(nostr_event: nostr_sdk::Event) -> Self {
        Event {
            id: Some(nostr_event.id.to_hex()),
            pubkey: Some(nostr_event.pubkey.to_string()),
            created_at: nostr_event.created_at.as_u64(),
            kind: nostr_event.kind.as_u16(),
            tags: nostr_event
                .tags
                .iter()
                .map(|tag| Tag::new(tag.as_vec().iter().map(|s| s.to_string())))
                .collect(),
            content: nostr_event.content.clone(),
            sig: Some(nostr_event.sig.to_string()),
        }
    }
}

/// Parse an event from a JSON string slice
///
/// Only the envelope shape is checked here; authenticity checks live in
/// [`crate::validate_signed_event`].
///
/// # Example
///
/// ```
/// use relay_lens_core::Event;
/// use std::convert::TryFrom;
///
/// let json = r#"{"pubkey":"def","created_at":1234567890,"kind":1,"tags":[],"content":"Hello"}"#;
/// let event = Event::try_from(json)?;
/// assert_eq!(event.content, "Hello");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
impl TryFrom<&str> for Event {
    type Error = Error;

    fn try_from(json: &str) -> Result<Self> {
        // serde's own message for an oversized kind is unhelpful
        if let Some(kind) = serde_json::from_str::<serde_json::Value>(json)
            .ok()
            .and_then(|v| v.get("kind").and_then(|k| k.as_i64()))
            .filter(|k| !(0..=i64::from(u16::MAX)).contains(k))
        {
            return Err(Error::InvalidInput(format!(
                "Event kind {} is out of valid range (0-65535)",
                kind
            )));
        }

        Ok(serde_json::from_str(json)?)
    }
}

impl TryFrom<String> for Event {
    type Error = Error;

    fn try_from(json: String) -> Result<Self> {
        Event::try_from(json.as_str())
    }
}

/// Serialize an event to compact JSON
impl TryFrom<&Event> for String {
    type Error = Error;

    fn try_from(event: &Event) -> Result<Self> {
        Ok(serde_json::to_string(event)?)
    }
}

/// Convenience wrapper around `Event::try_from()`
pub fn event_from_json(json: &str) -> Result<Event> {
    Event::try_from(json)
}

/// Convenience wrapper around `String::try_from()`
pub fn event_to_json(event: &Event) -> Result<String> {
    String::try_from(event)
}
