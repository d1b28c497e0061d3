//! Typed records decoded from generic events
//!
//! Each record type decodes exactly one kind and reports why it could not
//! with a [`DecodeError`]. Callers pick the fallback; [`Record::decode`] is
//! the lenient dispatcher that logs and skips.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::{Event, Identity, Kind, RelayUrl, error::DecodeError};

/// A record that can be decoded from one event kind
pub trait Decode: Sized {
    const KIND: Kind;

    fn decode(event: &Event) -> Result<Self, DecodeError>;
}

fn expect_kind(event: &Event, kind: Kind) -> Result<(), DecodeError> {
    if event.kind() != kind {
        return Err(DecodeError::UnexpectedKind {
            expected: kind.as_u16(),
            actual: event.kind,
        });
    }
    Ok(())
}

fn author(event: &Event) -> Result<Identity, DecodeError> {
    event
        .pubkey
        .as_deref()
        .and_then(|pk| Identity::parse(pk).ok())
        .ok_or(DecodeError::InvalidAuthor)
}

/// Distinct, valid identities from every `p` tag, first occurrence order
fn tagged_identities(event: &Event) -> Vec<Identity> {
    let mut seen = HashSet::new();
    event
        .tag_values("p")
        .filter_map(|value| match Identity::parse(value) {
            Ok(identity) => Some(identity),
            Err(_) => {
                debug!("Skipping malformed p tag {:?}", value);
                None
            }
        })
        .filter(|identity| seen.insert(identity.clone()))
        .collect()
}

/// Profile metadata (kind 0)
///
/// Parsed leniently: non-string and empty values are treated as absent,
/// unknown keys are ignored. Only content that is not a JSON object fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
}

impl ProfileMetadata {
    pub fn from_content(content: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| DecodeError::MalformedContent(e.to_string()))?;
        let object = value
            .as_object()
            .ok_or_else(|| DecodeError::MalformedContent("metadata is not a JSON object".into()))?;

        let field = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Ok(ProfileMetadata {
            name: field("name"),
            display_name: field("display_name").or_else(|| field("displayName")),
            picture: field("picture"),
            about: field("about"),
        })
    }
}

impl Decode for ProfileMetadata {
    const KIND: Kind = Kind::Metadata;

    fn decode(event: &Event) -> Result<Self, DecodeError> {
        expect_kind(event, Self::KIND)?;
        Self::from_content(&event.content)
    }
}

/// Contact list (kind 3)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactList {
    pub author: Identity,
    /// Followed identities, tag order, duplicates removed
    pub contacts: Vec<Identity>,
    pub created_at: u64,
}

impl Decode for ContactList {
    const KIND: Kind = Kind::ContactList;

    fn decode(event: &Event) -> Result<Self, DecodeError> {
        expect_kind(event, Self::KIND)?;
        Ok(ContactList {
            author: author(event)?,
            contacts: tagged_identities(event),
            created_at: event.created_at,
        })
    }
}

/// Short text note (kind 1), reduced to who it mentions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextNote {
    pub id: String,
    pub author: Identity,
    pub mentions: Vec<Identity>,
    pub created_at: u64,
}

impl Decode for TextNote {
    const KIND: Kind = Kind::TextNote;

    fn decode(event: &Event) -> Result<Self, DecodeError> {
        expect_kind(event, Self::KIND)?;
        Ok(TextNote {
            id: event
                .id
                .clone()
                .ok_or_else(|| DecodeError::MalformedContent("note without id".into()))?,
            author: author(event)?,
            mentions: tagged_identities(event),
            created_at: event.created_at,
        })
    }
}

/// Reaction (kind 7)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reaction {
    pub author: Identity,
    /// Reacted-to event: the last `e` tag
    pub target: String,
    pub content: String,
}

impl Decode for Reaction {
    const KIND: Kind = Kind::Reaction;

    fn decode(event: &Event) -> Result<Self, DecodeError> {
        expect_kind(event, Self::KIND)?;
        Ok(Reaction {
            author: author(event)?,
            target: event
                .tag_values("e")
                .last()
                .ok_or(DecodeError::MissingTag("e"))?
                .to_string(),
            content: event.content.clone(),
        })
    }
}

/// Repost (kind 6)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repost {
    pub author: Identity,
    /// Reposted event: the first `e` tag
    pub target: String,
}

impl Decode for Repost {
    const KIND: Kind = Kind::Repost;

    fn decode(event: &Event) -> Result<Self, DecodeError> {
        expect_kind(event, Self::KIND)?;
        Ok(Repost {
            author: author(event)?,
            target: event
                .first_tag_value("e")
                .ok_or(DecodeError::MissingTag("e"))?
                .to_string(),
        })
    }
}

/// Zap receipt (kind 9735)
///
/// The receipt is published by the payment provider, so the sender is read
/// from the zap request embedded in the `description` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZapReceipt {
    pub sender: Option<Identity>,
    pub recipients: Vec<Identity>,
    /// Whole units (millisatoshis / 1000, floored)
    pub amount: u64,
}

impl ZapReceipt {
    /// Amount tag value in milli-units, converted to whole units
    fn amount_of(event: &Event) -> Option<u64> {
        event
            .first_tag_value("amount")
            .and_then(|msats| msats.trim().parse::<u64>().ok())
            .map(|msats| msats / 1000)
    }
}

impl Decode for ZapReceipt {
    const KIND: Kind = Kind::ZapReceipt;

    fn decode(event: &Event) -> Result<Self, DecodeError> {
        expect_kind(event, Self::KIND)?;

        let request = event
            .first_tag_value("description")
            .and_then(|description| match serde_json::from_str::<Event>(description) {
                Ok(request) => Some(request),
                Err(e) => {
                    debug!("Unparsable zap request in receipt {:?}: {}", event.id, e);
                    None
                }
            });

        let amount = Self::amount_of(event)
            .or_else(|| request.as_ref().and_then(Self::amount_of))
            .unwrap_or(0);
        let sender = request
            .as_ref()
            .and_then(|r| r.pubkey.as_deref())
            .and_then(|pk| Identity::parse(pk).ok());

        Ok(ZapReceipt {
            sender,
            recipients: tagged_identities(event),
            amount,
        })
    }
}

/// Read/write marker of a relay list entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayMarker {
    Read,
    Write,
    /// No marker: the relay is used for both
    ReadWrite,
}

impl RelayMarker {
    fn from_tag(marker: Option<&str>) -> Self {
        match marker {
            Some("read") => RelayMarker::Read,
            Some("write") => RelayMarker::Write,
            _ => RelayMarker::ReadWrite,
        }
    }

    pub fn is_write(self) -> bool {
        matches!(self, RelayMarker::Write | RelayMarker::ReadWrite)
    }
}

/// Relay list metadata (kind 10002)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayList {
    pub entries: Vec<(RelayUrl, RelayMarker)>,
}

impl RelayList {
    /// Relays the author publishes to, in list order
    pub fn write_relays(&self) -> impl Iterator<Item = &RelayUrl> {
        self.entries
            .iter()
            .filter(|(_, marker)| marker.is_write())
            .map(|(url, _)| url)
    }
}

impl Decode for RelayList {
    const KIND: Kind = Kind::RelayList;

    fn decode(event: &Event) -> Result<Self, DecodeError> {
        expect_kind(event, Self::KIND)?;

        let entries = event
            .tags_named("r")
            .filter_map(|tag| {
                let url = tag.value()?;
                match RelayUrl::parse(url) {
                    Ok(url) => Some((url, RelayMarker::from_tag(tag.get(2)))),
                    Err(e) => {
                        debug!("Skipping relay list entry: {}", e);
                        None
                    }
                }
            })
            .collect();

        Ok(RelayList { entries })
    }
}

/// Any record the engine understands
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Record {
    Metadata(ProfileMetadata),
    Contacts(ContactList),
    TextNote(TextNote),
    Repost(Repost),
    Reaction(Reaction),
    ZapReceipt(ZapReceipt),
    RelayList(RelayList),
}

impl Record {
    /// Decode by kind; unknown kinds and malformed events yield `None`
    pub fn decode(event: &Event) -> Option<Record> {
        let decoded = match event.kind() {
            Kind::Metadata => ProfileMetadata::decode(event).map(Record::Metadata),
            Kind::ContactList => ContactList::decode(event).map(Record::Contacts),
            Kind::TextNote => TextNote::decode(event).map(Record::TextNote),
            Kind::Repost => Repost::decode(event).map(Record::Repost),
            Kind::Reaction => Reaction::decode(event).map(Record::Reaction),
            Kind::ZapReceipt => ZapReceipt::decode(event).map(Record::ZapReceipt),
            Kind::RelayList => RelayList::decode(event).map(Record::RelayList),
            // Zap requests only matter embedded in a receipt
            Kind::ZapRequest | Kind::Unknown(_) => return None,
        };

        match decoded {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping {} event {:?}: {}", event.kind(), event.id, e);
                None
            }
        }
    }
}

/// Decode every event of type `T`, logging and skipping the malformed ones
pub fn decode_all<'a, T, I>(events: I) -> Vec<T>
where
    T: Decode,
    I: IntoIterator<Item = &'a Event>,
{
    events
        .into_iter()
        .filter(|event| event.kind() == T::KIND)
        .filter_map(|event| match T::decode(event) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping {} event {:?}: {}", T::KIND, event.id, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventBuilder;
    use serde_json::json;

    const ALICE: &str = "82341f882b6eabcd2ba7f1ef90aad961cf074af15b9ef44a09f9d2a8fbfbe6a2";
    const BOB: &str = "3bf0c63fcb93463407af97a5e5ee64fa883d107ef9e558472c4eb9aaaefa459d";
    const CAROL: &str = "32e1827635450ebb3c5a7d12c1f8e7b2b514439ac10a67eef3d9fd9c5c68e245";

    fn id(hex: &str) -> Identity {
        Identity::parse(hex).unwrap()
    }

    #[test]
    fn test_metadata_lenient_parse() {
        let event = EventBuilder::new()
            .pubkey(ALICE)
            .kind(Kind::Metadata)
            .content(r#"{"name":"","display_name":"Alice","picture":42,"about":"hi","extra":true}"#)
            .build();

        let metadata = ProfileMetadata::decode(&event).unwrap();
        assert_eq!(metadata.name, None);
        assert_eq!(metadata.display_name.as_deref(), Some("Alice"));
        assert_eq!(metadata.picture, None);
        assert_eq!(metadata.about.as_deref(), Some("hi"));
    }

    #[test]
    fn test_metadata_malformed() {
        assert!(matches!(
            ProfileMetadata::from_content("{not json"),
            Err(DecodeError::MalformedContent(_))
        ));
        assert!(matches!(
            ProfileMetadata::from_content("[1,2]"),
            Err(DecodeError::MalformedContent(_))
        ));
    }

    #[test]
    fn test_wrong_kind() {
        let event = EventBuilder::new().pubkey(ALICE).kind(Kind::TextNote).build();
        assert_eq!(
            ContactList::decode(&event),
            Err(DecodeError::UnexpectedKind {
                expected: 3,
                actual: 1
            })
        );
    }

    #[test]
    fn test_contact_list_distinct_in_order() {
        let event = EventBuilder::new()
            .pubkey(ALICE)
            .kind(Kind::ContactList)
            .created_at(77)
            .p_tag(CAROL)
            .p_tag(BOB)
            .p_tag(CAROL)
            .p_tag("not-a-key")
            .add_tag(vec!["t", "nostr"])
            .build();

        let list = ContactList::decode(&event).unwrap();
        assert_eq!(list.author, id(ALICE));
        assert_eq!(list.contacts, vec![id(CAROL), id(BOB)]);
        assert_eq!(list.created_at, 77);
    }

    #[test]
    fn test_reaction_uses_last_e_tag_and_repost_first() {
        let reaction = EventBuilder::new()
            .pubkey(ALICE)
            .kind(Kind::Reaction)
            .content("+")
            .e_tag("root")
            .e_tag("target")
            .build();
        assert_eq!(Reaction::decode(&reaction).unwrap().target, "target");

        let repost = EventBuilder::new()
            .pubkey(ALICE)
            .kind(Kind::Repost)
            .e_tag("reposted")
            .e_tag("other")
            .build();
        assert_eq!(Repost::decode(&repost).unwrap().target, "reposted");

        let bare = EventBuilder::new().pubkey(ALICE).kind(Kind::Reaction).build();
        assert_eq!(Reaction::decode(&bare), Err(DecodeError::MissingTag("e")));
    }

    #[test]
    fn test_zap_direct_amount() {
        let receipt = EventBuilder::new()
            .pubkey(CAROL)
            .kind(Kind::ZapReceipt)
            .p_tag(BOB)
            .add_tag(vec!["amount", "5000"])
            .build();

        let zap = ZapReceipt::decode(&receipt).unwrap();
        assert_eq!(zap.amount, 5);
        assert_eq!(zap.recipients, vec![id(BOB)]);
        assert_eq!(zap.sender, None);
    }

    #[test]
    fn test_zap_amount_from_embedded_request() {
        let request = json!({
            "pubkey": ALICE,
            "created_at": 1,
            "kind": 9734,
            "tags": [["p", BOB], ["amount", "21000"]],
            "content": ""
        });
        let receipt = EventBuilder::new()
            .pubkey(CAROL)
            .kind(Kind::ZapReceipt)
            .p_tag(BOB)
            .add_tag(vec!["description".to_string(), request.to_string()])
            .build();

        let zap = ZapReceipt::decode(&receipt).unwrap();
        assert_eq!(zap.amount, 21);
        assert_eq!(zap.sender, Some(id(ALICE)));
    }

    fn receipt_with_request(direct_amount: &str, request_msats: &str) -> Event {
        let request = json!({
            "pubkey": ALICE,
            "created_at": 1,
            "kind": 9734,
            "tags": [["p", BOB], ["amount", request_msats]],
            "content": ""
        });
        EventBuilder::new()
            .pubkey(CAROL)
            .kind(Kind::ZapReceipt)
            .p_tag(BOB)
            .add_tag(vec!["amount", direct_amount])
            .add_tag(vec!["description".to_string(), request.to_string()])
            .build()
    }

    #[test]
    fn test_zap_direct_amount_takes_precedence() {
        let zap = ZapReceipt::decode(&receipt_with_request("5000", "21000")).unwrap();
        assert_eq!(zap.amount, 5);
        assert_eq!(zap.sender, Some(id(ALICE)));
    }

    #[test]
    fn test_zap_unparsable_direct_amount_uses_request() {
        let zap = ZapReceipt::decode(&receipt_with_request("abc", "21000")).unwrap();
        assert_eq!(zap.amount, 21);
    }

    #[test]
    fn test_zap_amount_floors_and_defaults_to_zero() {
        let floored = EventBuilder::new()
            .kind(Kind::ZapReceipt)
            .add_tag(vec!["amount", "1999"])
            .build();
        assert_eq!(ZapReceipt::decode(&floored).unwrap().amount, 1);

        let garbage = EventBuilder::new()
            .kind(Kind::ZapReceipt)
            .add_tag(vec!["amount", "lots"])
            .add_tag(vec!["description", "{broken"])
            .build();
        let zap = ZapReceipt::decode(&garbage).unwrap();
        assert_eq!(zap.amount, 0);
        assert_eq!(zap.sender, None);
    }

    #[test]
    fn test_relay_list_markers() {
        let event = EventBuilder::new()
            .pubkey(ALICE)
            .kind(Kind::RelayList)
            .add_tag(vec!["r", "wss://write.example", "write"])
            .add_tag(vec!["r", "wss://read.example", "read"])
            .add_tag(vec!["r", "wss://both.example/"])
            .add_tag(vec!["r", "https://not-a-relay.example"])
            .add_tag(vec!["r", "wss://odd.example", "sometimes"])
            .build();

        let list = RelayList::decode(&event).unwrap();
        assert_eq!(list.entries.len(), 4);

        let writes: Vec<&str> = list.write_relays().map(RelayUrl::as_str).collect();
        assert_eq!(
            writes,
            vec!["wss://write.example", "wss://both.example", "wss://odd.example"]
        );
    }

    #[test]
    fn test_record_dispatch() {
        let note = EventBuilder::new()
            .id("n1")
            .pubkey(ALICE)
            .kind(Kind::TextNote)
            .p_tag(BOB)
            .build();
        match Record::decode(&note) {
            Some(Record::TextNote(note)) => assert_eq!(note.mentions, vec![id(BOB)]),
            other => panic!("unexpected {:?}", other),
        }

        let unknown = EventBuilder::new().pubkey(ALICE).kind(30023u16).build();
        assert_eq!(Record::decode(&unknown), None);

        let broken = EventBuilder::new().pubkey(ALICE).kind(Kind::Metadata).content("nope").build();
        assert_eq!(Record::decode(&broken), None);
    }

    #[test]
    fn test_decode_all_skips_other_kinds_and_broken() {
        let events = vec![
            EventBuilder::new().id("1").pubkey(ALICE).kind(Kind::TextNote).build(),
            EventBuilder::new().id("2").pubkey(ALICE).kind(Kind::Reaction).build(),
            EventBuilder::new().id("3").pubkey("bad").kind(Kind::TextNote).build(),
        ];

        let notes: Vec<TextNote> = decode_all(&events);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, "1");
    }
}
