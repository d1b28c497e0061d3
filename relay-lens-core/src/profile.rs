//! Profile and contact assembly

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::warn;

use crate::{
    Event, Identity,
    decode::{ContactList, Decode, ProfileMetadata},
};

/// A user's profile with their contact count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub pubkey: Identity,
    pub npub: String,
    /// Falls back to `display_name` when the metadata has no `name`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(rename = "contactsCount")]
    pub contacts_count: usize,
    /// When the contact list was last published
    #[serde(rename = "lastUpdated", skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Profile with nothing but the identity filled in
    pub fn identity_only(identity: &Identity) -> Self {
        UserProfile {
            pubkey: identity.clone(),
            npub: npub_of(identity),
            name: None,
            display_name: None,
            picture: None,
            about: None,
            contacts_count: 0,
            last_updated: None,
        }
    }

    /// `lastUpdated` rendered like `October 19, 2026, 3:04 PM` (UTC)
    pub fn last_updated_display(&self) -> Option<String> {
        self.last_updated
            .map(|at| at.format("%B %-d, %Y, %-I:%M %p").to_string())
    }

    /// Best human-readable label
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.npub)
    }
}

/// A followed identity's profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactProfile {
    pub pubkey: Identity,
    pub npub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
}

impl ContactProfile {
    pub fn identity_only(identity: &Identity) -> Self {
        ContactProfile {
            pubkey: identity.clone(),
            npub: npub_of(identity),
            name: None,
            display_name: None,
            picture: None,
            about: None,
        }
    }

    fn with_metadata(identity: &Identity, metadata: ProfileMetadata) -> Self {
        ContactProfile {
            name: metadata.name.or_else(|| metadata.display_name.clone()),
            display_name: metadata.display_name,
            picture: metadata.picture,
            about: metadata.about,
            ..ContactProfile::identity_only(identity)
        }
    }

    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.npub)
    }
}

fn npub_of(identity: &Identity) -> String {
    identity
        .npub()
        .unwrap_or_else(|_| identity.hex().to_string())
}

fn decode_metadata(identity: &Identity, event: &Event) -> Option<ProfileMetadata> {
    match ProfileMetadata::decode(event) {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            warn!("Ignoring metadata of {}: {}", identity.short(), e);
            None
        }
    }
}

/// Build a user profile from their newest metadata and contact list events
///
/// Either event may be missing or malformed; the profile then carries only
/// what could be decoded.
pub fn assemble_user_profile(
    identity: &Identity,
    metadata: Option<&Event>,
    contacts: Option<&Event>,
) -> UserProfile {
    let mut profile = UserProfile::identity_only(identity);

    if let Some(metadata) = metadata.and_then(|event| decode_metadata(identity, event)) {
        profile.name = metadata.name.or_else(|| metadata.display_name.clone());
        profile.display_name = metadata.display_name;
        profile.picture = metadata.picture;
        profile.about = metadata.about;
    }

    if let Some(event) = contacts {
        match ContactList::decode(event) {
            Ok(list) => {
                profile.contacts_count = list.contacts.len();
                profile.last_updated = i64::try_from(list.created_at)
                    .ok()
                    .and_then(|secs| DateTime::from_timestamp(secs, 0));
            }
            Err(e) => warn!("Ignoring contact list of {}: {}", identity.short(), e),
        }
    }

    profile
}

/// One profile per requested identity, in request order
///
/// The newest metadata event per author wins; events by authors that were
/// not requested are ignored. Identities without usable metadata get an
/// identity-only record, and duplicate requests collapse into one entry.
pub fn assemble_contact_profiles<'a, I>(identities: &[Identity], metadata: I) -> Vec<ContactProfile>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut newest: HashMap<String, &Event> = HashMap::new();
    for event in metadata {
        let Some(author) = event.pubkey.as_deref() else {
            continue;
        };
        let author = author.to_ascii_lowercase();
        match newest.get(&author) {
            Some(current) if current.created_at >= event.created_at => {}
            _ => {
                newest.insert(author, event);
            }
        }
    }

    let mut seen = HashSet::new();
    identities
        .iter()
        .filter(|identity| seen.insert(*identity))
        .map(|identity| {
            newest
                .get(identity.hex())
                .and_then(|event| decode_metadata(identity, event))
                .map(|metadata| ContactProfile::with_metadata(identity, metadata))
                .unwrap_or_else(|| ContactProfile::identity_only(identity))
        })
        .collect()
}
