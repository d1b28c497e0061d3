//! Relay query filters
//!
//! Every condition set on a filter must hold for an event to match. A list
//! condition matches when the event's value is any element of the list.
//! Unset conditions match everything.

use serde::{Deserialize, Serialize};

use crate::{Event, Identity, Kind};

/// Query filter in the shape relays expect
///
/// ```json
/// {"authors": ["<hex>"], "kinds": [3], "#p": ["<hex>"], "since": 1700000000, "limit": 1}
/// ```
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Filter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kinds: Option<Vec<u16>>,
    #[serde(rename = "#e", skip_serializing_if = "Option::is_none")]
    pub e: Option<Vec<String>>,
    #[serde(rename = "#p", skip_serializing_if = "Option::is_none")]
    pub p: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn author(self, author: &Identity) -> Self {
        self.authors([author])
    }

    pub fn authors<'a, I>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = &'a Identity>,
    {
        self.authors = Some(authors.into_iter().map(|a| a.hex().to_string()).collect());
        self
    }

    pub fn kind(self, kind: Kind) -> Self {
        self.kinds([kind])
    }

    pub fn kinds<I: IntoIterator<Item = Kind>>(mut self, kinds: I) -> Self {
        self.kinds = Some(kinds.into_iter().map(Kind::as_u16).collect());
        self
    }

    /// Events referencing any of these identities in a `p` tag
    pub fn pubkeys<'a, I>(mut self, pubkeys: I) -> Self
    where
        I: IntoIterator<Item = &'a Identity>,
    {
        self.p = Some(pubkeys.into_iter().map(|p| p.hex().to_string()).collect());
        self
    }

    pub fn since(mut self, timestamp: u64) -> Self {
        self.since = Some(timestamp);
        self
    }

    pub fn until(mut self, timestamp: u64) -> Self {
        self.until = Some(timestamp);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `event` satisfies every condition of this filter
    ///
    /// `limit` is not a per-event condition and is ignored here.
    pub fn matches(&self, event: &Event) -> bool {
        fn in_list(list: &Option<Vec<String>>, value: Option<&str>) -> bool {
            match list {
                None => true,
                Some(list) => value.is_some_and(|v| list.iter().any(|x| x == v)),
            }
        }

        fn tag_in_list(list: &Option<Vec<String>>, event: &Event, name: &str) -> bool {
            match list {
                None => true,
                Some(list) => event.tag_values(name).any(|v| list.iter().any(|x| x == v)),
            }
        }

        in_list(&self.ids, event.id.as_deref())
            && in_list(&self.authors, event.pubkey.as_deref())
            && self.kinds.as_ref().is_none_or(|k| k.contains(&event.kind))
            && tag_in_list(&self.e, event, "e")
            && tag_in_list(&self.p, event, "p")
            && self.since.is_none_or(|since| event.created_at >= since)
            && self.until.is_none_or(|until| event.created_at <= until)
    }
}
