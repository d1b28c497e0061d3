//! Deduplicating event collection

use crate::Event;
use std::collections::HashSet;
use std::iter::FromIterator;

/// Insertion-ordered set of events, unique by id
///
/// Relays routinely return the same event, so every multi-relay merge goes
/// through this type. Events without an id cannot be compared and are
/// always kept.
///
/// # Example
///
/// ```
/// use relay_lens_core::{EventBuilder, EventSet};
///
/// let events = vec![
///     EventBuilder::new().id("1").build(),
///     EventBuilder::new().id("2").build(),
///     EventBuilder::new().id("1").build(),
/// ];
///
/// let set: EventSet = events.into_iter().collect();
/// assert_eq!(set.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventSet {
    events: Vec<Event>,
    seen: HashSet<String>,
}

impl EventSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event, returning `false` if its id was already present
    pub fn insert(&mut self, event: Event) -> bool {
        if let Some(id) = &event.id {
            if !self.seen.insert(id.clone()) {
                return false;
            }
        }
        self.events.push(event);
        true
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    /// Event with the highest `created_at`; ties go to the first inserted
    pub fn newest(&self) -> Option<&Event> {
        newest_of(&self.events)
    }

    pub fn into_vec(self) -> Vec<Event> {
        self.events
    }
}

/// Event with the highest `created_at`; ties go to the earliest yielded
pub fn newest_of<'a, I>(events: I) -> Option<&'a Event>
where
    I: IntoIterator<Item = &'a Event>,
{
    events
        .into_iter()
        .reduce(|best, e| if e.created_at > best.created_at { e } else { best })
}

impl FromIterator<Event> for EventSet {
    fn from_iter<T: IntoIterator<Item = Event>>(iter: T) -> Self {
        let mut set = EventSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<Event> for EventSet {
    fn extend<T: IntoIterator<Item = Event>>(&mut self, iter: T) {
        for event in iter {
            self.insert(event);
        }
    }
}

impl IntoIterator for EventSet {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a EventSet {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
