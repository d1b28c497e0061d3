//! Relay transport capability
//!
//! The engine never talks to sockets directly. It is handed a
//! [`RelayTransport`] and issues one call per relay; the transport decides
//! how connections are made and kept. [`crate::ConnectionPool`] speaks
//! WebSocket, [`MemoryTransport`] serves events from memory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::{Event, Filter, RelayUrl, error::TransportError};

/// One request/response round-trip against a single relay
#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// Send `filter` and collect every stored event until end-of-stored-events
    async fn fetch(&self, relay: &RelayUrl, filter: &Filter) -> Result<Vec<Event>, TransportError>;

    /// Send a signed event and wait for the relay's acknowledgement
    async fn publish(&self, relay: &RelayUrl, event: &Event) -> Result<(), TransportError>;
}

/// How an in-memory relay responds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayBehavior {
    /// Answers immediately
    Online,
    /// Refuses connections
    Offline,
    /// Accepts the call and never answers
    Unresponsive,
    /// Answers every request with CLOSED / negative OK
    Rejecting,
    /// Answers after the given delay
    Delayed(Duration),
}

#[derive(Debug, Clone)]
struct MemoryRelay {
    behavior: RelayBehavior,
    events: Vec<Event>,
}

impl MemoryRelay {
    fn online() -> Self {
        MemoryRelay {
            behavior: RelayBehavior::Online,
            events: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    relays: HashMap<RelayUrl, MemoryRelay>,
    /// Served by every relay that was not registered explicitly
    catch_all: Option<Vec<Event>>,
    requests: Vec<(RelayUrl, Filter)>,
    published: Vec<(RelayUrl, Event)>,
}

/// In-memory relay network
///
/// Used by tests and by offline replay of event dumps. Relays are
/// registered with a [`RelayBehavior`]; unknown relays refuse connections
/// unless the transport was created with [`MemoryTransport::replay`].
#[derive(Default)]
pub struct MemoryTransport {
    state: Mutex<MemoryState>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every relay, registered or not, serves `events`
    pub fn replay<I: IntoIterator<Item = Event>>(events: I) -> Self {
        let transport = Self::new();
        transport.lock().catch_all = Some(events.into_iter().collect());
        transport
    }

    /// Register `relay` (if needed) and set how it behaves
    pub fn set_behavior(&self, relay: &RelayUrl, behavior: RelayBehavior) {
        self.lock()
            .relays
            .entry(relay.clone())
            .or_insert_with(MemoryRelay::online)
            .behavior = behavior;
    }

    /// Register `relay` (if needed) and store `events` on it
    pub fn insert_events<I: IntoIterator<Item = Event>>(&self, relay: &RelayUrl, events: I) {
        self.lock()
            .relays
            .entry(relay.clone())
            .or_insert_with(MemoryRelay::online)
            .events
            .extend(events);
    }

    /// Every `(relay, filter)` pair fetched so far, in call order
    pub fn requests(&self) -> Vec<(RelayUrl, Filter)> {
        self.lock().requests.clone()
    }

    /// Every `(relay, event)` pair that was accepted by a relay
    pub fn published(&self) -> Vec<(RelayUrl, Event)> {
        self.lock().published.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn behavior(&self, relay: &RelayUrl) -> Option<RelayBehavior> {
        let state = self.lock();
        match state.relays.get(relay) {
            Some(r) => Some(r.behavior),
            None if state.catch_all.is_some() => Some(RelayBehavior::Online),
            None => None,
        }
    }

    /// Apply `behavior` and return once the relay would have answered
    async fn respond(relay: &RelayUrl, behavior: Option<RelayBehavior>) -> Result<(), TransportError> {
        match behavior {
            None | Some(RelayBehavior::Offline) => Err(TransportError::Connect {
                relay: relay.to_string(),
                reason: "connection refused".to_string(),
            }),
            Some(RelayBehavior::Unresponsive) => std::future::pending().await,
            Some(RelayBehavior::Rejecting) => {
                Err(TransportError::Rejected("blocked: not accepting requests".to_string()))
            }
            Some(RelayBehavior::Delayed(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            Some(RelayBehavior::Online) => Ok(()),
        }
    }
}

impl fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("MemoryTransport")
            .field("relays", &state.relays.len())
            .field("catch_all", &state.catch_all.as_ref().map(Vec::len))
            .field("published", &state.published.len())
            .finish()
    }
}

#[async_trait]
impl RelayTransport for MemoryTransport {
    async fn fetch(&self, relay: &RelayUrl, filter: &Filter) -> Result<Vec<Event>, TransportError> {
        self.lock().requests.push((relay.clone(), filter.clone()));

        let behavior = self.behavior(relay);
        Self::respond(relay, behavior).await?;

        let state = self.lock();
        let stored = match state.relays.get(relay) {
            Some(r) => &r.events,
            None => state.catch_all.as_deref().unwrap_or_default(),
        };

        // Relays answer newest first and apply `limit` after sorting
        let mut matched: Vec<Event> = stored.iter().filter(|e| filter.matches(e)).cloned().collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = filter.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    async fn publish(&self, relay: &RelayUrl, event: &Event) -> Result<(), TransportError> {
        let behavior = self.behavior(relay);
        Self::respond(relay, behavior).await?;

        let mut state = self.lock();
        if let Some(r) = state.relays.get_mut(relay) {
            r.events.push(event.clone());
        }
        state.published.push((relay.clone(), event.clone()));
        Ok(())
    }
}
