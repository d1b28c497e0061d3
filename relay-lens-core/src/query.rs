//! Fan-out query execution
//!
//! The same filter goes to every relay at once. Each per-relay call is
//! bounded by the executor's timeout; a relay that fails or times out
//! contributes nothing and never fails the whole query.

use futures_util::future::join_all;
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::{
    Event, EventSet, Filter, RelaySet, RelayTransport, RelayUrl, error::TransportError,
    iter::newest_of,
};

/// Most keys put in one `authors` or `#p` list; relays cap filter sizes
pub const AUTHORS_PER_QUERY: usize = 250;

/// Runs one filter against many relays concurrently
#[derive(Clone)]
pub struct QueryExecutor {
    transport: Arc<dyn RelayTransport>,
    timeout: Duration,
}

impl QueryExecutor {
    pub fn new(transport: Arc<dyn RelayTransport>, timeout: Duration) -> Self {
        QueryExecutor { transport, timeout }
    }

    pub fn transport(&self) -> &Arc<dyn RelayTransport> {
        &self.transport
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Every matching event from every relay, deduplicated by id
    ///
    /// Waits until each relay has answered, failed, or timed out. Answers
    /// are merged in relay order once all calls have settled, so the result
    /// does not depend on which relay answered first.
    pub async fn query(&self, relays: &RelaySet, filter: &Filter) -> EventSet {
        let mut pending: FuturesUnordered<_> = relays
            .iter()
            .enumerate()
            .map(|(index, relay)| self.fetch_one(index, relay, filter))
            .collect();

        let mut answers = Vec::with_capacity(relays.len());
        while let Some((index, relay, result)) = pending.next().await {
            match result {
                Ok(events) => {
                    debug!("{} returned {} events", relay, events.len());
                    answers.push((index, events));
                }
                Err(e) => debug!("{} contributed nothing: {}", relay, e),
            }
        }

        answers.sort_by_key(|(index, _)| *index);
        let merged: EventSet = answers.into_iter().flat_map(|(_, events)| events).collect();
        debug!(
            "Query over {} relays merged into {} events",
            relays.len(),
            merged.len()
        );
        merged
    }

    /// Several filters over the same relays, merged in filter order
    pub async fn query_all(&self, relays: &RelaySet, filters: &[Filter]) -> EventSet {
        join_all(filters.iter().map(|filter| self.query(relays, filter)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Newest matching event across every relay
    ///
    /// For replaceable records (metadata, contact lists, relay lists) where a
    /// stale copy on a fast relay must not shadow a newer one elsewhere.
    pub async fn query_newest(&self, relays: &RelaySet, filter: &Filter) -> Option<Event> {
        self.query(relays, filter).await.newest().cloned()
    }

    /// Newest event of the first relay that answers with at least one match
    ///
    /// Remaining in-flight calls are dropped as soon as a match arrives.
    /// Returns `None` when every relay came back empty, failed, or timed out.
    pub async fn query_first(&self, relays: &RelaySet, filter: &Filter) -> Option<Event> {
        let mut pending: FuturesUnordered<_> = relays
            .iter()
            .enumerate()
            .map(|(index, relay)| self.fetch_one(index, relay, filter))
            .collect();

        while let Some((_, relay, result)) = pending.next().await {
            match result {
                Ok(events) if !events.is_empty() => {
                    debug!("{} answered first with {} events", relay, events.len());
                    return newest_of(&events).cloned();
                }
                Ok(_) => debug!("{} had no match", relay),
                Err(e) => debug!("{} contributed nothing: {}", relay, e),
            }
        }

        None
    }

    async fn fetch_one<'a>(
        &self,
        index: usize,
        relay: &'a RelayUrl,
        filter: &Filter,
    ) -> (usize, &'a RelayUrl, Result<Vec<Event>, TransportError>) {
        let result = match tokio::time::timeout(self.timeout, self.transport.fetch(relay, filter)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        };
        (index, relay, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventBuilder, Kind, MemoryTransport, RelayBehavior};
    use std::time::Instant;

    fn relay(url: &str) -> RelayUrl {
        RelayUrl::parse(url).unwrap()
    }

    fn note(id: &str, created_at: u64) -> Event {
        EventBuilder::new()
            .id(id)
            .pubkey("author")
            .kind(Kind::TextNote)
            .created_at(created_at)
            .build()
    }

    #[tokio::test]
    async fn test_query_merges_and_dedups() {
        let transport = Arc::new(MemoryTransport::new());
        let (a, b) = (relay("wss://a.example"), relay("wss://b.example"));
        transport.insert_events(&a, vec![note("1", 1), note("2", 2)]);
        transport.insert_events(&b, vec![note("2", 2), note("3", 3)]);

        let executor = QueryExecutor::new(transport, Duration::from_millis(200));
        let relays: RelaySet = vec![a, b].into_iter().collect();
        let events = executor.query(&relays, &Filter::new()).await;

        let mut ids: Vec<_> = events.iter().map(|e| e.id.clone().unwrap()).collect();
        ids.sort();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_query_survives_failures_and_timeouts() {
        let transport = Arc::new(MemoryTransport::new());
        let good = relay("wss://good.example");
        let hanging = relay("wss://hanging.example");
        let offline = relay("wss://offline.example");
        transport.insert_events(&good, vec![note("1", 1)]);
        transport.set_behavior(&hanging, RelayBehavior::Unresponsive);
        transport.set_behavior(&offline, RelayBehavior::Offline);

        let executor = QueryExecutor::new(transport, Duration::from_millis(100));
        let relays: RelaySet = vec![hanging, offline, good].into_iter().collect();

        let started = Instant::now();
        let events = executor.query(&relays, &Filter::new()).await;
        assert_eq!(events.len(), 1);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_query_empty_relay_set() {
        let executor = QueryExecutor::new(Arc::new(MemoryTransport::new()), Duration::from_millis(50));
        assert!(executor.query(&RelaySet::new(), &Filter::new()).await.is_empty());
        assert!(executor.query_first(&RelaySet::new(), &Filter::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_query_first_skips_empty_and_slow_relays() {
        let transport = Arc::new(MemoryTransport::new());
        let empty = relay("wss://empty.example");
        let slow = relay("wss://slow.example");
        let fast = relay("wss://fast.example");
        transport.set_behavior(&empty, RelayBehavior::Online);
        transport.set_behavior(&slow, RelayBehavior::Unresponsive);
        transport.insert_events(&fast, vec![note("old", 1), note("new", 9)]);

        let executor = QueryExecutor::new(transport, Duration::from_secs(5));
        let relays: RelaySet = vec![empty, slow, fast].into_iter().collect();

        let started = Instant::now();
        let first = executor.query_first(&relays, &Filter::new()).await.unwrap();
        assert_eq!(first.id.as_deref(), Some("new"));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_query_first_none_when_nothing_matches() {
        let transport = Arc::new(MemoryTransport::new());
        let a = relay("wss://a.example");
        transport.insert_events(&a, vec![note("1", 1)]);

        let executor = QueryExecutor::new(transport, Duration::from_millis(100));
        let relays: RelaySet = vec![a].into_iter().collect();
        let result = executor
            .query_first(&relays, &Filter::new().kind(Kind::RelayList))
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_query_newest_waits_for_slow_relay() {
        let transport = Arc::new(MemoryTransport::new());
        let fast = relay("wss://fast.example");
        let slow = relay("wss://slow.example");
        transport.insert_events(&fast, vec![note("stale", 100)]);
        transport.insert_events(&slow, vec![note("fresh", 200)]);
        transport.set_behavior(&slow, RelayBehavior::Delayed(Duration::from_millis(50)));

        let executor = QueryExecutor::new(transport, Duration::from_secs(2));
        let relays: RelaySet = vec![fast, slow].into_iter().collect();

        let first = executor.query_first(&relays, &Filter::new()).await.unwrap();
        assert_eq!(first.id.as_deref(), Some("stale"));

        let newest = executor.query_newest(&relays, &Filter::new()).await.unwrap();
        assert_eq!(newest.id.as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_query_all_merges_filters() {
        let transport = Arc::new(MemoryTransport::new());
        let a = relay("wss://a.example");
        transport.insert_events(
            &a,
            vec![
                note("1", 1),
                EventBuilder::new().id("2").kind(Kind::Reaction).build(),
            ],
        );

        let executor = QueryExecutor::new(transport, Duration::from_millis(100));
        let relays: RelaySet = vec![a].into_iter().collect();
        let filters = [
            Filter::new().kind(Kind::TextNote),
            Filter::new().kind(Kind::Reaction),
            Filter::new(),
        ];
        let events = executor.query_all(&relays, &filters).await;

        let ids: Vec<_> = events.iter().map(|e| e.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert!(executor.query_all(&relays, &[]).await.is_empty());
    }
}
