//! WebSocket connection pool
//!
//! The pool is the concrete [`RelayTransport`] used against live relays. It
//! keeps finished connections idle per relay and hands them out again on
//! the next call. A reused connection that turns out to be dead is replaced
//! once; fresh connections are never retried.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::debug;

use crate::{
    ClientMessage, Event, Filter, RelayMessage, RelayTransport, RelayUrl, error::TransportError,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Idle connections kept per relay
pub const MAX_IDLE_PER_RELAY: usize = 2;

/// An open WebSocket to one relay
pub struct Connection {
    relay: RelayUrl,
    stream: WsStream,
    reused: bool,
}

impl Connection {
    pub fn relay(&self) -> &RelayUrl {
        &self.relay
    }

    async fn send(&mut self, frame: ClientMessage) -> Result<(), TransportError> {
        self.stream.send(Message::Text(frame.to_json().into())).await?;
        Ok(())
    }

    /// Next protocol message, answering pings along the way
    async fn recv(&mut self) -> Result<RelayMessage, TransportError> {
        while let Some(msg) = self.stream.next().await {
            match msg? {
                Message::Text(text) => match RelayMessage::from_json(&text) {
                    Ok(message) => return Ok(message),
                    Err(e) => debug!("Skipping frame from {}: {}", self.relay, e),
                },
                Message::Ping(data) => self.stream.send(Message::Pong(data)).await?,
                Message::Close(_) => return Err(TransportError::Closed),
                _ => {}
            }
        }
        Err(TransportError::Closed)
    }
}

enum Request<'a> {
    Fetch(&'a Filter),
    Publish(&'a Event),
}

enum Response {
    Events(Vec<Event>),
    Accepted,
}

/// Pool of WebSocket connections keyed by relay
pub struct ConnectionPool {
    idle: Mutex<HashMap<RelayUrl, Vec<Connection>>>,
    connect_timeout: Duration,
    next_subscription: AtomicU64,
    shut_down: AtomicBool,
}

impl ConnectionPool {
    pub fn new(connect_timeout: Duration) -> Self {
        ConnectionPool {
            idle: Mutex::new(HashMap::new()),
            connect_timeout,
            next_subscription: AtomicU64::new(0),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Take an idle connection to `relay`, or open a new one
    pub async fn acquire(&self, relay: &RelayUrl) -> Result<Connection, TransportError> {
        let pooled = self.lock().get_mut(relay).and_then(Vec::pop);
        match pooled {
            Some(mut conn) => {
                conn.reused = true;
                Ok(conn)
            }
            None => self.connect(relay).await,
        }
    }

    /// Open a new connection, bounded by the connect timeout
    pub async fn connect(&self, relay: &RelayUrl) -> Result<Connection, TransportError> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(TransportError::Connect {
                relay: relay.to_string(),
                reason: "pool is shut down".to_string(),
            });
        }

        let (stream, _) = tokio::time::timeout(self.connect_timeout, connect_async(relay.as_str()))
            .await
            .map_err(|_| TransportError::Connect {
                relay: relay.to_string(),
                reason: format!("timed out after {:?}", self.connect_timeout),
            })?
            .map_err(|e| TransportError::Connect {
                relay: relay.to_string(),
                reason: e.to_string(),
            })?;

        debug!("Connected to {}", relay);
        Ok(Connection {
            relay: relay.clone(),
            stream,
            reused: false,
        })
    }

    /// Return a healthy connection for later reuse
    ///
    /// Dropped instead when the pool is full or shut down.
    pub fn release(&self, conn: Connection) {
        if self.shut_down.load(Ordering::Acquire) {
            return;
        }
        let mut idle = self.lock();
        let slot = idle.entry(conn.relay.clone()).or_default();
        if slot.len() < MAX_IDLE_PER_RELAY {
            slot.push(conn);
        }
    }

    /// Close every idle connection and refuse new ones
    pub async fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);
        let drained: Vec<Connection> = self.lock().drain().flat_map(|(_, conns)| conns).collect();

        debug!("Closing {} idle connections", drained.len());
        for mut conn in drained {
            if let Err(e) = conn.stream.close(None).await {
                debug!("Error closing connection to {}: {}", conn.relay, e);
            }
        }
    }

    /// Number of idle connections across all relays
    pub fn idle_connections(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RelayUrl, Vec<Connection>>> {
        self.idle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_subscription_id(&self) -> String {
        format!("lens-{}", self.next_subscription.fetch_add(1, Ordering::Relaxed))
    }

    async fn exchange(
        &self,
        relay: &RelayUrl,
        request: Request<'_>,
    ) -> Result<Response, TransportError> {
        let mut conn = self.acquire(relay).await?;
        let first = self.round_trip(&mut conn, &request).await;
        let result = match first {
            Err(e) if conn.reused && is_stale(&e) => {
                debug!("Pooled connection to {} went stale ({}), reconnecting", relay, e);
                conn = self.connect(relay).await?;
                self.round_trip(&mut conn, &request).await
            }
            other => other,
        };

        if result.is_ok() {
            self.release(conn);
        }
        result
    }

    async fn round_trip(
        &self,
        conn: &mut Connection,
        request: &Request<'_>,
    ) -> Result<Response, TransportError> {
        match request {
            Request::Fetch(filter) => {
                let sub_id = self.next_subscription_id();
                conn.send(ClientMessage::req(&sub_id, (*filter).clone())).await?;

                let mut events = Vec::new();
                loop {
                    match conn.recv().await? {
                        RelayMessage::Event {
                            subscription_id,
                            event,
                        } if subscription_id == sub_id => events.push(*event),
                        RelayMessage::EndOfStoredEvents { subscription_id }
                            if subscription_id == sub_id =>
                        {
                            conn.send(ClientMessage::close(&sub_id)).await?;
                            return Ok(Response::Events(events));
                        }
                        RelayMessage::Closed {
                            subscription_id,
                            message,
                        } if subscription_id == sub_id => {
                            return Err(TransportError::Rejected(message));
                        }
                        RelayMessage::Notice { message } => {
                            debug!("Notice from {}: {}", conn.relay, message);
                        }
                        _ => {}
                    }
                }
            }
            Request::Publish(event) => {
                conn.send(ClientMessage::Event((*event).clone())).await?;

                loop {
                    match conn.recv().await? {
                        RelayMessage::Ok {
                            event_id,
                            accepted,
                            message,
                        } if Some(event_id.as_str()) == event.id.as_deref() => {
                            return if accepted {
                                Ok(Response::Accepted)
                            } else {
                                Err(TransportError::Rejected(message))
                            };
                        }
                        RelayMessage::Notice { message } => {
                            debug!("Notice from {}: {}", conn.relay, message);
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

impl Default for ConnectionPool {
    fn default() -> Self {
        ConnectionPool::new(Duration::from_secs(5))
    }
}

fn is_stale(err: &TransportError) -> bool {
    matches!(err, TransportError::Closed | TransportError::WebSocket(_))
}

#[async_trait]
impl RelayTransport for ConnectionPool {
    async fn fetch(&self, relay: &RelayUrl, filter: &Filter) -> Result<Vec<Event>, TransportError> {
        match self.exchange(relay, Request::Fetch(filter)).await? {
            Response::Events(events) => Ok(events),
            Response::Accepted => Err(TransportError::Protocol("unexpected OK".to_string())),
        }
    }

    async fn publish(&self, relay: &RelayUrl, event: &Event) -> Result<(), TransportError> {
        match self.exchange(relay, Request::Publish(event)).await? {
            Response::Accepted => Ok(()),
            Response::Events(_) => Err(TransportError::Protocol("unexpected events".to_string())),
        }
    }
}
