//! Contact list publishing

use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{
    Event, EventBuilder, Identity, Kind, RelayResolver, RelaySet, RelayTransport, RelayUrl, Signer,
    error::{Error, Result, TransportError, ValidationError},
    validation::validate_signed_event,
};

/// Outcome of a successful broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReceipt {
    pub event_id: String,
    /// Relay whose acknowledgement completed the broadcast
    pub relay: RelayUrl,
    /// Number of relays the event was sent to
    pub attempted: usize,
}

/// Unsigned contact list: one `p` tag per contact in the given order
///
/// Repeated contacts are collapsed to their first occurrence.
pub fn contact_list_event(viewer: &Identity, contacts: &[Identity], created_at: u64) -> Event {
    let mut seen = std::collections::HashSet::new();
    contacts
        .iter()
        .filter(|contact| seen.insert(*contact))
        .fold(
            EventBuilder::new()
                .pubkey(viewer.hex())
                .created_at(created_at)
                .kind(Kind::ContactList),
            |builder, contact| builder.p_tag(contact.hex()),
        )
        .build()
}

/// Signs and broadcasts events on behalf of a viewer
#[derive(Clone)]
pub struct PublishCoordinator {
    transport: Arc<dyn RelayTransport>,
    resolver: RelayResolver,
    signer: Option<Arc<dyn Signer>>,
    timeout: Duration,
}

impl PublishCoordinator {
    pub fn new(transport: Arc<dyn RelayTransport>, resolver: RelayResolver, timeout: Duration) -> Self {
        PublishCoordinator {
            transport,
            resolver,
            signer: None,
            timeout,
        }
    }

    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn has_signer(&self) -> bool {
        self.signer.is_some()
    }

    /// Replace the viewer's contact list with `contacts`
    ///
    /// Succeeds as soon as one relay acknowledges. Fails without a signer,
    /// when signing fails or yields an invalid event, and when no relay
    /// accepts the event in time.
    pub async fn publish_contact_list(
        &self,
        viewer: &Identity,
        contacts: &[Identity],
    ) -> Result<PublishReceipt> {
        let signer = self.signer.as_ref().ok_or(Error::SignerUnavailable)?;

        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let unsigned = contact_list_event(viewer, contacts, now);
        let signed = signer.sign(unsigned).await?;

        validate_signed_event(&signed)?;
        let signed_by = signed.pubkey.as_deref().unwrap_or_default().to_ascii_lowercase();
        if signed_by != viewer.hex() {
            return Err(ValidationError::PubkeyMismatch {
                expected: viewer.hex().to_string(),
                actual: signed_by,
            }
            .into());
        }

        let relays = self.resolver.relays_for(viewer).await;
        self.broadcast(&relays, &signed).await
    }

    /// Send `event` to every relay at once and return on the first ack
    ///
    /// Broadcasts still in flight when an ack arrives are dropped.
    pub async fn broadcast(&self, relays: &RelaySet, event: &Event) -> Result<PublishReceipt> {
        let attempted = relays.len();
        let mut pending: FuturesUnordered<_> = relays
            .iter()
            .map(|relay| async move {
                let result = match tokio::time::timeout(self.timeout, self.transport.publish(relay, event)).await {
                    Ok(result) => result,
                    Err(_) => Err(TransportError::Timeout),
                };
                (relay, result)
            })
            .collect();

        while let Some((relay, result)) = pending.next().await {
            match result {
                Ok(()) => {
                    info!("{} acknowledged event {:?}", relay, event.id);
                    return Ok(PublishReceipt {
                        event_id: event.id.clone().unwrap_or_default(),
                        relay: relay.clone(),
                        attempted,
                    });
                }
                Err(e) => warn!("Broadcast to {} failed: {}", relay, e),
            }
            debug!("{} broadcasts still pending", pending.len());
        }

        Err(Error::BroadcastFailed { attempted })
    }
}
