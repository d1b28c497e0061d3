//! Relay set resolution
//!
//! An identity's relay list (kind 10002) says where it publishes. That is
//! the freshest place to read its data and the place to write on its
//! behalf. Identities without a list fall back to the default relays.

use tracing::debug;

use crate::{
    Filter, Identity, Kind, QueryExecutor, RelaySet,
    decode::{Decode, RelayList},
};

/// Resolves where an identity publishes
#[derive(Clone)]
pub struct RelayResolver {
    executor: QueryExecutor,
    bootstrap: RelaySet,
    defaults: RelaySet,
}

impl RelayResolver {
    pub fn new(executor: QueryExecutor, bootstrap: RelaySet, defaults: RelaySet) -> Self {
        RelayResolver {
            executor,
            bootstrap,
            defaults,
        }
    }

    pub fn defaults(&self) -> &RelaySet {
        &self.defaults
    }

    pub fn bootstrap(&self) -> &RelaySet {
        &self.bootstrap
    }

    /// Write relays from the identity's newest relay list, in list order
    ///
    /// Entries marked `read` are excluded. An identity with no list (or
    /// whose list could not be fetched in time) gets an empty set.
    pub async fn resolve_write_relays(&self, identity: &Identity) -> RelaySet {
        let filter = Filter::new().author(identity).kind(Kind::RelayList).limit(1);

        let Some(event) = self.executor.query_newest(&self.bootstrap, &filter).await else {
            debug!("No relay list found for {}", identity.short());
            return RelaySet::new();
        };

        match RelayList::decode(&event) {
            Ok(list) => {
                let relays: RelaySet = list.write_relays().cloned().collect();
                debug!("{} publishes to {} relays", identity.short(), relays.len());
                relays
            }
            Err(e) => {
                debug!("Unusable relay list for {}: {}", identity.short(), e);
                RelaySet::new()
            }
        }
    }

    /// Write relays followed by the defaults, first occurrence wins
    pub async fn relays_for(&self, identity: &Identity) -> RelaySet {
        self.resolve_write_relays(identity).await.union(&self.defaults)
    }
}
