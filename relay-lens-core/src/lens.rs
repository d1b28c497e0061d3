//! High-level entry point

use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::{
    ContactProfile, EngineConfig, Filter, Identity, InteractionScore, Kind,
    PublishCoordinator, PublishReceipt, QueryExecutor, RelayResolver, RelaySet, RelayTransport,
    ScoringEngine, Signer, UserProfile,
    decode::{ContactList, Decode},
    error::Result,
    profile::{assemble_contact_profiles, assemble_user_profile},
    query::AUTHORS_PER_QUERY,
};

/// Aggregation engine bound to one transport and configuration
///
/// # Example
///
/// ```no_run
/// use relay_lens_core::{ConnectionPool, EngineConfig, Identity, RelayLens};
/// use std::sync::Arc;
///
/// # async fn run() -> relay_lens_core::Result<()> {
/// let config = EngineConfig::default();
/// let pool = Arc::new(ConnectionPool::new(config.connect_timeout()));
/// let lens = RelayLens::new(&config, pool.clone())?;
///
/// let me = Identity::parse("npub180cvv07tjdrrgpa0j7j7tmnyl2yr6yr7l8j4s3evf6u64th6gkwsyjh6w6")?;
/// let profile = lens.fetch_user_profile(&me).await;
/// println!("{} follows {} accounts", profile.label(), profile.contacts_count);
///
/// pool.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RelayLens {
    executor: QueryExecutor,
    resolver: RelayResolver,
    scoring: ScoringEngine,
    publisher: PublishCoordinator,
    window_days: u32,
}

impl RelayLens {
    pub fn new(config: &EngineConfig, transport: Arc<dyn RelayTransport>) -> Result<Self> {
        config.validate()?;
        let (defaults, bootstrap) = config.relay_sets()?;

        let executor = QueryExecutor::new(transport.clone(), config.query_timeout());
        let resolver = RelayResolver::new(executor.clone(), bootstrap, defaults);
        let scoring = ScoringEngine::new(executor.clone(), resolver.clone());
        let publisher = PublishCoordinator::new(transport, resolver.clone(), config.publish_timeout());

        Ok(RelayLens {
            executor,
            resolver,
            scoring,
            publisher,
            window_days: config.window_days,
        })
    }

    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.publisher = self.publisher.with_signer(signer);
        self
    }

    pub fn defaults(&self) -> &RelaySet {
        self.resolver.defaults()
    }

    pub fn window_days(&self) -> u32 {
        self.window_days
    }

    pub async fn resolve_write_relays(&self, identity: &Identity) -> RelaySet {
        self.resolver.resolve_write_relays(identity).await
    }

    pub async fn relays_for(&self, identity: &Identity) -> RelaySet {
        self.resolver.relays_for(identity).await
    }

    /// Profile from the identity's newest metadata and contact list
    pub async fn fetch_user_profile(&self, identity: &Identity) -> UserProfile {
        let relays = self.relays_for(identity).await;
        let metadata = Filter::new().author(identity).kind(Kind::Metadata).limit(1);
        let contacts = Filter::new().author(identity).kind(Kind::ContactList).limit(1);

        let (metadata, contacts) = tokio::join!(
            self.executor.query_newest(&relays, &metadata),
            self.executor.query_newest(&relays, &contacts),
        );

        assemble_user_profile(identity, metadata.as_ref(), contacts.as_ref())
    }

    /// Identities followed by `identity`, in contact list order
    pub async fn fetch_contacts(&self, identity: &Identity) -> Vec<Identity> {
        let relays = self.relays_for(identity).await;
        let filter = Filter::new().author(identity).kind(Kind::ContactList).limit(1);

        match self.executor.query_newest(&relays, &filter).await {
            Some(event) => match ContactList::decode(&event) {
                Ok(list) => list.contacts,
                Err(e) => {
                    tracing::warn!("Ignoring contact list of {}: {}", identity.short(), e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        }
    }

    /// One profile per contact, looked up on the default relays
    pub async fn fetch_contact_profiles(&self, contacts: &[Identity]) -> Vec<ContactProfile> {
        let relays = self.defaults();
        let filters: Vec<Filter> = contacts
            .chunks(AUTHORS_PER_QUERY)
            .map(|chunk| Filter::new().authors(chunk).kind(Kind::Metadata))
            .collect();

        let events = self.executor.query_all(relays, &filters).await;
        let profiles = assemble_contact_profiles(contacts, &events);
        info!(
            "Assembled {} contact profiles from {} metadata events",
            profiles.len(),
            events.len()
        );
        profiles
    }

    /// Interaction scores over `window_days` (the configured window if `None`)
    pub async fn score_interactions(
        &self,
        viewer: &Identity,
        contacts: &[Identity],
        window_days: Option<u32>,
    ) -> Result<HashMap<Identity, InteractionScore>> {
        let window_days = window_days.unwrap_or(self.window_days);
        self.scoring.score(viewer, contacts, window_days).await
    }

    /// Sign and broadcast a new contact list for `viewer`
    pub async fn publish_contact_list(
        &self,
        viewer: &Identity,
        contacts: &[Identity],
    ) -> Result<PublishReceipt> {
        self.publisher.publish_contact_list(viewer, contacts).await
    }
}
