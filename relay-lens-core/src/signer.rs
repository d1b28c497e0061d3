//! External signing capability

use async_trait::async_trait;

use crate::{Event, Identity, error::SignerError};

/// Something that holds a private key and signs events on request
///
/// Browser extensions, remote signers and local key files all fit behind
/// this trait. The engine never sees key material.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Public key events will be signed with
    async fn public_key(&self) -> Result<Identity, SignerError>;

    /// Fill in `pubkey`, `id` and `sig` of an unsigned event
    async fn sign(&self, unsigned: Event) -> Result<Event, SignerError>;
}
