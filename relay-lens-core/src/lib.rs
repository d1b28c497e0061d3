//! Relay Lens Core Library
//!
//! Client-side aggregation over Nostr relays: find where an identity
//! publishes, query many unreliable relays at once, merge what comes back,
//! and turn the raw event stream into profiles, contact lists and
//! interaction scores.
//!
//! # Features
//!
//! - Relay set resolution from published relay lists (kind 10002)
//! - Concurrent fan-out queries with per-relay timeouts and dedup by id
//! - Typed decoders per event kind, with an explicit unknown-kind arm
//! - Profile and contact assembly that never omits a requested identity
//! - Weighted interaction scoring over a trailing window
//! - Contact list publishing through an external signer, first ack wins
//! - Pluggable transport: pooled WebSockets or an in-memory relay network
//!
//! # Examples
//!
//! ## Building and parsing events
//!
//! ```
//! use relay_lens_core::{Event, EventBuilder, Kind};
//! use std::convert::TryFrom;
//!
//! let event = EventBuilder::new()
//!     .pubkey("82341f882b6eabcd2ba7f1ef90aad961cf074af15b9ef44a09f9d2a8fbfbe6a2")
//!     .created_at(1234567890)
//!     .kind(Kind::TextNote)
//!     .content("Hello, Nostr!")
//!     .build();
//!
//! let json = String::try_from(&event)?;
//! assert_eq!(Event::try_from(json)?, event);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Querying an in-memory relay network
//!
//! ```
//! use relay_lens_core::{EngineConfig, EventBuilder, Identity, Kind, MemoryTransport, RelayLens};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> relay_lens_core::Result<()> {
//! let alice = "82341f882b6eabcd2ba7f1ef90aad961cf074af15b9ef44a09f9d2a8fbfbe6a2";
//! let metadata = EventBuilder::new()
//!     .id("01")
//!     .pubkey(alice)
//!     .kind(Kind::Metadata)
//!     .content(r#"{"name":"alice"}"#)
//!     .build();
//!
//! let transport = Arc::new(MemoryTransport::replay(vec![metadata]));
//! let lens = RelayLens::new(&EngineConfig::default(), transport)?;
//!
//! let profile = lens.fetch_user_profile(&Identity::parse(alice)?).await;
//! assert_eq!(profile.name.as_deref(), Some("alice"));
//! # Ok(())
//! # }
//! ```

// Public modules
pub mod builder;
pub mod config;
pub mod conversion;
pub mod decode;
pub mod display;
pub mod error;
pub mod event;
pub mod filter;
pub mod identity;
pub mod iter;
pub mod kind;
pub mod lens;
pub mod message;
pub mod pool;
pub mod profile;
pub mod publish;
pub mod query;
pub mod relay;
pub mod resolver;
pub mod scoring;
pub mod signer;
pub mod transport;
pub mod validation;

// Re-export commonly used types and functions
pub use builder::EventBuilder;
pub use config::{DEFAULT_RELAYS, EngineConfig};
pub use conversion::{event_from_json, event_to_json};
pub use decode::{Decode, Record};
pub use error::{DecodeError, Error, Result, SignerError, TransportError, ValidationError};
pub use event::{Event, Tag};
pub use filter::Filter;
pub use identity::Identity;
pub use iter::EventSet;
pub use kind::Kind;
pub use lens::RelayLens;
pub use message::{ClientMessage, RelayMessage};
pub use pool::ConnectionPool;
pub use profile::{ContactProfile, UserProfile};
pub use publish::{PublishCoordinator, PublishReceipt};
pub use query::QueryExecutor;
pub use relay::{RelaySet, RelayUrl};
pub use resolver::RelayResolver;
pub use scoring::{InteractionScore, ScoringEngine};
pub use signer::Signer;
pub use transport::{MemoryTransport, RelayBehavior, RelayTransport};
pub use validation::{validate_basic_fields, validate_signed_event};
