//! Relay Lens CLI Library
//!
//! Reusable pieces of the `relay-lens` binary: event dump loading, the local
//! key signer, comparison of two identities and output rendering.

pub mod comparison;
pub mod input;
pub mod output;
pub mod signer;
