//! Event kinds understood by the aggregation engine

use std::fmt;

/// Event kind discriminator
///
/// Every kind the engine interprets has its own variant; everything else is
/// carried as [`Kind::Unknown`] and ignored by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Profile metadata (kind 0)
    Metadata,
    /// Short text note (kind 1)
    TextNote,
    /// Contact list (kind 3)
    ContactList,
    /// Repost (kind 6)
    Repost,
    /// Reaction (kind 7)
    Reaction,
    /// Zap request (kind 9734), only seen embedded in receipts
    ZapRequest,
    /// Zap receipt (kind 9735)
    ZapReceipt,
    /// Relay list metadata (kind 10002)
    RelayList,
    /// Any other kind
    Unknown(u16),
}

impl Kind {
    /// Numeric value on the wire
    pub fn as_u16(self) -> u16 {
        match self {
            Kind::Metadata => 0,
            Kind::TextNote => 1,
            Kind::ContactList => 3,
            Kind::Repost => 6,
            Kind::Reaction => 7,
            Kind::ZapRequest => 9734,
            Kind::ZapReceipt => 9735,
            Kind::RelayList => 10002,
            Kind::Unknown(kind) => kind,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Kind::Metadata => "metadata",
            Kind::TextNote => "text note",
            Kind::ContactList => "contact list",
            Kind::Repost => "repost",
            Kind::Reaction => "reaction",
            Kind::ZapRequest => "zap request",
            Kind::ZapReceipt => "zap receipt",
            Kind::RelayList => "relay list",
            Kind::Unknown(_) => "unknown",
        }
    }
}

impl From<u16> for Kind {
    fn from(kind: u16) -> Self {
        match kind {
            0 => Kind::Metadata,
            1 => Kind::TextNote,
            3 => Kind::ContactList,
            6 => Kind::Repost,
            7 => Kind::Reaction,
            9734 => Kind::ZapRequest,
            9735 => Kind::ZapReceipt,
            10002 => Kind::RelayList,
            other => Kind::Unknown(other),
        }
    }
}

impl From<Kind> for u16 {
    fn from(kind: Kind) -> Self {
        kind.as_u16()
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kind {} ({})", self.as_u16(), self.label())
    }
}
