//! Display implementation for Event

use crate::Event;
use std::fmt;

/// Display implementation that outputs pretty-printed JSON
impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string_pretty(self) {
            Ok(json) => write!(f, "{}", json),
            Err(_) => write!(f, "<invalid Event>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{EventBuilder, Kind};

    #[test]
    fn test_display_simple_event() {
        let event = EventBuilder::new()
            .id("abc123")
            .pubkey("def456")
            .created_at(1234567890)
            .kind(Kind::TextNote)
            .content("Hello, Nostr!")
            .sig("sig789")
            .build();

        let output = format!("{}", event);

        assert!(output.contains("\"id\""));
        assert!(output.contains("\"abc123\""));
        assert!(output.contains("\"Hello, Nostr!\""));
        assert!(output.contains("1234567890"));
    }

    #[test]
    fn test_display_with_tags() {
        let event = EventBuilder::new()
            .kind(Kind::ContactList)
            .p_tag("82341f882b6eabcd2ba7f1ef90aad961cf074af15b9ef44a09f9d2a8fbfbe6a2")
            .build();

        let output = event.to_string();

        assert!(output.contains("\"tags\""));
        assert!(output.contains("82341f882b6eabcd2ba7f1ef90aad961cf074af15b9ef44a09f9d2a8fbfbe6a2"));
    }

    #[test]
    fn test_display_is_pretty_printed() {
        let event = EventBuilder::new().content("x").build();
        let output = event.to_string();

        assert!(output.contains('\n'));
        assert!(output.contains("  "));
        assert!(!output.contains("\"sig\""));
    }
}
