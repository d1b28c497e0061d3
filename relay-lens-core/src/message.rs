//! Relay wire messages
//!
//! Client → relay: `["REQ", <sub>, <filter>]`, `["CLOSE", <sub>]`,
//! `["EVENT", <event>]`.
//!
//! Relay → client: `["EVENT", <sub>, <event>]`, `["EOSE", <sub>]`,
//! `["OK", <event id>, <accepted>, <message>]`, `["CLOSED", <sub>, <message>]`,
//! `["NOTICE", <message>]`.

use serde_json::{Value, json};

use crate::{Event, Filter, error::TransportError};

/// Frames a client sends to a relay
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Req {
        subscription_id: String,
        filter: Filter,
    },
    Close {
        subscription_id: String,
    },
    Event(Event),
}

impl ClientMessage {
    pub fn req(subscription_id: impl Into<String>, filter: Filter) -> Self {
        ClientMessage::Req {
            subscription_id: subscription_id.into(),
            filter,
        }
    }

    pub fn close(subscription_id: impl Into<String>) -> Self {
        ClientMessage::Close {
            subscription_id: subscription_id.into(),
        }
    }

    pub fn to_json(&self) -> String {
        match self {
            ClientMessage::Req {
                subscription_id,
                filter,
            } => json!(["REQ", subscription_id, filter]),
            ClientMessage::Close { subscription_id } => json!(["CLOSE", subscription_id]),
            ClientMessage::Event(event) => json!(["EVENT", event]),
        }
        .to_string()
    }
}

/// Frames a relay sends to a client
#[derive(Debug, Clone, PartialEq)]
pub enum RelayMessage {
    Event {
        subscription_id: String,
        event: Box<Event>,
    },
    EndOfStoredEvents {
        subscription_id: String,
    },
    Ok {
        event_id: String,
        accepted: bool,
        message: String,
    },
    Closed {
        subscription_id: String,
        message: String,
    },
    Notice {
        message: String,
    },
}

impl RelayMessage {
    pub fn from_json(text: &str) -> Result<Self, TransportError> {
        let value: Value = serde_json::from_str(text)?;
        let arr = value
            .as_array()
            .ok_or_else(|| TransportError::Protocol(format!("not an array: {}", text)))?;

        let str_at = |i: usize| -> Result<String, TransportError> {
            arr.get(i)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| TransportError::Protocol(format!("missing field {} in {}", i, text)))
        };
        // Relays disagree on whether the trailing message is mandatory
        let optional_str_at =
            |i: usize| arr.get(i).and_then(Value::as_str).unwrap_or_default().to_string();

        match arr.first().and_then(Value::as_str) {
            Some("EVENT") => {
                let event = arr
                    .get(2)
                    .cloned()
                    .ok_or_else(|| TransportError::Protocol("EVENT without payload".into()))?;
                Ok(RelayMessage::Event {
                    subscription_id: str_at(1)?,
                    event: Box::new(serde_json::from_value(event)?),
                })
            }
            Some("EOSE") => Ok(RelayMessage::EndOfStoredEvents {
                subscription_id: str_at(1)?,
            }),
            Some("OK") => Ok(RelayMessage::Ok {
                event_id: str_at(1)?,
                accepted: arr.get(2).and_then(Value::as_bool).unwrap_or(false),
                message: optional_str_at(3),
            }),
            Some("CLOSED") => Ok(RelayMessage::Closed {
                subscription_id: str_at(1)?,
                message: optional_str_at(2),
            }),
            Some("NOTICE") => Ok(RelayMessage::Notice {
                message: optional_str_at(1),
            }),
            other => Err(TransportError::Protocol(format!(
                "unknown message type {:?}",
                other
            ))),
        }
    }

    /// Serialize in wire form; used by in-process fake relays
    pub fn to_json(&self) -> String {
        match self {
            RelayMessage::Event {
                subscription_id,
                event,
            } => json!(["EVENT", subscription_id, event]),
            RelayMessage::EndOfStoredEvents { subscription_id } => {
                json!(["EOSE", subscription_id])
            }
            RelayMessage::Ok {
                event_id,
                accepted,
                message,
            } => json!(["OK", event_id, accepted, message]),
            RelayMessage::Closed {
                subscription_id,
                message,
            } => json!(["CLOSED", subscription_id, message]),
            RelayMessage::Notice { message } => json!(["NOTICE", message]),
        }
        .to_string()
    }
}
