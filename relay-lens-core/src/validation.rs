//! Event validation functionality

use crate::{
    Event,
    error::{Result, ValidationError},
};

/// Validate the authenticity fields of a signed event
///
/// Checks field presence and shape, then recomputes the id from the
/// canonical serialization. Signature verification is left to relays.
///
/// # Example
///
/// ```no_run
/// use relay_lens_core::{event_from_json, validate_signed_event};
///
/// let json = r#"{"id":"...","pubkey":"...","created_at":123,"kind":3,"tags":[],"content":"","sig":"..."}"#;
/// let event = event_from_json(json)?;
/// validate_signed_event(&event)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn validate_signed_event(event: &Event) -> Result<()> {
    validate_basic_fields(event)?;

    // validate_basic_fields guarantees both are present
    let (Some(id), Some(computed)) = (event.id.as_deref(), event.compute_id()) else {
        return Err(ValidationError::MissingField("id").into());
    };

    if computed != id {
        return Err(ValidationError::EventIdMismatch {
            expected: id.to_string(),
            actual: computed,
        }
        .into());
    }

    Ok(())
}

/// Validate presence and hex shape of `id`, `pubkey` and `sig`
///
/// Cheaper than [`validate_signed_event`]; no hashing is done.
pub fn validate_basic_fields(event: &Event) -> Result<()> {
    check_hex_field(event.id.as_deref(), "id", 64)?;
    check_hex_field(event.pubkey.as_deref(), "pubkey", 64)?;
    check_hex_field(event.sig.as_deref(), "sig", 128)?;
    Ok(())
}

fn check_hex_field(value: Option<&str>, field: &'static str, len: usize) -> Result<()> {
    let value = value.ok_or(ValidationError::MissingField(field))?;

    if value.len() != len || !is_hex(value) {
        return Err(ValidationError::InvalidHex(format!(
            "{} must be {} hex characters, got: {}",
            field, len, value
        ))
        .into());
    }

    Ok(())
}

/// Check if a string is valid hexadecimal
pub fn is_hex(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_hexdigit())
}
