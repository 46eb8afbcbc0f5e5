//! Transport audio codec
//!
//! Audio crosses the JSON transport as base64, optionally carrying a
//! `data:<mime>;base64,` header. Decoding failures are surfaced as errors so
//! the pipeline can degrade to text-only; encoding cannot fail.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::{Error, Result};

/// Decode a transport audio payload into raw bytes.
///
/// A data-URI header, when present, ends at the first comma; everything up to
/// and including it is stripped before decoding.
///
/// # Errors
///
/// Returns `Error::AudioDecode` on malformed base64. Callers treat this as
/// "no audio available" and continue with any text input.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    let encoded = payload
        .split_once(',')
        .map_or(payload, |(_, rest)| rest);

    STANDARD
        .decode(encoded)
        .map_err(|e| Error::AudioDecode(e.to_string()))
}

/// Encode audio bytes for transport, prefixed with a data-URI header.
#[must_use]
pub fn encode_payload(bytes: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}
