//! Byte/text transforms shared by the Bitfield and Skylink codecs.
//!
//! # base64url
//! The standard base64 alphabet with `+` → `-` and `/` → `_`.  The encoder
//! emits `=` padding; callers that work with a fixed byte length truncate the
//! output themselves.  The decoder expects padded input (a multiple of four
//! characters) and also accepts `+` and `/` from the standard alphabet.  Trailing bits in the final character must be zero, so every
//! accepted text has exactly one byte representation.
//!
//! # hex
//! Two characters per byte.  Output is lowercase; input is case-insensitive.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodingError {
    #[error("Invalid base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Encode `bytes` as padded base64url.
pub fn encode_base64url(bytes: &[u8]) -> String {
    URL_SAFE.encode(bytes)
}

/// Decode padded base64url text.  Standard-alphabet `+`/`/` are read as
/// `-`/`_`.
pub fn decode_base64url(text: &str) -> Result<Vec<u8>, EncodingError> {
    let text: String = text
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();
    Ok(URL_SAFE.decode(text)?)
}

pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

pub fn from_hex(text: &str) -> Result<Vec<u8>, EncodingError> {
    Ok(hex::decode(text)?)
}

/// Decode hex text into a fixed-size array; the length must match exactly.
pub fn from_hex_array<const N: usize>(text: &str) -> Result<[u8; N], EncodingError> {
    let mut out = [0u8; N];
    hex::decode_to_slice(text, &mut out)?;
    Ok(out)
}
