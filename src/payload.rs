//! Byte payload decoding.
//!
//! Test scripts carry serialized modules either as text whose characters
//! each stand for one byte value, or as base64. Decoding is pure and does
//! no validation of its own; whether the bytes form a module is the
//! engine's verdict.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Decode a string whose code points each represent one byte value.
///
/// Code points above 255 are narrowed with truncating semantics; no range
/// check is performed.
pub fn decode(text: &str) -> Vec<u8> {
    text.chars().map(|c| c as u32 as u8).collect()
}

/// Decode a base64-embedded payload.
pub fn decode_base64(text: &str) -> Result<Vec<u8>> {
    STANDARD.decode(text).context("decode base64 payload")
}
