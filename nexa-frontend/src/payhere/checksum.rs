//! Signatures exchanged with the checkout page.
//!
//! `RollingChecksum` is a 32-bit multiply-by-31 string hash, NOT a
//! cryptographic MAC. It matches what the current checkout integration
//! verifies. `HmacSha256` is the keyed replacement; switch `signature_scheme`
//! once the gateway side checks it.

use nexa_core::utils::signature::hmac_sha256_hex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureScheme {
    #[default]
    RollingChecksum,
    HmacSha256,
}

impl SignatureScheme {
    /// Sign `fields` with the secret placed first.
    pub fn sign_request(&self, secret: &str, fields: &[&str]) -> Result<String, anyhow::Error> {
        match self {
            SignatureScheme::RollingChecksum => {
                let mut payload = String::from(secret);
                payload.extend(fields.iter().copied());
                Ok(rolling_checksum(&payload))
            }
            SignatureScheme::HmacSha256 => hmac_sha256_hex(secret, &fields.concat()),
        }
    }

    /// Sign `fields` with the secret placed last, as gateway callbacks do.
    pub fn sign_response(&self, secret: &str, fields: &[&str]) -> Result<String, anyhow::Error> {
        match self {
            SignatureScheme::RollingChecksum => {
                let mut payload = fields.concat();
                payload.push_str(secret);
                Ok(rolling_checksum(&payload))
            }
            SignatureScheme::HmacSha256 => hmac_sha256_hex(secret, &fields.concat()),
        }
    }
}

/// `h = h * 31 + unit` over UTF-16 code units in wrapping `i32` arithmetic,
/// then the absolute value as lowercase hex, zero-padded to 8 characters.
pub fn rolling_checksum(input: &str) -> String {
    let hash = input
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)));
    format!("{:08x}", hash.unsigned_abs())
}
