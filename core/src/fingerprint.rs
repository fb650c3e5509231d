//! Cross-shop identity key.
//!
//! The same person is matched across shops by phone number only.
//! Numbers are normalised to national format and hashed, so the
//! aggregated output never carries a raw phone number.
//!
//! Known limitations: one person using two numbers is two people here.
//! The phone number space is small, so an unkeyed fingerprint can be
//! reversed by enumeration; deployments set `fingerprint_key` to a
//! secret so published fingerprints cannot be matched offline.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Shortest national number accepted as an identity.
const MIN_NATIONAL_DIGITS: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a raw phone number, or `None` when it cannot identify anyone.
    pub fn from_phone(raw: &str, country_code: &str) -> Option<Self> {
        Self::keyed(raw, country_code, "")
    }

    /// As `from_phone`, with `key` mixed in ahead of the number.
    pub fn keyed(raw: &str, country_code: &str, key: &str) -> Option<Self> {
        let national = normalize_phone(raw, country_code)?;
        let mut hasher = Sha256::new();
        if !key.is_empty() {
            hasher.update(key.as_bytes());
            hasher.update([0u8]);
        }
        hasher.update(national.as_bytes());
        Some(Self(hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reduce a phone number to national format with a trunk `0`:
/// `+92 300-1234567`, `0092 3001234567`, `923001234567` and
/// `0300 1234567` all become `03001234567`.
pub fn normalize_phone(raw: &str, country_code: &str) -> Option<String> {
    let mut digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if let Some(rest) = digits.strip_prefix("00") {
        digits = rest.to_string();
    }
    let international = raw.trim_start().starts_with('+') || raw.trim_start().starts_with("00");
    // Calling code written without `+` or `00`, as in `923001234567`.
    let bare_international = !digits.starts_with('0')
        && digits.len() > country_code.len() + MIN_NATIONAL_DIGITS;
    if (international || bare_international) && !country_code.is_empty() {
        if let Some(national) = digits.strip_prefix(country_code) {
            digits = format!("0{}", national.trim_start_matches('0'));
        }
    }
    if !digits.starts_with('0') {
        digits.insert(0, '0');
    }

    if digits.len() - 1 < MIN_NATIONAL_DIGITS {
        return None;
    }
    Some(digits)
}
