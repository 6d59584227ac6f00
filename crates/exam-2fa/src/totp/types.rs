//! Core types for the TOTP engine: fixed parameters, key representations,
//! verification outcomes and the crate error.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;
use zeroize::Zeroize;

use crate::totp::base32;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Fixed parameters
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Authenticator apps that were provisioned with these values compute codes
// with them forever. Changing any of them silently breaks every existing
// enrolment.

/// HMAC hash algorithm, as named in `otpauth://` URIs.
pub const ALGORITHM: &str = "sha1";
/// Number of decimal digits in a code.
pub const DIGITS: usize = 6;
/// Length of a time step in seconds.
pub const PERIOD_SECS: i64 = 30;
/// Shared secret length in bytes (160 bits, 32 base32 characters).
pub const KEY_SIZE: usize = 20;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Keys
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Raw shared-secret bytes, as fed to HMAC.
///
/// Kept distinct from [`EncodedKey`] so that the base32 text of a secret can
/// never be used as HMAC key material by accident. The buffer is wiped on
/// drop.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Decode a base32 secret. `None` if the text is not valid base32.
    pub fn from_base32(encoded: &str) -> Option<Self> {
        base32::to_buffer(encoded).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_encoded(&self) -> EncodedKey {
        EncodedKey(base32::to_base32(&self.0))
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey([REDACTED; {}])", self.0.len())
    }
}

/// Base32 text form of a shared secret, as stored on the account record and
/// shown to the user during enrolment.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedKey(String);

impl EncodedKey {
    /// Accept a stored secret, checking that it is valid base32.
    pub fn parse(encoded: impl Into<String>) -> Result<Self, TotpError> {
        let encoded = encoded.into();
        if !base32::is_base32(&encoded) {
            return Err(TotpError::new(
                TotpErrorKind::InvalidSecret,
                "Secret is not valid RFC 4648 base32",
            ));
        }
        Ok(Self(encoded))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn decode(&self) -> Option<SecretKey> {
        SecretKey::from_base32(&self.0)
    }
}

impl AsRef<str> for EncodedKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EncodedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for EncodedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncodedKey([REDACTED; {}])", self.0.len())
    }
}

impl From<EncodedKey> for String {
    fn from(key: EncodedKey) -> String {
        key.0
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Verification outcome
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Why a candidate code was refused. These are expected end-user outcomes,
/// returned as values so a login endpoint can map them to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TotpRejection {
    /// The stored secret is not valid base32.
    #[error("stored TOTP key is not valid base32")]
    MalformedKey,
    /// The candidate is not exactly six ASCII digits.
    #[error("TOTP must be exactly 6 digits")]
    MalformedTotp,
    /// The candidate is one of the recently used codes.
    #[error("TOTP has already been used")]
    SpentTotp,
    /// The candidate matches neither the current nor the previous period.
    #[error("TOTP is incorrect or expired")]
    WrongTotp,
}

impl TotpRejection {
    /// Wire name of the reason (e.g. `"WRONG_TOTP"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedKey => "MALFORMED_KEY",
            Self::MalformedTotp => "MALFORMED_TOTP",
            Self::SpentTotp => "SPENT_TOTP",
            Self::WrongTotp => "WRONG_TOTP",
        }
    }
}

/// JSON shape of a check result: `{"ok":true}` or
/// `{"ok":false,"reason":"WRONG_TOTP"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<TotpRejection>,
}

impl CheckOutcome {
    pub fn accepted() -> Self {
        Self { ok: true, reason: None }
    }

    pub fn rejected(reason: TotpRejection) -> Self {
        Self {
            ok: false,
            reason: Some(reason),
        }
    }
}

impl From<Result<(), TotpRejection>> for CheckOutcome {
    fn from(result: Result<(), TotpRejection>) -> Self {
        match result {
            Ok(()) => Self::accepted(),
            Err(reason) => Self::rejected(reason),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Provisioning material
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// An `otpauth://` URI together with a scannable rendering of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provisioning {
    pub url: Url,
    /// SVG markup (embed with `data:image/svg+xml;utf8,`) or a
    /// `data:image/png;base64,` URI, depending on the renderer used.
    pub qr: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Error type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Error kind for this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TotpErrorKind {
    InvalidSecret,
    InvalidUri,
    UnsupportedParameter,
    QrEncodeFailed,
    InvalidConfig,
}

/// Crate-level error for provisioning and configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotpError {
    pub kind: TotpErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl fmt::Display for TotpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)?;
        if let Some(d) = &self.detail {
            write!(f, " ({})", d)?;
        }
        Ok(())
    }
}

impl std::error::Error for TotpError {}

impl TotpError {
    pub fn new(kind: TotpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl From<TotpError> for String {
    fn from(e: TotpError) -> String {
        e.to_string()
    }
}
