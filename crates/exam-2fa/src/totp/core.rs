//! Core OTP generation and verification per RFC 4226 (HOTP) and RFC 6238 (TOTP).
//!
//! The parameter set is fixed (see [`crate::totp::types`]). Verification
//! accepts the current and the immediately preceding period only, and
//! refuses codes the caller reports as recently spent.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha1::Sha1;
use zeroize::Zeroize;

use crate::totp::types::*;

/// Minimum number of recently used codes `check` must be given.
pub const MIN_SPENT_HISTORY: usize = 2;

const STEP_MILLIS: i64 = PERIOD_SECS * 1000;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Raw HMAC-OTP (RFC 4226 §5.3)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Compute the HOTP code for a key and counter.
pub fn hotp(key: &SecretKey, counter: u64) -> String {
    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(&counter.to_be_bytes());
    truncate(&mac.finalize().into_bytes())
}

/// Dynamic truncation per RFC 4226 §5.3.
fn truncate(digest: &[u8]) -> String {
    let offset = (digest[19] & 0x0f) as usize;
    let binary = ((digest[offset] as u32 & 0x7f) << 24)
        | ((digest[offset + 1] as u32) << 16)
        | ((digest[offset + 2] as u32) << 8)
        | (digest[offset + 3] as u32);
    let code = binary % 10u32.pow(DIGITS as u32);
    format!("{:0>width$}", code, width = DIGITS)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Time steps
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// HOTP counter for the period `delta` steps away from the one containing
/// `at`. The value is written as an unsigned 64-bit integer, so steps before
/// the epoch wrap around.
pub fn time_step_at(at: DateTime<Utc>, delta: i64) -> u64 {
    let step = at.timestamp_millis().div_euclid(STEP_MILLIS);
    step.wrapping_add(delta) as u64
}

/// Seconds remaining until the period containing `at` ends (1..=30).
pub fn seconds_remaining_at(at: DateTime<Utc>) -> u32 {
    let elapsed = at.timestamp().rem_euclid(PERIOD_SECS);
    (PERIOD_SECS - elapsed) as u32
}

/// Seconds remaining in the current period.
pub fn seconds_remaining() -> u32 {
    seconds_remaining_at(Utc::now())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Generation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The code for the period `delta` steps away from now (`0` current, `-1`
/// previous, `1` next).
///
/// Prefer [`check`] for verifying user input.
pub fn generate(key: &SecretKey, delta: i64) -> String {
    generate_at(key, delta, Utc::now())
}

/// The code for the period `delta` steps away from the one containing `at`.
///
/// Anchoring to an explicit instant is meant for tests; production callers
/// should use [`generate`].
pub fn generate_at(key: &SecretKey, delta: i64, at: DateTime<Utc>) -> String {
    hotp(key, time_step_at(at, delta))
}

/// Generate a new shared secret: [`KEY_SIZE`] bytes from the operating
/// system's CSPRNG, base32 encoded.
pub fn gen_key() -> EncodedKey {
    let mut buf = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut buf);
    let key = SecretKey::from_bytes(buf.to_vec());
    buf.zeroize();
    key.to_encoded()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Verification
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Check a candidate code against a base32 key at the current time.
///
/// Accepts the code of the current period and of the one before it, never
/// the next one. `spent` must hold at least the two most recent codes that
/// were successfully used with this key; those are refused. After a
/// successful check the caller must record `code` as spent, in storage
/// shared by every application instance.
///
/// # Panics
///
/// Panics if `spent` has fewer than [`MIN_SPENT_HISTORY`] entries. That is an
/// integration bug: without the history a code could be replayed within its
/// validity window.
#[track_caller]
pub fn check<S: AsRef<str>>(key: &str, code: &str, spent: &[S]) -> Result<(), TotpRejection> {
    check_at(key, code, spent, Utc::now())
}

/// [`check`] anchored to an explicit instant. For tests only.
///
/// # Panics
///
/// Same as [`check`].
#[track_caller]
pub fn check_at<S: AsRef<str>>(
    key: &str,
    code: &str,
    spent: &[S],
    at: DateTime<Utc>,
) -> Result<(), TotpRejection> {
    assert!(
        spent.len() >= MIN_SPENT_HISTORY,
        "TOTP check requires the {} most recently used codes for this key to prevent replay, got {}",
        MIN_SPENT_HISTORY,
        spent.len()
    );

    let key = SecretKey::from_base32(key).ok_or(TotpRejection::MalformedKey)?;

    if !is_well_formed(code) {
        return Err(TotpRejection::MalformedTotp);
    }

    if spent
        .iter()
        .any(|s| constant_time_eq(s.as_ref().as_bytes(), code.as_bytes()))
    {
        return Err(TotpRejection::SpentTotp);
    }

    let current = generate_at(&key, 0, at);
    let previous = generate_at(&key, -1, at);

    // Evaluate both so timing does not reveal which period matched.
    let matches_current = constant_time_eq(current.as_bytes(), code.as_bytes());
    let matches_previous = constant_time_eq(previous.as_bytes(), code.as_bytes());

    if matches_current | matches_previous {
        Ok(())
    } else {
        Err(TotpRejection::WrongTotp)
    }
}

/// Exactly [`DIGITS`] ASCII digits.
fn is_well_formed(code: &str) -> bool {
    code.len() == DIGITS && code.bytes().all(|b| b.is_ascii_digit())
}

/// Constant-time comparison (to prevent timing attacks on code verification).
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
