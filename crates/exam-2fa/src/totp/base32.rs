//! RFC 4648 base32 for shared secrets, unpadded.
//!
//! Encoding never emits `=`; decoding accepts only the 32 uppercase alphabet
//! characters. Bits left over at the end of a decode (fewer than eight) are
//! dropped without checking that they are zero.

use ::base32::Alphabet;

const ALPHABET: Alphabet = Alphabet::Rfc4648 { padding: false };

/// Encode bytes as unpadded base32. Output length is `ceil(8 * len / 5)`.
pub fn to_base32(bytes: &[u8]) -> String {
    ::base32::encode(ALPHABET, bytes)
}

/// Decode unpadded base32. `None` if any character is outside the alphabet.
pub fn to_buffer(text: &str) -> Option<Vec<u8>> {
    ::base32::decode(ALPHABET, text)
}

/// `true` if `text` is non-empty and made only of alphabet characters.
pub fn is_base32(text: &str) -> bool {
    !text.is_empty() && to_buffer(text).is_some()
}
