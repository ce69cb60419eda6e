//! Content fingerprints
//!
//! A 32-bit polynomial rolling hash (`h = h * 31 + unit`, wrapping) over the
//! UTF-16 code units of the text, rendered as a signed decimal string. Stored
//! fingerprints depend on this exact encoding, so it must not change.

/// Fingerprint of `text`; the empty string hashes to `"0"`
pub fn fingerprint(text: &str) -> String {
    let hash = text
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)));
    hash.to_string()
}
