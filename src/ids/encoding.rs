//! Display encoding of generated identifiers.
//!
//! Generated names are `:` followed by the id in base 62, least significant
//! digit first. `:` is not in the alphabet, so generated names sort together
//! and can never be produced by [`clean_name`].

/// Digits of the display encoding.
pub const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Sentinel that starts every generated name.
pub const GENERATED_PREFIX: char = ':';

/// Encode an identifier as a generated name.
///
/// Zero is special-cased to `"0"` with no sentinel, matching names minted by
/// earlier deployments. The allocators start at 1 so they never produce it.
pub fn encode_id(id: u64) -> String {
    if id == 0 {
        return "0".to_string();
    }

    let base = ALPHABET.len() as u64;
    let mut out = String::with_capacity(12);
    out.push(GENERATED_PREFIX);

    let mut id = id;
    while id > 0 {
        out.push(ALPHABET[(id % base) as usize] as char);
        id /= base;
    }

    out
}

/// Decode a generated name back into its identifier.
pub fn decode_id(name: &str) -> Option<u64> {
    if name == "0" {
        return Some(0);
    }

    let digits = name.strip_prefix(GENERATED_PREFIX)?;
    if digits.is_empty() {
        return None;
    }

    let base = ALPHABET.len() as u64;
    let mut id: u64 = 0;
    for c in digits.bytes().rev() {
        let d = ALPHABET.iter().position(|&a| a == c)? as u64;
        id = id.checked_mul(base)?.checked_add(d)?;
    }

    Some(id)
}

/// True if `name` was produced by [`encode_id`].
pub fn is_generated(name: &str) -> bool {
    name.starts_with(GENERATED_PREFIX)
}

/// Strip every leading sentinel so a user-chosen name cannot shadow a
/// generated one.
pub fn clean_name(name: &str) -> &str {
    name.trim_start_matches(GENERATED_PREFIX)
}
