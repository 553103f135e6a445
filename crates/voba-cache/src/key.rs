/// Hex length of a BLAKE3 digest.
pub const HASH_LEN: usize = 64;

/// Trim, collapse internal whitespace, lowercase.
pub fn normalize_key(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

pub fn is_hashed(key: &str) -> bool {
    key.len() == HASH_LEN && key.bytes().all(|b| b.is_ascii_hexdigit())
}

/// On-disk identifier for `raw` within `namespace`. Already-hashed keys pass
/// through, so hashing is idempotent.
pub fn hash_key(namespace: &str, raw: &str) -> String {
    let normalized = normalize_key(raw);
    if is_hashed(&normalized) { return normalized; }
    let mut hasher = blake3::Hasher::new();
    hasher.update(namespace.as_bytes());
    hasher.update(b"\0");
    hasher.update(normalized.as_bytes());
    hasher.finalize().to_hex().to_string()
}
