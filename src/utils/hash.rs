use xxhash_rust::xxh3::Xxh3;

/// Stable 128-bit digest over a sequence of key parts.
///
/// Parts are length-prefixed so `["ab", "c"]` and `["a", "bc"]` never collide.
pub fn cache_digest(parts: &[&str]) -> String {
    let mut hasher = Xxh3::new();
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    format!("{:032x}", hasher.digest128())
}
