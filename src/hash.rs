pub const HASH_HEX_LEN: usize = 16;

/// Short blake3 fingerprint reported alongside each analyzed file.
pub fn content_hash(bytes: &[u8]) -> String {
    let full_hex = blake3::hash(bytes).to_hex().to_string();
    shorten_hex(&full_hex)
}

fn shorten_hex(full_hex: &str) -> String {
    let prefix_len = HASH_HEX_LEN.min(full_hex.len());
    full_hex[..prefix_len].to_string()
}
