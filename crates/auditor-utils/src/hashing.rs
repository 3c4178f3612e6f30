use sha2::{Digest, Sha256};

/// Compute the hex-encoded SHA-256 digest of `bytes`.
///
/// Deterministic: `sha256_hex(b) == sha256_hex(b)` for any `b`, satisfying the
/// document-hash determinism property required of `Document` identity.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    hex_encode(&digest)
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}
