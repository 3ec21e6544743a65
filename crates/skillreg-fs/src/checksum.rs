//! `sha256:<hex>` digests
//!
//! Content references and layout drift detection share this one format.

use sha2::{Digest, Sha256};

pub const PREFIX: &str = "sha256:";

const HEX_LEN: usize = 64;

/// Digest of `content` in `sha256:<hex>` form.
pub fn compute_bytes_checksum(content: &[u8]) -> String {
    format!("{PREFIX}{}", hex_digest(content))
}

/// Bare lowercase hex digest.
pub fn hex_digest(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}

/// The hex half of a well-formed checksum.
///
/// Anything that is not exactly the prefix followed by 64 lowercase hex
/// digits yields `None`, so the result is safe to splice into a path.
pub fn parse_checksum(checksum: &str) -> Option<&str> {
    checksum
        .strip_prefix(PREFIX)
        .filter(|hex| hex.len() == HEX_LEN && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')))
}
