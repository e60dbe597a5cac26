//! SHA-256 helpers shared by the fetcher and the stored-image re-check.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// Lowercase hex of a finished hasher.
pub fn finalize_hex(hasher: Sha256) -> String {
    hex::encode(hasher.finalize())
}

/// Compute SHA-256 of a file already on disk and return the digest as lowercase hex.
/// Reads in chunks so multi-GiB images never sit in memory.
pub fn sha256_path(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(finalize_hex(hasher))
}

/// True when `s` is non-empty and made only of hex digits (either case).
pub fn is_hex_digest(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
}
