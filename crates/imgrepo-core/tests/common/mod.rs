#![allow(dead_code)]

pub mod http_server;

use imgrepo_core::{ArtifactKind, CatalogEntry};
use sha2::{Digest, Sha256};

/// Deterministic pseudo-image bytes.
pub fn image_bytes(len: usize) -> Vec<u8> {
    (0u32..)
        .map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8)
        .take(len)
        .collect()
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

pub fn entry(id: &str, url: String, checksum_url: Option<String>) -> CatalogEntry {
    CatalogEntry {
        id: id.to_string(),
        name: format!("{id} test image"),
        url,
        checksum_url,
        manifest_alias: None,
        size_bytes: None,
        os_family: "alpine".to_string(),
        version: "3.22".to_string(),
        arch: "x86_64".to_string(),
        kind: ArtifactKind::Qcow2,
    }
}
