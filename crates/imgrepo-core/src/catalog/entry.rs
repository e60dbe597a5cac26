//! Catalog entry and artifact kind.

use serde::{Deserialize, Serialize};

/// On-disk format of an image, as published upstream. Descriptive only;
/// no structural validation is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    #[default]
    Qcow2,
    Raw,
    Img,
    Iso,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ArtifactKind::Qcow2 => "qcow2",
            ArtifactKind::Raw => "raw",
            ArtifactKind::Img => "img",
            ArtifactKind::Iso => "iso",
        };
        f.write_str(s)
    }
}

/// One downloadable image: where to fetch it and where its checksum manifest lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Unique key; also the file stem in the local store.
    pub id: String,
    /// Human-readable name for listings.
    pub name: String,
    /// Source URL of the image.
    pub url: String,
    /// URL of a `<sha256>  <filename>` manifest. No manifest means the image
    /// is accepted unverified.
    #[serde(default)]
    pub checksum_url: Option<String>,
    /// Substring matched against manifest filenames when the exact name is
    /// not listed. Heuristic: some upstreams label entries generically.
    #[serde(default)]
    pub manifest_alias: Option<String>,
    /// Advisory size from the publisher; `Content-Length` wins at transfer time.
    #[serde(default)]
    pub size_bytes: Option<u64>,
    pub os_family: String,
    pub version: String,
    pub arch: String,
    #[serde(default)]
    pub kind: ArtifactKind,
}

impl CatalogEntry {
    /// Whether downloads of this image can be checked against a published digest.
    pub fn has_manifest(&self) -> bool {
        self.checksum_url.is_some()
    }
}

/// Identifiers become file stems, so they are restricted to a portable set.
pub(crate) fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}
