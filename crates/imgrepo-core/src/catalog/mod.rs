//! Immutable catalog of known images.
//!
//! Built once at process start (built-in list or a TOML file) and shared by
//! reference with the acquisition pipeline. There are no mutation operations.

mod builtin;
mod entry;

pub use entry::{ArtifactKind, CatalogEntry};

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Reasons a catalog cannot be constructed.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate image id '{0}'")]
    DuplicateId(String),
    #[error("invalid image id '{0}' (allowed: letters, digits, '.', '_', '-'; no leading '.')")]
    InvalidId(String),
    #[error("image '{0}' has an empty url")]
    MissingUrl(String),
    #[error("catalog parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("catalog read error: {0}")]
    Io(#[from] std::io::Error),
}

/// On-disk catalog format: a list of `[[image]]` tables.
#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "image")]
    images: Vec<CatalogEntry>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate or unsafe ids and empty URLs.
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if !entry::is_valid_id(&entry.id) {
                return Err(CatalogError::InvalidId(entry.id.clone()));
            }
            if entry.url.trim().is_empty() {
                return Err(CatalogError::MissingUrl(entry.id.clone()));
            }
            if index.insert(entry.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateId(entry.id.clone()));
            }
        }
        Ok(Self { entries, index })
    }

    /// The images shipped with the binary.
    pub fn builtin() -> Self {
        let entries = builtin::entries();
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
        Self { entries, index }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(s)?;
        Self::new(file.images)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_toml_str(&data)
    }

    pub fn lookup(&self, id: &str) -> Option<&CatalogEntry> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    /// All entries in insertion order.
    pub fn list(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Entries whose OS family matches `family`, ignoring ASCII case.
    pub fn list_by_family(&self, family: &str) -> Vec<&CatalogEntry> {
        self.entries
            .iter()
            .filter(|e| e.os_family.eq_ignore_ascii_case(family))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
