//! Parse `<hex-digest>  <filename>` checksum manifests and pick the line for a target.

use crate::checksum::is_hex_digest;

/// One usable manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Digest exactly as published (case preserved).
    pub digest: String,
    /// Last field of the line, with a leading `*` (binary mode marker) removed.
    pub filename: String,
}

/// How a manifest line was matched to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Filename field is the target (optionally behind a directory prefix).
    Exact,
    /// Filename field contains the target.
    Contains,
    /// Only the entry's generic alias matched. Heuristic, weakest tier.
    Alias,
}

/// Parse every line whose first field is a hex digest and that names a file.
/// Comments, blank lines and signature armor are skipped.
pub fn parse_manifest(text: &str) -> Vec<ManifestEntry> {
    text.lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let digest = fields.next()?;
            let filename = fields.last()?;
            if !is_hex_digest(digest) {
                return None;
            }
            let filename = filename.strip_prefix('*').unwrap_or(filename);
            if filename.is_empty() {
                return None;
            }
            Some(ManifestEntry {
                digest: digest.to_string(),
                filename: filename.to_string(),
            })
        })
        .collect()
}

/// Find the entry for `target`. A lower tier is consulted only when no line in
/// the whole manifest matches a higher one; within a tier the first line wins.
pub fn find_entry<'a>(
    entries: &'a [ManifestEntry],
    target: &str,
    alias: Option<&str>,
) -> Option<(&'a ManifestEntry, MatchKind)> {
    let exact = entries.iter().find(|e| {
        e.filename == target
            || e
                .filename
                .strip_suffix(target)
                .map_or(false, |prefix| prefix.ends_with('/'))
    });
    if let Some(e) = exact {
        return Some((e, MatchKind::Exact));
    }
    if !target.is_empty() {
        if let Some(e) = entries.iter().find(|e| e.filename.contains(target)) {
            return Some((e, MatchKind::Contains));
        }
    }
    let alias = alias.filter(|a| !a.is_empty())?;
    entries
        .iter()
        .find(|e| e.filename.contains(alias))
        .map(|e| (e, MatchKind::Alias))
}
